use std::collections::BTreeMap;

use crate::{
    domain::{fact::Facts, individual::Relationship, privacy::PrivacyLevel, Xref},
    storage::LineId,
};

/// How a child relates to each parent of a family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildRelation {
    /// Relationship to the husband.
    pub husband: Relationship,
    /// Relationship to the wife.
    pub wife: Relationship,
}

impl ChildRelation {
    /// Whether the child was born to both parents.
    #[must_use]
    pub const fn is_birth(self) -> bool {
        self.husband.is_birth() && self.wife.is_birth()
    }
}

/// A partnership and its children, normalized from a `FAM` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    pub(crate) xref: Xref,
    pub(crate) record: LineId,
    pub(crate) husband: Option<Xref>,
    pub(crate) wife: Option<Xref>,
    pub(crate) all_children: Vec<Xref>,
    pub(crate) birth_children: Vec<Xref>,
    pub(crate) children: Vec<Xref>,
    pub(crate) facts: Facts,
    pub(crate) child_relations: BTreeMap<Xref, ChildRelation>,
    pub(crate) privacy: PrivacyLevel,
}

impl Family {
    pub(crate) fn new(xref: Xref, record: LineId) -> Self {
        Self {
            xref,
            record,
            husband: None,
            wife: None,
            all_children: Vec::new(),
            birth_children: Vec::new(),
            children: Vec::new(),
            facts: Facts::default(),
            child_relations: BTreeMap::new(),
            privacy: PrivacyLevel::default(),
        }
    }

    /// The identifier, e.g. `f12`.
    #[must_use]
    pub const fn xref(&self) -> &Xref {
        &self.xref
    }

    /// The `FAM` line this family was read from.
    #[must_use]
    pub const fn record(&self) -> LineId {
        self.record
    }

    /// `HUSB`
    #[must_use]
    pub const fn husband(&self) -> Option<&Xref> {
        self.husband.as_ref()
    }

    /// `WIFE`
    #[must_use]
    pub const fn wife(&self) -> Option<&Xref> {
        self.wife.as_ref()
    }

    /// Both partners, husband first.
    pub fn partners(&self) -> impl Iterator<Item = &Xref> {
        self.husband.iter().chain(self.wife.iter())
    }

    /// Children, restricted to birth children when the `only-birth` option is
    /// set.
    #[must_use]
    pub fn children(&self) -> &[Xref] {
        &self.children
    }

    /// Every `CHIL` reference.
    #[must_use]
    pub fn all_children(&self) -> &[Xref] {
        &self.all_children
    }

    /// Children born to both parents.
    #[must_use]
    pub fn birth_children(&self) -> &[Xref] {
        &self.birth_children
    }

    /// The relationship of a child to each parent. Children without recorded
    /// metadata are birth children.
    #[must_use]
    pub fn child_relation(&self, child: &Xref) -> ChildRelation {
        self.child_relations
            .get(child)
            .copied()
            .unwrap_or_default()
    }

    /// Event facts and best-candidate bookkeeping.
    #[must_use]
    pub const fn facts(&self) -> &Facts {
        &self.facts
    }

    /// The redaction level.
    #[must_use]
    pub const fn privacy(&self) -> PrivacyLevel {
        self.privacy
    }
}
