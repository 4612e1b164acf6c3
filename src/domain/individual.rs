use std::collections::BTreeMap;

use nonempty::NonEmpty;
use serde::Serialize;

use crate::{
    domain::{
        fact::{AttributeFact, AttributeKind, EventKind, FactKey, Facts},
        name::NameFact,
        privacy::PrivacyLevel,
        Xref,
    },
    storage::LineId,
};

/// How a child came to belong to a family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relationship {
    /// Born to the family.
    #[default]
    Birth,
    /// Adopted into the family.
    Adopted,
    /// Christened in the family. Treated as a birth relationship.
    Christened,
    /// Fostered by the family.
    Foster,
    /// Sealed to the family.
    Sealed,
    /// Any other pedigree value.
    Other,
}

impl Relationship {
    /// Reads a `PEDI` pedigree value.
    #[must_use]
    pub fn from_pedigree(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "birth" => Self::Birth,
            "adopted" => Self::Adopted,
            "foster" => Self::Foster,
            "sealing" | "sealed" => Self::Sealed,
            _ => Self::Other,
        }
    }

    /// Whether this relationship counts as being born to the family.
    #[must_use]
    pub const fn is_birth(self) -> bool {
        matches!(self, Self::Birth | Self::Christened)
    }

    /// A lowercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Birth => "birth",
            Self::Adopted => "adopted",
            Self::Christened => "christened",
            Self::Foster => "foster",
            Self::Sealed => "sealed",
            Self::Other => "other",
        }
    }
}

/// Which parent of a family a relationship applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ParentRole {
    /// The husband only.
    Husband,
    /// The wife only.
    Wife,
    /// Both parents.
    #[default]
    Both,
}

impl ParentRole {
    /// Reads an `ADOP` value (`HUSB`, `WIFE` or `BOTH`).
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "husb" => Self::Husband,
            "wife" => Self::Wife,
            _ => Self::Both,
        }
    }

    /// Whether the role covers the husband.
    #[must_use]
    pub const fn includes_husband(self) -> bool {
        matches!(self, Self::Husband | Self::Both)
    }

    /// Whether the role covers the wife.
    #[must_use]
    pub const fn includes_wife(self) -> bool {
        matches!(self, Self::Wife | Self::Both)
    }
}

/// Birth-into-family metadata recorded on a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildLink {
    /// The family the child belongs to.
    pub family: Xref,
    /// How the child belongs to it.
    pub relationship: Relationship,
    /// Which parents the relationship applies to.
    pub role: ParentRole,
}

/// Display details for an individual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Best name, human readable.
    pub name: String,
    /// Best name escaped for HTML.
    pub html: String,
    /// Best name with `\uXXXX` escapes.
    pub unicode: String,
    /// Birth date as `[MOD] D MON YYYY`, empty when unknown.
    pub birth: String,
    /// Birth date as `[MOD] YYYY`.
    pub birth_year: String,
    /// Death date as `[MOD] D MON YYYY`, empty when unknown.
    pub death: String,
    /// Death date as `[MOD] YYYY`.
    pub death_year: String,
}

/// A person, normalized from an `INDI` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Individual {
    pub(crate) xref: Xref,
    pub(crate) record: LineId,
    pub(crate) names: NonEmpty<NameFact>,
    pub(crate) attributes: BTreeMap<AttributeKind, Vec<AttributeFact>>,
    pub(crate) facts: Facts,
    pub(crate) fams: Vec<Xref>,
    pub(crate) all_famc: Vec<Xref>,
    pub(crate) birth_famc: Vec<Xref>,
    pub(crate) famc: Vec<Xref>,
    pub(crate) child_links: Vec<ChildLink>,
    pub(crate) privacy: PrivacyLevel,
}

impl Individual {
    pub(crate) fn new(xref: Xref, record: LineId) -> Self {
        Self {
            xref,
            record,
            names: NonEmpty::new(NameFact::unknown()),
            attributes: BTreeMap::new(),
            facts: Facts::default(),
            fams: Vec::new(),
            all_famc: Vec::new(),
            birth_famc: Vec::new(),
            famc: Vec::new(),
            child_links: Vec::new(),
            privacy: PrivacyLevel::default(),
        }
    }

    /// The identifier, e.g. `i123`.
    #[must_use]
    pub const fn xref(&self) -> &Xref {
        &self.xref
    }

    /// The `INDI` line this individual was read from.
    #[must_use]
    pub const fn record(&self) -> LineId {
        self.record
    }

    /// Every name, in file order. Never empty.
    #[must_use]
    pub const fn names(&self) -> &NonEmpty<NameFact> {
        &self.names
    }

    /// The best name, or the first if every name is disproven.
    #[must_use]
    pub fn name(&self) -> &NameFact {
        self.facts
            .best_index(FactKey::Name)
            .and_then(|index| self.names.get(index))
            .unwrap_or(self.names.first())
    }

    /// Every candidate for an attribute, in file order.
    #[must_use]
    pub fn attributes(&self, kind: AttributeKind) -> &[AttributeFact] {
        self.attributes.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// The best candidate for an attribute.
    #[must_use]
    pub fn attribute(&self, kind: AttributeKind) -> Option<&AttributeFact> {
        self.facts
            .best_index(FactKey::Attribute(kind))
            .and_then(|index| self.attributes(kind).get(index))
    }

    /// Event facts and best-candidate bookkeeping.
    #[must_use]
    pub const fn facts(&self) -> &Facts {
        &self.facts
    }

    /// Families in which this individual is a spouse.
    #[must_use]
    pub fn fams(&self) -> &[Xref] {
        &self.fams
    }

    /// Families in which this individual is a child.
    ///
    /// Equal to [`Individual::birth_famc`] when the `only-birth` option is
    /// set, otherwise to [`Individual::all_famc`].
    #[must_use]
    pub fn famc(&self) -> &[Xref] {
        &self.famc
    }

    /// Every family in which this individual is a child.
    #[must_use]
    pub fn all_famc(&self) -> &[Xref] {
        &self.all_famc
    }

    /// Families into which this individual was born.
    #[must_use]
    pub fn birth_famc(&self) -> &[Xref] {
        &self.birth_famc
    }

    /// Recorded birth-into-family metadata.
    #[must_use]
    pub fn child_links(&self) -> &[ChildLink] {
        &self.child_links
    }

    /// The relationship to the given family for one parent role, `Birth` if
    /// nothing more specific was recorded.
    #[must_use]
    pub fn relationship_to(&self, family: &Xref, husband: bool) -> Relationship {
        let recorded: Vec<Relationship> = self
            .child_links
            .iter()
            .filter(|link| &link.family == family)
            .filter(|link| {
                if husband {
                    link.role.includes_husband()
                } else {
                    link.role.includes_wife()
                }
            })
            .map(|link| link.relationship)
            .collect();
        // a non-birth relationship overrides any birth record for the same parent
        recorded
            .iter()
            .copied()
            .find(|relationship| !relationship.is_birth())
            .or_else(|| recorded.first().copied())
            .unwrap_or_default()
    }

    /// The redaction level.
    #[must_use]
    pub const fn privacy(&self) -> PrivacyLevel {
        self.privacy
    }

    /// Tags that have more than one entry, with their counts. Custom events
    /// are not included.
    #[must_use]
    pub fn repeated_facts(&self) -> Vec<(&'static str, usize)> {
        let mut repeated = Vec::new();
        if self.names.len() > 1 {
            repeated.push((FactKey::Name.tag(), self.names.len()));
        }
        repeated.extend(
            self.attributes
                .iter()
                .filter(|(_, facts)| facts.len() > 1)
                .map(|(kind, facts)| (kind.tag(), facts.len())),
        );
        repeated.extend(
            self.facts
                .repeated_events()
                .into_iter()
                .map(|(kind, count)| (kind.tag(), count)),
        );
        repeated
    }

    /// Name and vital dates for display.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let name = self.name();
        let (birth, birth_year) = self.dates(EventKind::Birth);
        let (death, death_year) = self.dates(EventKind::Death);
        Summary {
            name: name.display.clone(),
            html: name.html.clone(),
            unicode: name.unicode.clone(),
            birth,
            birth_year,
            death,
            death_year,
        }
    }

    fn dates(&self, kind: EventKind) -> (String, String) {
        let Some(event) = self
            .facts
            .best_event(kind)
            .or_else(|| self.facts.events(kind).first())
        else {
            return (String::new(), String::new());
        };
        let year = event
            .date
            .known()
            .map(|date| date.min.year_display())
            .unwrap_or_default();
        (event.date.display(), year)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{Document, Options};

    #[test_case("birth", Relationship::Birth; "birth")]
    #[test_case(" Adopted ", Relationship::Adopted; "adopted")]
    #[test_case("SEALING", Relationship::Sealed; "sealing")]
    #[test_case("step", Relationship::Other; "other")]
    fn pedigree_values(value: &str, expected: Relationship) {
        assert_eq!(Relationship::from_pedigree(value), expected);
    }

    #[test]
    fn summary_uses_best_candidates() {
        let text = "0 HEAD\n1 GEDC\n2 VERS 5.5.1\n\
            0 @I1@ INDI\n1 NAME Zoë /Doe/\n\
            1 BIRT\n2 DATE 1 JAN 1890\n2 _PROOF disproven\n1 BIRT\n2 DATE ABT 1896\n\
            1 DEAT\n2 DATE BET 1 JAN 1950 AND 1 JAN 1960\n\
            0 TRLR\n";
        let doc = Document::parse(text, Options::default()).unwrap();
        let summary = doc.individual(&"i1".parse().unwrap()).unwrap().summary();

        assert_eq!(summary.name, "Zoë Doe");
        assert_eq!(summary.birth, "ABT 1 JAN 1896");
        assert_eq!(summary.birth_year, "ABT 1896");
        assert_eq!(summary.death, "BET 1 JAN 1950 AND 1 JAN 1960");
        assert_eq!(summary.death_year, "BET 1950");
    }

    #[test]
    fn summary_without_dates_is_blank() {
        let text = "0 HEAD\n1 GEDC\n2 VERS 5.5.1\n0 @I1@ INDI\n1 NAME Ann /Roe/\n1 DEAT Y\n0 TRLR\n";
        let doc = Document::parse(text, Options::default()).unwrap();
        let summary = doc.individual(&"i1".parse().unwrap()).unwrap().summary();

        assert_eq!(summary.name, "Ann Roe");
        assert!(summary.birth.is_empty());
        assert!(summary.death.is_empty());
        assert!(summary.death_year.is_empty());
    }
}
