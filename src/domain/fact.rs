//! Typed facts shared by individuals and families.
//!
//! A record may hold several candidate facts for the same logical event, for
//! instance two conflicting birth records found during research. Each
//! candidate carries [`Evidence`] so the most trustworthy one can be chosen
//! as the "best" fact for its tag.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use crate::{domain::date::DateValue, storage::LineId};

macro_rules! event_kinds {
    ($($variant:ident => $tag:literal, $doc:literal;)+) => {
        /// A standard event tag.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum EventKind {
            $(
                #[doc = $doc]
                $variant,
            )+
        }

        impl EventKind {
            /// Every standard event kind.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// The lowercase tag used in files.
            #[must_use]
            pub const fn tag(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)+
                }
            }

            /// Looks up a kind from a lowercase tag.
            #[must_use]
            pub fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $($tag => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

event_kinds! {
    Annulment => "anul", "Annulment of a marriage.";
    Census => "cens", "Census.";
    Divorce => "div", "Divorce.";
    DivorceFiled => "divf", "Divorce filed.";
    Engagement => "enga", "Engagement.";
    MarriageBann => "marb", "Marriage bann.";
    MarriageContract => "marc", "Marriage contract.";
    MarriageLicense => "marl", "Marriage license.";
    Marriage => "marr", "Marriage.";
    MarriageSettlement => "mars", "Marriage settlement.";
    Adoption => "adop", "Adoption.";
    Baptism => "bapm", "Baptism.";
    BarMitzvah => "barm", "Bar mitzvah.";
    BasMitzvah => "basm", "Bas mitzvah.";
    Birth => "birt", "Birth.";
    Blessing => "bles", "Blessing.";
    Burial => "buri", "Burial.";
    Christening => "chr", "Christening.";
    AdultChristening => "chra", "Adult christening.";
    Confirmation => "conf", "Confirmation.";
    Cremation => "crem", "Cremation.";
    Death => "deat", "Death.";
    Emigration => "emig", "Emigration.";
    FirstCommunion => "fcom", "First communion.";
    Graduation => "grad", "Graduation.";
    Immigration => "immi", "Immigration.";
    Naturalization => "natu", "Naturalization.";
    Ordination => "ordn", "Ordination.";
    Probate => "prob", "Probate.";
    Retirement => "reti", "Retirement.";
    Will => "will", "Will.";
}

impl EventKind {
    /// Events recorded on individuals.
    pub const INDIVIDUAL: &'static [Self] = &[
        Self::Adoption,
        Self::Baptism,
        Self::BarMitzvah,
        Self::BasMitzvah,
        Self::Birth,
        Self::Blessing,
        Self::Burial,
        Self::Census,
        Self::Christening,
        Self::AdultChristening,
        Self::Confirmation,
        Self::Cremation,
        Self::Death,
        Self::Emigration,
        Self::FirstCommunion,
        Self::Graduation,
        Self::Immigration,
        Self::Naturalization,
        Self::Ordination,
        Self::Probate,
        Self::Retirement,
        Self::Will,
    ];

    /// Events recorded on families.
    pub const FAMILY: &'static [Self] = &[
        Self::Annulment,
        Self::Census,
        Self::Divorce,
        Self::DivorceFiled,
        Self::Engagement,
        Self::MarriageBann,
        Self::MarriageContract,
        Self::MarriageLicense,
        Self::Marriage,
        Self::MarriageSettlement,
    ];

    /// Events that show an individual has died, in order of preference.
    pub const DEATH: [Self; 3] = [Self::Death, Self::Burial, Self::Cremation];

    /// Events that date an individual's birth, in order of preference.
    pub const BIRTH: [Self; 3] = [Self::Birth, Self::Baptism, Self::Christening];

    /// Whether this event applies to individuals.
    #[must_use]
    pub fn is_individual(self) -> bool {
        Self::INDIVIDUAL.contains(&self)
    }

    /// Whether this event applies to families.
    #[must_use]
    pub fn is_family(self) -> bool {
        Self::FAMILY.contains(&self)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Single-valued attributes of an individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKind {
    /// `SEX`
    Sex,
    /// `EXID`, an external identifier. May occur at most once.
    Exid,
    /// `REFN`, a user reference number.
    Refn,
}

impl AttributeKind {
    /// Every attribute kind.
    pub const ALL: [Self; 3] = [Self::Sex, Self::Exid, Self::Refn];

    /// The lowercase tag used in files.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Sex => "sex",
            Self::Exid => "exid",
            Self::Refn => "refn",
        }
    }

    /// Looks up a kind from a lowercase tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// The two tags that introduce a custom event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CustomTag {
    /// `EVEN`
    Even,
    /// `FACT`
    Fact,
}

impl CustomTag {
    /// The lowercase tag used in files.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Even => "even",
            Self::Fact => "fact",
        }
    }

    /// Looks up a custom tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "even" => Some(Self::Even),
            "fact" => Some(Self::Fact),
            _ => None,
        }
    }
}

/// Research confidence recorded with the `_PROOF` tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Proof {
    /// The fact has been shown to be wrong.
    Disproven,
    /// No particular confidence, the default.
    #[default]
    Other,
    /// The fact has been confirmed.
    Proven,
}

impl Proof {
    /// Reads a `_PROOF` value. Unrecognized values count as [`Proof::Other`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "disproven" => Self::Disproven,
            "proven" => Self::Proven,
            _ => Self::Other,
        }
    }

    const fn score(self) -> u32 {
        match self {
            Self::Disproven => 0,
            Self::Other => 1,
            Self::Proven => 2,
        }
    }
}

/// Confidence markers attached to a candidate fact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evidence {
    /// Value of the `_PROOF` sub-record.
    pub proof: Proof,
    /// Whether a `_PRIM` sub-record marks this as the primary candidate.
    pub primary: bool,
}

impl Evidence {
    /// Ranking score: `disproven=0, other=1, proven=2`, times ten when primary.
    #[must_use]
    pub const fn score(self) -> u32 {
        let score = self.proof.score();
        if self.primary { score * 10 } else { score }
    }

    /// Records a `_PROOF` or `_PRIM` sub-record. Returns `false` for any other
    /// tag.
    pub(crate) fn absorb(&mut self, tag: &str, value: Option<&str>) -> bool {
        match tag {
            "_proof" => self.proof = Proof::parse(value.unwrap_or_default()),
            "_prim" => {
                self.primary = !matches!(
                    value.map(|v| v.trim().to_lowercase()).as_deref(),
                    Some("n" | "no")
                );
            }
            _ => return false,
        }
        true
    }
}

/// Picks the index of the best candidate.
///
/// Candidates scoring zero are never chosen, so `None` is returned when every
/// candidate is disproven. Ties keep the earliest candidate.
#[must_use]
pub fn select_best<I>(candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = Evidence>,
{
    candidates
        .into_iter()
        .enumerate()
        .filter(|(_, evidence)| evidence.score() > 0)
        .fold(None, |best: Option<(usize, u32)>, (index, evidence)| {
            let score = evidence.score();
            match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((index, score)),
            }
        })
        .map(|(index, _)| index)
}

/// A standard event such as a birth or marriage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFact {
    /// The event date, [`DateValue::Unknown`] when no date was given.
    pub date: DateValue,
    /// `PLAC`
    pub place: Option<String>,
    /// `NOTE`, with continuation lines joined and any inline text appended.
    pub note: Option<String>,
    /// Confidence markers.
    pub evidence: Evidence,
    /// The event was marked as known to have happened (`1 DEAT Y`) without
    /// further detail.
    pub flagged: bool,
    /// Source line of the event.
    pub line: LineId,
}

/// A custom `EVEN` or `FACT` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFact {
    /// Which tag introduced the event.
    pub tag: CustomTag,
    /// The inline value.
    pub value: Option<String>,
    /// The lowercased `TYPE` classifier.
    pub kind: Option<String>,
    /// `DATE`, when given.
    pub date: Option<DateValue>,
    /// `PLAC`
    pub place: Option<String>,
    /// `NOTE`
    pub note: Option<String>,
    /// Confidence markers.
    pub evidence: Evidence,
    /// Every other sub-record, verbatim.
    pub extra: Vec<(String, Option<String>)>,
    /// Source line of the event.
    pub line: LineId,
}

/// A single-valued attribute such as `SEX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFact {
    /// The value, empty if none was given.
    pub value: String,
    /// Confidence markers.
    pub evidence: Evidence,
    /// Source line of the attribute.
    pub line: LineId,
}

/// Identifies a group of candidate facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FactKey {
    /// Personal names.
    Name,
    /// An attribute.
    Attribute(AttributeKind),
    /// A standard event.
    Event(EventKind),
}

impl FactKey {
    /// The lowercase tag used in files.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Attribute(kind) => kind.tag(),
            Self::Event(kind) => kind.tag(),
        }
    }
}

/// Locates a parsed fact from its source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactRef {
    /// The `index`th candidate for `key`.
    Keyed {
        /// The fact group.
        key: FactKey,
        /// Position within the group.
        index: usize,
    },
    /// A custom event, by position.
    Custom(usize),
}

/// Event facts and their bookkeeping, shared by individuals and families.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facts {
    pub(crate) events: BTreeMap<EventKind, Vec<EventFact>>,
    pub(crate) custom: Vec<CustomFact>,
    pub(crate) best: BTreeMap<FactKey, usize>,
    pub(crate) sources: HashMap<LineId, FactRef>,
}

impl Facts {
    /// Every candidate for the given event, in file order.
    #[must_use]
    pub fn events(&self, kind: EventKind) -> &[EventFact] {
        self.events.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// The kinds of event present.
    pub fn event_kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.events.keys().copied()
    }

    /// The best candidate for the given event, if any was selected.
    #[must_use]
    pub fn best_event(&self, kind: EventKind) -> Option<&EventFact> {
        self.best_index(FactKey::Event(kind))
            .and_then(|index| self.events(kind).get(index))
    }

    /// Custom events, in file order.
    #[must_use]
    pub fn custom(&self) -> &[CustomFact] {
        &self.custom
    }

    /// The index of the best candidate for the given key.
    #[must_use]
    pub fn best_index(&self, key: FactKey) -> Option<usize> {
        self.best.get(&key).copied()
    }

    /// The parsed fact that a source line produced.
    #[must_use]
    pub fn fact_at(&self, line: LineId) -> Option<FactRef> {
        self.sources.get(&line).copied()
    }

    /// The event fact for a source line, if the line was a standard event.
    #[must_use]
    pub fn event_at(&self, line: LineId) -> Option<&EventFact> {
        match self.fact_at(line)? {
            FactRef::Keyed {
                key: FactKey::Event(kind),
                index,
            } => self.events(kind).get(index),
            _ => None,
        }
    }

    /// The custom fact for a source line, if the line was a custom event.
    #[must_use]
    pub fn custom_at(&self, line: LineId) -> Option<&CustomFact> {
        match self.fact_at(line)? {
            FactRef::Custom(index) => self.custom.get(index),
            FactRef::Keyed { .. } => None,
        }
    }

    /// Standard events that occur more than once, with their counts.
    #[must_use]
    pub fn repeated_events(&self) -> Vec<(EventKind, usize)> {
        self.events
            .iter()
            .filter(|(_, facts)| facts.len() > 1)
            .map(|(kind, facts)| (*kind, facts.len()))
            .collect()
    }

    pub(crate) fn push_event(&mut self, kind: EventKind, fact: EventFact) {
        let candidates = self.events.entry(kind).or_default();
        self.sources.insert(
            fact.line,
            FactRef::Keyed {
                key: FactKey::Event(kind),
                index: candidates.len(),
            },
        );
        candidates.push(fact);
    }

    pub(crate) fn push_custom(&mut self, fact: CustomFact) {
        self.sources
            .insert(fact.line, FactRef::Custom(self.custom.len()));
        self.custom.push(fact);
    }

    pub(crate) fn record_source(&mut self, line: LineId, key: FactKey, index: usize) {
        self.sources.insert(line, FactRef::Keyed { key, index });
    }

    pub(crate) fn select_best_events(&mut self) {
        for (kind, candidates) in &self.events {
            let key = FactKey::Event(*kind);
            match select_best(candidates.iter().map(|fact| fact.evidence)) {
                Some(index) => self.best.insert(key, index),
                None => self.best.remove(&key),
            };
        }
    }

    pub(crate) fn set_best(&mut self, key: FactKey, best: Option<usize>) {
        match best {
            Some(index) => self.best.insert(key, index),
            None => self.best.remove(&key),
        };
    }
}
