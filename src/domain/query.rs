//! A small predicate language for finding individuals.
//!
//! A [`Query`] names a field with a tag and an optional sub-tag, such as
//! `birt.date` or `name.surn`, a value to compare against and an
//! [`Operator`]. Tags are resolved into a closed set of [`Field`]s when the
//! query is built, so a misspelt tag or operator is rejected up front rather
//! than silently matching nothing.
//!
//! Compound searches are built by combining result lists with
//! [`intersection`], [`union`] and [`difference`].

use std::{collections::HashSet, fmt, str::FromStr};

use tracing::instrument;

use crate::domain::{
    fact::{AttributeKind, CustomTag, EventFact, EventKind, FactKey},
    xref::Error as XrefError,
    Document, Individual, Xref,
};

/// Tag spellings accepted in place of the file tag.
const TAG_ALIASES: [(&str, &str); 10] = [
    ("birth", "birt"),
    ("death", "deat"),
    ("burial", "buri"),
    ("baptism", "bapm"),
    ("christening", "chr"),
    ("adoption", "adop"),
    ("cremation", "crem"),
    ("event", "even"),
    ("gender", "sex"),
    ("id", "xref"),
];

const SUBTAG_ALIASES: [(&str, &str); 6] = [
    ("place", "plac"),
    ("given", "givn"),
    ("surname", "surn"),
    ("prefix", "npfx"),
    ("suffix", "nsfx"),
    ("nickname", "nick"),
];

const NAME_PARTS: [&str; 5] = ["npfx", "givn", "surn", "nsfx", "nick"];

/// Errors in building a query.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    /// The tag was blank.
    #[error("empty search tag")]
    EmptyTag,

    /// One side of a dotted tag was blank.
    #[error("empty part in search tag '{0}'")]
    EmptyPart(String),

    /// The tag names nothing that can be searched.
    #[error("unknown search tag '{0}'")]
    UnknownTag(String),

    /// The sub-tag does not apply to the tag.
    #[error("'{subtag}' is not a valid sub-tag of '{tag}'")]
    InvalidSubtag {
        /// The tag.
        tag: String,
        /// The rejected sub-tag.
        subtag: String,
    },

    /// The operator is not recognized.
    #[error("unknown operator '{0}', expected one of =, !=, <, <=, >, >=, in, !in, exist, !exist")]
    UnknownOperator(String),

    /// A relationship query was given something other than an identifier.
    #[error(transparent)]
    Xref(#[from] XrefError),
}

/// How a field is compared with the search value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=` or `==`
    Equal,
    /// `!=`, `!`, `not` or `not =`
    NotEqual,
    /// `<`
    Less,
    /// `<=` or `=<`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=` or `=>`
    GreaterOrEqual,
    /// The field contains the value.
    In,
    /// The field does not contain the value.
    NotIn,
    /// The field is present. The value is ignored.
    Exist,
    /// The field is absent. The value is ignored.
    NotExist,
}

impl Operator {
    fn compare<T: PartialOrd + ?Sized>(self, have: &T, want: &T) -> bool {
        match self {
            Self::Equal => have == want,
            Self::NotEqual => have != want,
            Self::Less => have < want,
            Self::LessOrEqual => have <= want,
            Self::Greater => have > want,
            Self::GreaterOrEqual => have >= want,
            Self::In | Self::NotIn | Self::Exist | Self::NotExist => false,
        }
    }

    fn matches(self, have: &str, want: &str) -> bool {
        match self {
            Self::In => have.contains(want),
            Self::NotIn => !have.contains(want),
            _ => self.compare(have, want),
        }
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        let operator = match op.as_str() {
            "=" | "==" => Self::Equal,
            "!=" | "!" | "not" | "not=" | "not =" => Self::NotEqual,
            "<" => Self::Less,
            "<=" | "=<" => Self::LessOrEqual,
            ">" => Self::Greater,
            ">=" | "=>" => Self::GreaterOrEqual,
            "in" => Self::In,
            "!in" | "not in" => Self::NotIn,
            "exist" | "exists" => Self::Exist,
            "!exist" | "!exists" | "not exist" | "not exists" => Self::NotExist,
            _ => return Err(QueryError::UnknownOperator(s.to_string())),
        };
        Ok(operator)
    }
}

/// One family-graph hop used by relationship queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `parentsof`
    Parents,
    /// `childrenof`
    Children,
    /// `partnersof`
    Partners,
    /// `siblingsof`
    Siblings,
    /// `step-siblingsof`
    StepSiblings,
}

impl Relation {
    fn from_pseudo_tag(tag: &str) -> Option<Self> {
        let compact: String = tag
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect();
        match compact.as_str() {
            "parentsof" => Some(Self::Parents),
            "childrenof" => Some(Self::Children),
            "partnersof" => Some(Self::Partners),
            "siblingsof" => Some(Self::Siblings),
            "stepsiblingsof" => Some(Self::StepSiblings),
            _ => None,
        }
    }
}

/// Which part of a name is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart {
    /// The name as written.
    Value,
    /// The display form.
    Display,
    /// A structured part, by its tag.
    Part(&'static str),
}

/// Which detail of a standard event is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDetail {
    /// The comparable value of the earliest date bound, `yyyymmdd`.
    Date,
    /// `PLAC`
    Place,
    /// `NOTE`
    Note,
}

impl EventDetail {
    const fn tag(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Place => "plac",
            Self::Note => "note",
        }
    }
}

/// What a query looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// The identifier, compared by number.
    Xref,
    /// A personal name.
    Name(NamePart),
    /// A single-valued attribute.
    Attribute(AttributeKind),
    /// A standard event. Without a detail the date is compared when the
    /// value is eight digits, otherwise the event only has to be present.
    Event(EventKind, Option<EventDetail>),
    /// Custom events. Without a type the lowercased `TYPE` classifier is
    /// compared, with one the inline value of events of that type.
    Custom(CustomTag, Option<String>),
    /// `FAMS` or `FAMC` family references.
    Families(&'static str),
    /// A relationship lookup.
    Relation(Relation),
}

impl Field {
    /// Resolves a tag, optionally dotted with a sub-tag.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the tag is blank, has a blank part, is not
    /// searchable, or has a sub-tag that does not apply to it.
    pub fn parse(tag: &str) -> Result<Self, QueryError> {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return Err(QueryError::EmptyTag);
        }
        if !tag.contains('.') {
            if let Some(relation) = Relation::from_pseudo_tag(&tag) {
                return Ok(Self::Relation(relation));
            }
        }

        let (main, subtag) = match tag.split_once('.') {
            Some((main, subtag)) => {
                let (main, subtag) = (main.trim(), subtag.trim());
                if main.is_empty() || subtag.is_empty() {
                    return Err(QueryError::EmptyPart(tag.clone()));
                }
                (main, Some(alias(&SUBTAG_ALIASES, subtag)))
            }
            None => (tag.as_str(), None),
        };
        let main = alias(&TAG_ALIASES, main);
        let invalid = |subtag: &str| QueryError::InvalidSubtag {
            tag: main.to_string(),
            subtag: subtag.to_string(),
        };

        let field = match (main, subtag) {
            ("xref", None) => Self::Xref,
            ("name", None) => Self::Name(NamePart::Value),
            ("name", Some("display")) => Self::Name(NamePart::Display),
            ("name", Some(part)) => {
                let part = NAME_PARTS
                    .into_iter()
                    .find(|known| *known == part)
                    .ok_or_else(|| invalid(part))?;
                Self::Name(NamePart::Part(part))
            }
            ("fams", None) => Self::Families("fams"),
            ("famc", None) => Self::Families("famc"),
            (main, subtag) => {
                if let Some(kind) = AttributeKind::from_tag(main) {
                    match subtag {
                        None => Self::Attribute(kind),
                        Some(subtag) => return Err(invalid(subtag)),
                    }
                } else if let Some(custom) = CustomTag::from_tag(main) {
                    Self::Custom(custom, subtag.map(str::to_string))
                } else if let Some(kind) =
                    EventKind::from_tag(main).filter(|kind| kind.is_individual())
                {
                    let detail = match subtag {
                        None => None,
                        Some("date") => Some(EventDetail::Date),
                        Some("plac") => Some(EventDetail::Place),
                        Some("note") => Some(EventDetail::Note),
                        Some(subtag) => return Err(invalid(subtag)),
                    };
                    Self::Event(kind, detail)
                } else {
                    return Err(QueryError::UnknownTag(tag.clone()));
                }
            }
        };
        Ok(field)
    }

    /// The file tag and sub-tag to look for when nothing matches.
    fn raw_tags(&self) -> Option<(&str, Option<&str>)> {
        match self {
            Self::Xref | Self::Relation(_) => None,
            Self::Name(NamePart::Part(part)) => Some(("name", Some(*part))),
            Self::Name(_) => Some(("name", None)),
            Self::Attribute(kind) => Some((kind.tag(), None)),
            Self::Event(kind, detail) => Some((kind.tag(), detail.map(EventDetail::tag))),
            Self::Custom(custom, _) => Some((custom.tag(), None)),
            Self::Families(tag) => Some((*tag, None)),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xref => f.write_str("xref"),
            Self::Name(NamePart::Value) => f.write_str("name"),
            Self::Name(NamePart::Display) => f.write_str("name.display"),
            Self::Name(NamePart::Part(part)) => write!(f, "name.{part}"),
            Self::Attribute(kind) => f.write_str(kind.tag()),
            Self::Event(kind, None) => f.write_str(kind.tag()),
            Self::Event(kind, Some(detail)) => write!(f, "{kind}.{}", detail.tag()),
            Self::Custom(custom, None) => f.write_str(custom.tag()),
            Self::Custom(custom, Some(kind)) => write!(f, "{}.{kind}", custom.tag()),
            Self::Families(tag) => f.write_str(tag),
            Self::Relation(Relation::Parents) => f.write_str("parentsof"),
            Self::Relation(Relation::Children) => f.write_str("childrenof"),
            Self::Relation(Relation::Partners) => f.write_str("partnersof"),
            Self::Relation(Relation::Siblings) => f.write_str("siblingsof"),
            Self::Relation(Relation::StepSiblings) => f.write_str("step-siblingsof"),
        }
    }
}

fn alias<'a>(table: &[(&str, &'static str)], tag: &'a str) -> &'a str {
    table
        .iter()
        .find_map(|(from, to)| (*from == tag).then_some(*to))
        .unwrap_or(tag)
}

/// A validated search over individuals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    field: Field,
    value: String,
    operator: Operator,
    only_best: bool,
}

impl Query {
    /// Builds a query.
    ///
    /// With `only_best` set, only the best candidate of each multi-valued
    /// field is compared. Otherwise every candidate is, and a match on any one
    /// of them qualifies. Custom events and family lists always compare every
    /// entry. Relationship queries take an identifier as the value and ignore
    /// both the operator and `only_best`.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for an unknown tag, an unknown operator on any
    /// other field, or a relationship query whose value is not an identifier.
    pub fn new(
        tag: &str,
        value: impl Into<String>,
        operator: &str,
        only_best: bool,
    ) -> Result<Self, QueryError> {
        let field = Field::parse(tag)?;
        let mut value = value.into();
        let operator = if matches!(field, Field::Relation(_)) {
            value = Xref::new(&value)?.as_str().to_string();
            operator.parse().unwrap_or(Operator::Equal)
        } else {
            operator.parse()?
        };
        Ok(Self {
            field,
            value,
            operator,
            only_best,
        })
    }

    /// The field searched.
    #[must_use]
    pub const fn field(&self) -> &Field {
        &self.field
    }

    /// The comparison.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// The search value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    fn events<'a>(&self, individual: &'a Individual, kind: EventKind) -> Vec<&'a EventFact> {
        if self.only_best {
            individual.facts().best_event(kind).into_iter().collect()
        } else {
            individual.facts().events(kind).iter().collect()
        }
    }

    fn dates_by_default(&self) -> bool {
        self.value.len() == 8 && self.value.bytes().all(|b| b.is_ascii_digit())
    }

    /// The values of every considered candidate that has the field.
    fn values<'a>(&self, individual: &'a Individual) -> Vec<&'a str> {
        match &self.field {
            Field::Xref => vec![individual.xref().as_str()],
            Field::Name(part) => {
                let names: Vec<_> = if self.only_best {
                    individual
                        .facts()
                        .best_index(FactKey::Name)
                        .and_then(|index| individual.names().get(index))
                        .into_iter()
                        .collect()
                } else {
                    individual.names().iter().collect()
                };
                names
                    .into_iter()
                    .filter_map(|name| match part {
                        NamePart::Value => Some(name.value.as_str()),
                        NamePart::Display => Some(name.display.as_str()),
                        NamePart::Part(tag) => name.parts.get(tag),
                    })
                    .collect()
            }
            Field::Attribute(kind) => {
                if self.only_best {
                    individual
                        .attribute(*kind)
                        .map(|fact| fact.value.as_str())
                        .into_iter()
                        .collect()
                } else {
                    individual
                        .attributes(*kind)
                        .iter()
                        .map(|fact| fact.value.as_str())
                        .collect()
                }
            }
            Field::Event(kind, detail) => {
                let detail = detail.unwrap_or(EventDetail::Date);
                self.events(individual, *kind)
                    .into_iter()
                    .filter_map(|event| match detail {
                        EventDetail::Date => event.date.min_value(),
                        EventDetail::Place => event.place.as_deref(),
                        EventDetail::Note => event.note.as_deref(),
                    })
                    .collect()
            }
            Field::Custom(tag, None) => individual
                .facts()
                .custom()
                .iter()
                .filter(|custom| custom.tag == *tag)
                .filter_map(|custom| custom.kind.as_deref())
                .collect(),
            Field::Custom(tag, Some(kind)) => individual
                .facts()
                .custom()
                .iter()
                .filter(|custom| custom.tag == *tag && custom.kind.as_ref() == Some(kind))
                .map(|custom| custom.value.as_deref().unwrap_or_default())
                .collect(),
            Field::Families(tag) => {
                let families = if *tag == "fams" {
                    individual.fams()
                } else {
                    individual.famc()
                };
                families.iter().map(Xref::as_str).collect()
            }
            Field::Relation(_) => Vec::new(),
        }
    }

    fn exists(&self, individual: &Individual) -> bool {
        match self.field {
            Field::Event(kind, None) => !self.events(individual, kind).is_empty(),
            _ => !self.values(individual).is_empty(),
        }
    }

    fn matches(&self, individual: &Individual) -> bool {
        match self.field {
            Field::Xref => {
                if matches!(self.operator, Operator::In | Operator::NotIn) {
                    return self.operator.matches(individual.xref().as_str(), &self.value);
                }
                let want = Xref::new(&self.value).ok().and_then(|xref| xref.number());
                match (individual.xref().number(), want) {
                    (Some(have), Some(want)) => self.operator.compare(&have, &want),
                    _ => false,
                }
            }
            Field::Event(_, None) if !self.dates_by_default() => self.exists(individual),
            _ => self
                .values(individual)
                .into_iter()
                .any(|have| self.operator.matches(have, &self.value)),
        }
    }

    /// Scans the raw records for the tag this query uses, and warns when no
    /// individual has it at all.
    fn check_for_typo(&self, document: &Document) {
        let Some((tag, subtag)) = self.field.raw_tags() else {
            return;
        };
        let kind = match &self.field {
            Field::Custom(_, kind) => kind.as_deref(),
            _ => None,
        };
        let lines = document.lines();
        let present = document.individuals().values().any(|individual| {
            lines
                .children_tagged(individual.record(), tag)
                .any(|(id, _)| match (subtag, kind) {
                    (Some(subtag), _) => lines.children_tagged(id, subtag).next().is_some(),
                    (None, Some(kind)) => lines.children_tagged(id, "type").any(|(_, line)| {
                        line.value()
                            .is_some_and(|value| value.trim().to_lowercase() == kind)
                    }),
                    (None, None) => true,
                })
        });
        if !present {
            tracing::warn!(
                "no individual has '{}', the search tag may be misspelt",
                self.field
            );
        }
    }
}

impl Document {
    /// Identifiers of the individuals matching a query.
    ///
    /// Field queries return identifiers in natural order. Relationship
    /// queries return them in the order they are found.
    #[must_use]
    #[instrument(skip(self), fields(field = %query.field))]
    pub fn find(&self, query: &Query) -> Vec<Xref> {
        if let Field::Relation(relation) = query.field {
            let Ok(xref) = Xref::new(&query.value) else {
                return Vec::new();
            };
            return match relation {
                Relation::Parents => self.parents_of(&xref),
                Relation::Children => self.children_of(&xref),
                Relation::Partners => self.partners_of(&xref),
                Relation::Siblings => self.siblings_of(&xref),
                Relation::StepSiblings => self.step_siblings_of(&xref),
            };
        }

        let individuals = self.individuals.values();
        let found: Vec<Xref> = match query.operator {
            Operator::Exist => individuals
                .filter(|individual| query.exists(individual))
                .map(|individual| individual.xref().clone())
                .collect(),
            Operator::NotExist => individuals
                .filter(|individual| !query.exists(individual))
                .map(|individual| individual.xref().clone())
                .collect(),
            _ => individuals
                .filter(|individual| query.matches(individual))
                .map(|individual| individual.xref().clone())
                .collect(),
        };

        if found.is_empty() {
            query.check_for_typo(self);
        }
        found
    }
}

/// Identifiers in both lists, in the order of the first.
#[must_use]
pub fn intersection(first: &[Xref], second: &[Xref]) -> Vec<Xref> {
    let second: HashSet<&Xref> = second.iter().collect();
    dedup(first.iter().filter(|xref| second.contains(xref)))
}

/// Identifiers in either list, those of the first list first.
#[must_use]
pub fn union(first: &[Xref], second: &[Xref]) -> Vec<Xref> {
    dedup(first.iter().chain(second))
}

/// Identifiers in the first list but not the second.
#[must_use]
pub fn difference(first: &[Xref], second: &[Xref]) -> Vec<Xref> {
    let second: HashSet<&Xref> = second.iter().collect();
    dedup(first.iter().filter(|xref| !second.contains(xref)))
}

fn dedup<'a>(xrefs: impl Iterator<Item = &'a Xref>) -> Vec<Xref> {
    let mut seen = HashSet::new();
    xrefs
        .filter(|xref| seen.insert(*xref))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::Options;

    const PEOPLE: &str = "0 HEAD\n1 GEDC\n2 VERS 5.5.1\n\
        0 @I1@ INDI\n1 NAME Fred /Smith/\n2 GIVN Fred\n2 SURN Smith\n1 SEX M\n\
        1 BIRT\n2 DATE 7 NOV 1896\n2 PLAC Paris, France\n1 FAMS @F1@\n\
        0 @I2@ INDI\n1 NAME Jane /Doe/\n1 SEX F\n1 BIRT\n2 DATE ABT 1900\n1 FAMS @F1@\n\
        0 @I3@ INDI\n1 NAME Ann /Smith/\n1 SEX M\n1 FAMC @F1@\n\
        1 EVEN 40 cM\n2 TYPE DNA\n\
        0 @I10@ INDI\n1 NAME Bo /Smith/\n1 NAME Robert /Smith/\n1 SEX F\n1 SEX M\n1 FAMC @F1@\n\
        1 BIRT\n2 DATE 1 JAN 1920\n2 _PROOF disproven\n\
        0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n1 CHIL @I10@\n\
        0 TRLR\n";

    fn document() -> Document {
        Document::parse(PEOPLE, Options::default()).unwrap()
    }

    fn xrefs(ids: &[&str]) -> Vec<Xref> {
        ids.iter().map(|id| id.parse().unwrap()).collect()
    }

    fn find(tag: &str, value: &str, op: &str) -> Vec<Xref> {
        document().find(&Query::new(tag, value, op, true).unwrap())
    }

    #[test]
    fn best_candidates_only_by_default() {
        let doc = document();
        let best = Query::new("sex", "M", "=", true).unwrap();
        assert_eq!(doc.find(&best), xrefs(&["i1", "i3"]));

        let any = Query::new("sex", "M", "=", false).unwrap();
        assert_eq!(doc.find(&any), xrefs(&["i1", "i3", "i10"]));
    }

    #[test_case("=", &["i2"]; "equal")]
    #[test_case("!=", &["i1", "i3", "i10"]; "not equal")]
    #[test_case("not =", &["i1", "i3", "i10"]; "spelled not equal")]
    fn xref_comparisons(op: &str, expected: &[&str]) {
        assert_eq!(find("id", "@I2@", op), xrefs(expected));
    }

    #[test]
    fn xrefs_compare_by_number() {
        assert_eq!(find("xref", "i3", ">"), xrefs(&["i10"]));
        assert_eq!(find("xref", "3", "<="), xrefs(&["i1", "i2", "i3"]));
    }

    #[test]
    fn event_dates() {
        assert_eq!(find("birth.date", "19000101", "<"), xrefs(&["i1"]));
        assert_eq!(find("birt", "19000101", ">="), xrefs(&["i2"]));
        assert_eq!(find("birt", "", "exist"), xrefs(&["i1", "i2"]));
        assert_eq!(find("birt", "Y", "="), xrefs(&["i1", "i2"]));
        assert_eq!(
            document().find(&Query::new("birt", "", "exist", false).unwrap()),
            xrefs(&["i1", "i2", "i10"])
        );
        assert_eq!(find("deat", "", "!exist"), xrefs(&["i1", "i2", "i3", "i10"]));
    }

    #[test]
    fn event_places() {
        assert_eq!(find("birt.place", "Paris", "in"), xrefs(&["i1"]));
        assert_eq!(find("birt.plac", "Paris", "not in"), Vec::<Xref>::new());
    }

    #[test]
    fn name_parts() {
        assert_eq!(find("name", "Fred /Smith/", "="), xrefs(&["i1"]));
        assert_eq!(find("name.surname", "Smith", "="), xrefs(&["i1"]));
        assert_eq!(find("name.display", "Smith", "in"), xrefs(&["i1", "i3", "i10"]));
        assert_eq!(
            document().find(&Query::new("name", "Robert", "in", false).unwrap()),
            xrefs(&["i10"])
        );
    }

    #[test]
    fn custom_events() {
        assert_eq!(find("event", "dna", "="), xrefs(&["i3"]));
        assert_eq!(find("even.dna", "40 cM", "="), xrefs(&["i3"]));
        assert_eq!(find("fact", "", "exist"), Vec::<Xref>::new());
    }

    #[test]
    fn family_lists() {
        assert_eq!(find("famc", "f1", "="), xrefs(&["i3", "i10"]));
        assert_eq!(find("fams", "", "exist"), xrefs(&["i1", "i2"]));
    }

    #[test]
    fn relationship_queries_ignore_operator() {
        let doc = document();
        let garbled = Query::new("childrenof", "@I1@", "ignored?", true).unwrap();
        assert_eq!(doc.find(&garbled), xrefs(&["i3", "i10"]));
        assert!(matches!(
            Query::new("sex", "M", "ignored?", true),
            Err(QueryError::UnknownOperator(_))
        ));
        assert!(matches!(
            Query::new("childrenof", "", "=", true),
            Err(QueryError::Xref(_))
        ));

        let fred = doc.find(&Query::new("children of", "@I1@", "=", true).unwrap());
        let jane = doc.find(&Query::new("childrenof", "i2", ">", false).unwrap());
        assert_eq!(intersection(&fred, &jane), xrefs(&["i3", "i10"]));

        let siblings = doc.find(&Query::new("siblings_of", "i3", "=", true).unwrap());
        assert_eq!(siblings, xrefs(&["i10"]));
        let parents = doc.find(&Query::new("parentsof", "i10", "=", true).unwrap());
        assert_eq!(parents, xrefs(&["i1", "i2"]));
    }

    #[test_case("", QueryError::EmptyTag; "empty")]
    #[test_case("birt.", QueryError::EmptyPart("birt.".to_string()); "empty subtag")]
    #[test_case(".date", QueryError::EmptyPart(".date".to_string()); "empty tag")]
    #[test_case("bogus", QueryError::UnknownTag("bogus".to_string()); "unknown")]
    #[test_case("marr", QueryError::UnknownTag("marr".to_string()); "family event")]
    #[test_case(
        "sex.date",
        QueryError::InvalidSubtag { tag: "sex".to_string(), subtag: "date".to_string() };
        "attribute subtag"
    )]
    #[test_case(
        "birth.where",
        QueryError::InvalidSubtag { tag: "birt".to_string(), subtag: "where".to_string() };
        "event subtag"
    )]
    fn invalid_tags(tag: &str, expected: QueryError) {
        assert_eq!(Query::new(tag, "", "=", true).unwrap_err(), expected);
    }

    #[test]
    fn invalid_operator() {
        assert_eq!(
            Query::new("sex", "M", "~", true).unwrap_err(),
            QueryError::UnknownOperator("~".to_string())
        );
    }

    #[test]
    fn relationship_value_must_be_an_identifier() {
        assert!(matches!(
            Query::new("parentsof", "@ @", "=", true),
            Err(QueryError::Xref(_))
        ));
    }

    #[test]
    fn list_helpers() {
        let a = xrefs(&["i1", "i2", "i3", "i2"]);
        let b = xrefs(&["i3", "i4"]);

        assert_eq!(intersection(&a, &b), xrefs(&["i3"]));
        assert_eq!(union(&a, &b), xrefs(&["i1", "i2", "i3", "i4"]));
        assert_eq!(difference(&a, &b), xrefs(&["i1", "i2"]));
    }
}
