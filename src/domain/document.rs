use std::{collections::BTreeMap, fmt};

use crate::{
    domain::{config::Options, diagnostics::Messages, Family, Individual, Xref},
    storage::{LineArena, LineId},
};

/// Vendor extension sections that are recognized without warning.
pub(crate) const EXTENSION_SECTIONS: [&str; 4] = ["_evdef", "_todo", "_plac_defn", "_event_defn"];

/// The top-level section a level-0 record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    /// `HEAD`
    Header,
    /// `SUBM`
    Submitter,
    /// `INDI`
    Individual,
    /// `FAM`
    Family,
    /// `OBJE`
    Object,
    /// `REPO`
    Repository,
    /// `SNOTE`
    SharedNote,
    /// `SOUR`
    Source,
    /// A recognized vendor extension such as `_EVDEF`.
    Extension(String),
    /// Any other section, by its literal name.
    Unknown(String),
    /// `TRLR`
    Trailer,
}

impl Section {
    /// Classifies a level-0 line, given in lowercase.
    #[must_use]
    pub fn classify(line: &str) -> Self {
        if line.starts_with("0 head") {
            Self::Header
        } else if line.starts_with("0 @i") && line.ends_with(" indi") {
            Self::Individual
        } else if line.starts_with("0 @f") && line.ends_with(" fam") {
            Self::Family
        } else if line.starts_with("0 trlr") {
            Self::Trailer
        } else if line.ends_with("@ obje") {
            Self::Object
        } else if line.ends_with("@ repo") {
            Self::Repository
        } else if line.ends_with("@ sour") {
            Self::Source
        } else if line.ends_with("@ subm") {
            Self::Submitter
        } else if line.contains("@ snote") {
            Self::SharedNote
        } else {
            let name = line.strip_prefix("0 ").unwrap_or(line);
            let last = name.rsplit(' ').next().unwrap_or(name);
            if EXTENSION_SECTIONS.contains(&name) || EXTENSION_SECTIONS.contains(&last) {
                Self::Extension(last.to_string())
            } else {
                Self::Unknown(name.to_string())
            }
        }
    }

    /// The lowercase section name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Header => "head",
            Self::Submitter => "subm",
            Self::Individual => "indi",
            Self::Family => "fam",
            Self::Object => "obje",
            Self::Repository => "repo",
            Self::SharedNote => "snote",
            Self::Source => "sour",
            Self::Extension(name) | Self::Unknown(name) => name,
            Self::Trailer => "trlr",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A level-0 record and the section it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The section.
    pub section: Section,
    /// The level-0 line.
    pub line: LineId,
}

/// A parsed GEDCOM file.
///
/// Holds the original lines, the records in file order, and the normalized
/// individuals and families derived from them, together with every warning
/// raised while reading.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) lines: LineArena,
    pub(crate) records: Vec<Record>,
    pub(crate) version: String,
    pub(crate) individuals: BTreeMap<Xref, Individual>,
    pub(crate) families: BTreeMap<Xref, Family>,
    pub(crate) options: Options,
    pub(crate) messages: Messages,
}

impl Document {
    /// The line arena holding every original line.
    #[must_use]
    pub const fn lines(&self) -> &LineArena {
        &self.lines
    }

    /// Level-0 records in file order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Level-0 records of one section, in file order.
    pub fn section<'a>(&'a self, section: &'a Section) -> impl Iterator<Item = LineId> + 'a {
        self.records
            .iter()
            .filter(move |record| &record.section == section)
            .map(|record| record.line)
    }

    /// The declared GEDCOM version, e.g. `5.5.1`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The options the document was read with.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Warnings raised while reading and validating.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        self.messages.entries()
    }

    /// All individuals, ordered by identifier.
    #[must_use]
    pub const fn individuals(&self) -> &BTreeMap<Xref, Individual> {
        &self.individuals
    }

    /// All families, ordered by identifier.
    #[must_use]
    pub const fn families(&self) -> &BTreeMap<Xref, Family> {
        &self.families
    }

    /// Looks up an individual.
    #[must_use]
    pub fn individual(&self, xref: &Xref) -> Option<&Individual> {
        self.individuals.get(xref)
    }

    /// Looks up a family.
    #[must_use]
    pub fn family(&self, xref: &Xref) -> Option<&Family> {
        self.families.get(xref)
    }
}
