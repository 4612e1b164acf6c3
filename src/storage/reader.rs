use std::{
    collections::{BTreeMap, HashSet},
    fs, io,
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::{
    domain::{
        diagnostics::Messages, DateError, Document, Options, Record, Section, Xref, XrefError,
    },
    storage::{LineArena, LineId, LineRecord, TokenizeError},
};

/// GEDCOM versions that can be read. A trailing `x` matches any point release.
pub const SUPPORTED_VERSIONS: [&str; 3] = ["5.5", "5.5.1", "7.0.x"];

/// Deepest level that can be attached to the hierarchy.
const MAX_LEVEL: usize = 5;

/// Errors that abort reading a document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the input file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A line is not of the form `<level> <tag> [<value>]`.
    #[error("line {line}: {source}")]
    Tokenize {
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        source: TokenizeError,
    },

    /// A line has no enclosing record at the level above it.
    #[error("line {line} has no parent record: '{text}'")]
    Orphan {
        /// One-based line number.
        line: usize,
        /// The line text.
        text: String,
    },

    /// A record was found before any header.
    #[error("header section not detected")]
    MissingHeader,

    /// The header does not declare a version.
    #[error("version not detected in header section")]
    VersionNotDetected,

    /// The declared version is not in [`SUPPORTED_VERSIONS`].
    #[error("version not supported: {0}")]
    UnsupportedVersion(String),

    /// An unrecognized top-level section, when configured to be fatal.
    #[error("unknown section: {0}")]
    UnknownSection(String),

    /// The input did not end in the trailer section.
    #[error("final section was not the trailer")]
    FinalSectionNotTrailer,

    /// The header must occur exactly once.
    #[error("header must occur exactly once, found {0}")]
    HeaderCount(usize),

    /// The trailer must occur exactly once.
    #[error("trailer must occur exactly once, found {0}")]
    TrailerCount(usize),

    /// The file has no individuals, when configured to be fatal.
    #[error("no individuals")]
    NoIndividuals,

    /// The file has no families, when configured to be fatal.
    #[error("no families")]
    NoFamilies,

    /// A date uses an unsupported calendar, or is malformed when bad dates
    /// are configured to be fatal.
    #[error(transparent)]
    Date(#[from] DateError),

    /// A record has an unusable cross-reference.
    #[error("invalid cross-reference: {0}")]
    Xref(#[from] XrefError),

    /// A tag that may occur only once was repeated.
    #[error("{record} has more than one '{tag}' record")]
    Repeated {
        /// The individual or family.
        record: Xref,
        /// The repeated tag.
        tag: &'static str,
    },

    /// An individual refers to a family that does not exist, when
    /// configured to be fatal.
    #[error("individual {individual} lists {family} in {tag} but it was not found")]
    MissingFamily {
        /// The referring individual.
        individual: Xref,
        /// The reference tag.
        tag: &'static str,
        /// The missing family.
        family: Xref,
    },

    /// A family refers to an individual that does not exist, when
    /// configured to be fatal.
    #[error("family {family} lists {tag} {individual} but it was not found")]
    MissingIndividual {
        /// The referring family.
        family: Xref,
        /// The reference tag.
        tag: &'static str,
        /// The missing individual.
        individual: Xref,
    },
}

/// Builds the line hierarchy and section list, one line at a time.
struct Reader {
    options: Options,
    messages: Messages,
    lines: LineArena,
    records: Vec<Record>,
    /// Most recent line at each level.
    open: [Option<LineId>; MAX_LEVEL + 1],
    /// Lowercased opening lines of individual and family records.
    openings: HashSet<String>,
    /// Whether the current record is a skipped duplicate.
    skipping: bool,
    version: Option<String>,
    last_section: Option<Section>,
}

impl Reader {
    fn new(options: Options) -> Self {
        if options.show_settings {
            tracing::info!("effective options:\n{options}");
        }
        Self {
            options,
            messages: Messages::new(options.display_warnings),
            lines: LineArena::default(),
            records: Vec::new(),
            open: [None; MAX_LEVEL + 1],
            openings: HashSet::new(),
            skipping: false,
            version: None,
            last_section: None,
        }
    }

    fn read_line(&mut self, number: usize, raw: &str) -> Result<(), ParseError> {
        let raw = if number == 1 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };
        let text = raw.replace('\t', " ");
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let line = LineRecord::tokenize(text).map_err(|source| ParseError::Tokenize {
            line: number,
            source,
        })?;
        match usize::from(line.level()) {
            0 => self.open_record(line),
            level @ 1..=MAX_LEVEL => self.append(number, level, line),
            _ => {
                self.messages.warn(format!("level not handled: {text}"));
                Ok(())
            }
        }
    }

    fn open_record(&mut self, line: LineRecord) -> Result<(), ParseError> {
        let lowered = line.raw().to_lowercase();
        let section = Section::classify(&lowered);
        self.open = [None; MAX_LEVEL + 1];

        self.skipping = matches!(section, Section::Individual | Section::Family)
            && !self.openings.insert(lowered);
        if self.skipping {
            self.messages
                .warn(format!("duplicate record ignored: {}", line.raw()));
        }

        if section != Section::Header && self.version.is_none() {
            self.version = Some(self.confirm_version()?);
        }

        if let Section::Unknown(_) = section {
            if self.options.exit_on_unknown_section {
                return Err(ParseError::UnknownSection(line.raw().to_string()));
            }
            self.messages
                .warn(format!("unknown section: {}", line.raw()));
        }

        self.last_section = Some(section.clone());
        if !self.skipping {
            let id = self.lines.push(line);
            self.records.push(Record { section, line: id });
            self.open[0] = Some(id);
        }
        Ok(())
    }

    fn append(&mut self, number: usize, level: usize, line: LineRecord) -> Result<(), ParseError> {
        if self.skipping {
            return Ok(());
        }
        let parent = self.open[level - 1].ok_or_else(|| ParseError::Orphan {
            line: number,
            text: line.raw().to_string(),
        })?;
        let id = self.lines.push(line);
        self.lines.attach(parent, id);
        self.open[level] = Some(id);
        for deeper in &mut self.open[level + 1..] {
            *deeper = None;
        }
        Ok(())
    }

    /// Reads `HEAD.GEDC.VERS` and checks it against [`SUPPORTED_VERSIONS`].
    fn confirm_version(&self) -> Result<String, ParseError> {
        let header = self
            .records
            .iter()
            .find(|record| record.section == Section::Header)
            .ok_or(ParseError::MissingHeader)?;
        let version = self
            .lines
            .children_tagged(header.line, "gedc")
            .flat_map(|(gedc, _)| self.lines.children_tagged(gedc, "vers"))
            .find_map(|(_, vers)| vers.non_blank_value())
            .map(str::trim)
            .ok_or(ParseError::VersionNotDetected)?;

        if is_supported(version) {
            tracing::debug!(version, "detected GEDCOM version");
            Ok(version.to_string())
        } else {
            Err(ParseError::UnsupportedVersion(version.to_string()))
        }
    }

    fn count(&self, section: &Section) -> usize {
        self.records
            .iter()
            .filter(|record| &record.section == section)
            .count()
    }

    fn finish(mut self) -> Result<Document, ParseError> {
        if self.last_section != Some(Section::Trailer) {
            return Err(ParseError::FinalSectionNotTrailer);
        }
        match self.count(&Section::Header) {
            1 => {}
            n => return Err(ParseError::HeaderCount(n)),
        }
        match self.count(&Section::Trailer) {
            1 => {}
            n => return Err(ParseError::TrailerCount(n)),
        }
        let version = self.version.take().ok_or(ParseError::VersionNotDetected)?;

        if self.count(&Section::Individual) == 0 {
            if self.options.exit_on_no_individuals {
                return Err(ParseError::NoIndividuals);
            }
            self.messages.warn("no individuals");
        }
        if self.count(&Section::Family) == 0 {
            if self.options.exit_on_no_families {
                return Err(ParseError::NoFamilies);
            }
            self.messages.warn("no families");
        }

        Ok(Document {
            lines: self.lines,
            records: self.records,
            version,
            individuals: BTreeMap::new(),
            families: BTreeMap::new(),
            options: self.options,
            messages: self.messages,
        })
    }
}

fn is_supported(version: &str) -> bool {
    SUPPORTED_VERSIONS
        .iter()
        .any(|supported| match supported.split_once('x') {
            Some((prefix, _)) => version.starts_with(prefix),
            None => version == *supported,
        })
}

impl Document {
    /// Parses GEDCOM text.
    ///
    /// Builds the line hierarchy, parses every individual and family record,
    /// removes dangling cross-references and derives child relationships.
    /// Recoverable problems are recorded in [`Document::messages`].
    ///
    /// # Errors
    ///
    /// Returns an error for structural problems (missing or repeated header or
    /// trailer, unsupported version, malformed or orphaned lines, a repeated
    /// once-only tag, non-Gregorian dates) and for any data problem the
    /// options promote to an error.
    #[instrument(skip(text), fields(bytes = text.len()))]
    pub fn parse(text: &str, options: Options) -> Result<Self, ParseError> {
        let mut reader = Reader::new(options);
        for (index, line) in text.lines().enumerate() {
            reader.read_line(index + 1, line)?;
        }

        let mut document = reader.finish()?;
        document.parse_records()?;
        document.validate_references()?;
        document.derive_relations();

        tracing::debug!(
            individuals = document.individuals.len(),
            families = document.families.len(),
            warnings = document.messages.len(),
            "document parsed"
        );
        Ok(document)
    }

    /// Reads and parses a GEDCOM file.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] if the file cannot be read, or any error
    /// from [`Document::parse`].
    pub fn load(path: &Path, options: Options) -> Result<Self, ParseError> {
        let text = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, options)
    }
}
