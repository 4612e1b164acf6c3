use std::{fmt, path::Path};

/// Settings that control how strictly a file is read.
///
/// Most options toggle whether a particular data problem is reported as a
/// warning (the default) or aborts the parse.
///
/// Options can be built up from key/value pairs using the GEDCOM-tool style
/// kebab-case names (`exit-on-bad-date`, `only-birth`, ...), or loaded from a
/// TOML table using the same keys. Unknown keys and non-boolean values never
/// fail: they produce a diagnostic and leave the default in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Options {
    /// Echo data warnings through the log as they are found.
    pub display_warnings: bool,

    /// Fail on a malformed date instead of repairing it.
    pub exit_on_bad_date: bool,

    /// Fail on an unrecognized top-level section.
    pub exit_on_unknown_section: bool,

    /// Fail when the file contains no individuals.
    pub exit_on_no_individuals: bool,

    /// Fail when the file contains no families.
    pub exit_on_no_families: bool,

    /// Fail when a family references an individual that does not exist.
    pub exit_on_missing_individuals: bool,

    /// Fail when an individual references a family that does not exist.
    pub exit_on_missing_families: bool,

    /// Restrict child/parent family lists to birth relationships.
    pub only_birth: bool,

    /// Log the effective settings at the start of a parse.
    pub show_settings: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            display_warnings: false,
            exit_on_bad_date: false,
            exit_on_unknown_section: false,
            exit_on_no_individuals: true,
            exit_on_no_families: false,
            exit_on_missing_individuals: false,
            exit_on_missing_families: false,
            only_birth: false,
            show_settings: false,
        }
    }
}

/// Errors that can occur when loading options from a file.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// The options file could not be read.
    #[error("failed to read options file {path}: {source}")]
    Read {
        /// Path of the options file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The options file is not valid TOML.
    #[error("failed to parse options file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Options {
    /// All recognized option keys.
    pub const KEYS: [&'static str; 9] = [
        "display-warnings",
        "exit-on-bad-date",
        "exit-on-unknown-section",
        "exit-on-no-individuals",
        "exit-on-no-families",
        "exit-on-missing-individuals",
        "exit-on-missing-families",
        "only-birth",
        "show-settings",
    ];

    /// Loads options from a TOML file at the given path.
    ///
    /// Returns the options together with any diagnostics about unknown keys or
    /// unusable values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<(Self, Vec<String>), OptionsError> {
        let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses options from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML.
    pub fn from_toml_str(content: &str) -> Result<(Self, Vec<String>), OptionsError> {
        let table: toml::Table = content.parse()?;
        let mut options = Self::default();
        let diagnostics = table
            .iter()
            .filter_map(|(key, value)| options.apply(key, value))
            .collect();
        Ok((options, diagnostics))
    }

    /// Builds options from `(key, value)` pairs such as `("only-birth", "true")`.
    #[must_use]
    pub fn from_pairs<'a, I>(pairs: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = Self::default();
        let diagnostics = pairs
            .into_iter()
            .filter_map(|(key, value)| options.set(key, value))
            .collect();
        (options, diagnostics)
    }

    /// Sets one option from its textual value.
    ///
    /// Returns a diagnostic if the key is unknown or the value is not a
    /// boolean; in the latter case the option is reset to its default.
    pub fn set(&mut self, key: &str, value: &str) -> Option<String> {
        let parsed = match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        };
        self.assign(key, parsed, value)
    }

    /// Sets one option from a TOML value.
    ///
    /// See [`Options::set`] for the diagnostics produced.
    pub fn apply(&mut self, key: &str, value: &toml::Value) -> Option<String> {
        self.assign(key, value.as_bool(), &value.to_string())
    }

    fn assign(&mut self, key: &str, value: Option<bool>, shown: &str) -> Option<String> {
        let key = key.trim().to_lowercase().replace('_', "-");
        let default = Self::default();
        let (slot, fallback) = match key.as_str() {
            "display-warnings" => (&mut self.display_warnings, default.display_warnings),
            "exit-on-bad-date" => (&mut self.exit_on_bad_date, default.exit_on_bad_date),
            "exit-on-unknown-section" => (
                &mut self.exit_on_unknown_section,
                default.exit_on_unknown_section,
            ),
            "exit-on-no-individuals" => (
                &mut self.exit_on_no_individuals,
                default.exit_on_no_individuals,
            ),
            "exit-on-no-families" => (&mut self.exit_on_no_families, default.exit_on_no_families),
            "exit-on-missing-individuals" => (
                &mut self.exit_on_missing_individuals,
                default.exit_on_missing_individuals,
            ),
            "exit-on-missing-families" => (
                &mut self.exit_on_missing_families,
                default.exit_on_missing_families,
            ),
            "only-birth" => (&mut self.only_birth, default.only_birth),
            "show-settings" => (&mut self.show_settings, default.show_settings),
            _ => {
                return Some(format!(
                    "unknown option '{key}'; valid options are: {}",
                    Self::KEYS.join(", ")
                ));
            }
        };
        if let Some(value) = value {
            *slot = value;
            None
        } else {
            *slot = fallback;
            Some(format!(
                "option '{key}' expects true or false, got '{shown}'; using default {fallback}"
            ))
        }
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = [
            self.display_warnings,
            self.exit_on_bad_date,
            self.exit_on_unknown_section,
            self.exit_on_no_individuals,
            self.exit_on_no_families,
            self.exit_on_missing_individuals,
            self.exit_on_missing_families,
            self.only_birth,
            self.show_settings,
        ];
        for (key, value) in Self::KEYS.iter().zip(values) {
            writeln!(f, "{key} = {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_permissive_except_for_individuals() {
        let options = Options::default();
        assert!(options.exit_on_no_individuals);
        assert!(!options.exit_on_bad_date);
        assert!(!options.exit_on_missing_families);
        assert!(!options.only_birth);
    }

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"only-birth = true\nexit-on-bad-date = true\n")
            .unwrap();

        let (options, diagnostics) = Options::load(file.path()).unwrap();

        assert!(options.only_birth);
        assert!(options.exit_on_bad_date);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Options::load(&missing).unwrap_err();
        assert!(matches!(error, OptionsError::Read { .. }));
    }

    #[test]
    fn invalid_toml_returns_error() {
        let error = Options::from_toml_str("only-birth = = true").unwrap_err();
        assert!(matches!(error, OptionsError::Parse(_)));
    }

    #[test]
    fn unknown_key_lists_valid_keys() {
        let (options, diagnostics) = Options::from_pairs([("exit-on-typo", "true")]);

        assert_eq!(options, Options::default());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("exit-on-typo"));
        assert!(diagnostics[0].contains("only-birth"));
    }

    #[test]
    fn non_boolean_value_falls_back_to_default() {
        let (options, diagnostics) =
            Options::from_toml_str("exit-on-no-individuals = \"sometimes\"").unwrap();

        assert!(options.exit_on_no_individuals);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn underscore_keys_are_accepted() {
        let mut options = Options::default();
        assert_eq!(options.set("display_warnings", "yes"), None);
        assert!(options.display_warnings);
    }

    #[test]
    fn displayed_settings_reload_as_a_file() {
        let options = Options {
            only_birth: true,
            exit_on_no_individuals: false,
            ..Options::default()
        };

        let (reloaded, diagnostics) = Options::from_toml_str(&options.to_string()).unwrap();

        assert_eq!(reloaded, options);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn display_lists_every_key() {
        let rendered = Options::default().to_string();
        for key in Options::KEYS {
            assert!(rendered.contains(key), "missing {key}");
        }
    }
}
