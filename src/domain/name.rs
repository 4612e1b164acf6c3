use std::fmt::Write as _;

use crate::{domain::fact::Evidence, storage::LineId};

/// Stand-in for a blank or missing name or surname.
pub const UNKNOWN_NAME: &str = "[-?-]";

/// Structured parts of a personal name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    /// `NPFX`
    pub prefix: Option<String>,
    /// `GIVN`
    pub given: Option<String>,
    /// `SURN`
    pub surname: Option<String>,
    /// `NSFX`
    pub suffix: Option<String>,
    /// `NICK`
    pub nickname: Option<String>,
}

impl NameParts {
    /// Whether a surname sub-record was given.
    #[must_use]
    pub const fn has_surname(&self) -> bool {
        self.surname.is_some()
    }

    /// Looks up a part by its lowercase tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&str> {
        match tag {
            "npfx" => self.prefix.as_deref(),
            "givn" => self.given.as_deref(),
            "surn" => self.surname.as_deref(),
            "nsfx" => self.suffix.as_deref(),
            "nick" => self.nickname.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn slot(&mut self, tag: &str) -> Option<&mut Option<String>> {
        match tag {
            "npfx" => Some(&mut self.prefix),
            "givn" => Some(&mut self.given),
            "surn" => Some(&mut self.surname),
            "nsfx" => Some(&mut self.suffix),
            "nick" => Some(&mut self.nickname),
            _ => None,
        }
    }
}

/// A personal name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFact {
    /// The name as written, with `/` around the surname.
    pub value: String,
    /// Structured sub-parts.
    pub parts: NameParts,
    /// Human readable form.
    pub display: String,
    /// `display` escaped for HTML.
    pub html: String,
    /// `display` with non-ASCII characters as `\uXXXX` escapes.
    pub unicode: String,
    /// Confidence markers.
    pub evidence: Evidence,
    /// Source line, absent for a synthesized placeholder.
    pub line: Option<LineId>,
}

impl NameFact {
    /// Builds a name from its raw value and parts.
    ///
    /// The display form prefers the structured given name and surname when a
    /// surname part exists, and otherwise strips the slashes from the raw
    /// value.
    #[must_use]
    pub fn new(value: String, parts: NameParts, evidence: Evidence, line: Option<LineId>) -> Self {
        let display = if parts.has_surname() {
            [parts.given.as_deref(), parts.surname.as_deref()]
                .into_iter()
                .flatten()
                .filter(|part| !part.trim().is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            value.replace('/', "")
        };
        let display = display.split_whitespace().collect::<Vec<_>>().join(" ");
        Self {
            html: to_html(&display),
            unicode: to_unicode(&display),
            display,
            value,
            parts,
            evidence,
            line,
        }
    }

    /// The placeholder used when an individual has no name.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(
            UNKNOWN_NAME.to_string(),
            NameParts::default(),
            Evidence::default(),
            None,
        )
    }
}

/// Escapes text for use in HTML.
///
/// Markup characters, quotes and dashes use named entities; any other
/// non-ASCII character becomes a numeric entity.
#[must_use]
pub fn to_html(text: &str) -> String {
    let mut html = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => html.push_str("&amp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&apos;"),
            '\u{2013}' => html.push_str("&ndash;"),
            '\u{2014}' => html.push_str("&mdash;"),
            '\u{2018}' => html.push_str("&lsquo;"),
            '\u{2019}' => html.push_str("&rsquo;"),
            '\u{201c}' => html.push_str("&ldquo;"),
            '\u{201d}' => html.push_str("&rdquo;"),
            c if c.is_ascii() => html.push(c),
            c => {
                let _ = write!(html, "&#{};", u32::from(c));
            }
        }
    }
    html
}

/// Escapes text for use in JSON or JavaScript string literals.
///
/// Backslashes and double quotes are escaped, and any non-ASCII character
/// becomes a `\uXXXX` escape (a surrogate pair outside the basic plane).
#[must_use]
pub fn to_unicode(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            c if c.is_ascii() => escaped.push(c),
            c => {
                let mut units = [0; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(escaped, "\\u{unit:04x}");
                }
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn parts(given: Option<&str>, surname: Option<&str>) -> NameParts {
        NameParts {
            given: given.map(str::to_string),
            surname: surname.map(str::to_string),
            prefix: Some("Dr".to_string()),
            ..NameParts::default()
        }
    }

    #[test]
    fn display_prefers_structured_parts() {
        let name = NameFact::new(
            "Dr John /Smith/ Jr".to_string(),
            parts(Some("John"), Some("Smith")),
            Evidence::default(),
            None,
        );
        assert_eq!(name.display, "John Smith");
    }

    #[test]
    fn display_falls_back_to_raw_value() {
        let name = NameFact::new(
            "John /Smith/".to_string(),
            NameParts::default(),
            Evidence::default(),
            None,
        );
        assert_eq!(name.display, "John Smith");
    }

    #[test]
    fn display_without_given_name() {
        let name = NameFact::new(
            "/Smith/".to_string(),
            parts(None, Some("Smith")),
            Evidence::default(),
            None,
        );
        assert_eq!(name.display, "Smith");
    }

    #[test]
    fn placeholder_name() {
        let name = NameFact::unknown();
        assert_eq!(name.value, UNKNOWN_NAME);
        assert_eq!(name.display, UNKNOWN_NAME);
        assert_eq!(name.line, None);
    }

    #[test_case("Zoë", "Zo&#235;"; "diaeresis")]
    #[test_case("O'Brien", "O&apos;Brien"; "apostrophe")]
    #[test_case("A & <B>", "A &amp; &lt;B&gt;"; "markup")]
    #[test_case("Smith\u{2013}Jones", "Smith&ndash;Jones"; "en dash")]
    fn html_escaping(text: &str, expected: &str) {
        assert_eq!(to_html(text), expected);
    }

    #[test_case("Zoë", "Zo\\u00eb"; "diaeresis")]
    #[test_case("Élise", "\\u00c9lise"; "capital acute")]
    #[test_case("back\\slash", "back\\\\slash"; "backslash")]
    #[test_case("say \"hi\"", "say \\\"hi\\\""; "quotes")]
    #[test_case("\u{1F600}", "\\ud83d\\ude00"; "surrogate pair")]
    fn unicode_escaping(text: &str, expected: &str) {
        assert_eq!(to_unicode(text), expected);
    }
}
