//! Normalization of free-form GEDCOM dates into comparable values.
//!
//! A date such as `ABT 7 NOV 1996` or `BET 1900 AND 1910` is reduced to a pair
//! of bounds, each holding a modifier, a zero-padded `yyyymmdd` string that
//! compares correctly as text, and the year as an integer.
//!
//! Only the Gregorian calendar is understood. A leading `GREGORIAN` (or
//! `@#DGREGORIAN@`) escape and a trailing `BCE` epoch marker are accepted and
//! ignored; any other calendar is an error.
//!
//! Input that cannot be read is repaired rather than rejected, unless strict
//! mode is requested: an unreadable day, month or year falls back to `1`, the
//! date is marked malformed, and a description of each repair is returned for
//! the caller to report.

use std::fmt;

const DEFAULT_DAY: u32 = 1;
const DEFAULT_MONTH: u32 = 1;
const DEFAULT_YEAR: u32 = 1;

/// Years that fit the four digits of a comparable value.
const YEARS: std::ops::RangeInclusive<u32> = 1..=9999;

const CALENDARS: [&str; 4] = ["hebrew", "julian", "french_r", "roman"];

const MONTHS: [(&str, u32); 24] = [
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("sept", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

const MONTH_ABBREVIATIONS: [&str; 13] = [
    "", "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find_map(|(month, number)| (*month == name).then_some(*number))
}

/// Qualifier attached to one bound of a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DateModifier {
    /// An exact date.
    #[default]
    None,
    /// `BEF`
    Before,
    /// `AFT`
    After,
    /// `ABT`, also added implicitly when a date lacks precision.
    About,
    /// `CAL`
    Calculated,
    /// `EST`
    Estimated,
    /// Start of a `FROM .. TO ..` period.
    From,
    /// End of a `FROM .. TO ..` period, or a lone `TO ..`.
    To,
    /// Start of a `BET .. AND ..` range.
    Between,
    /// End of a `BET .. AND ..` range.
    And,
}

impl DateModifier {
    /// The lowercase keyword used in files, empty for an exact date.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Before => "bef",
            Self::After => "aft",
            Self::About => "abt",
            Self::Calculated => "cal",
            Self::Estimated => "est",
            Self::From => "from",
            Self::To => "to",
            Self::Between => "bet",
            Self::And => "and",
        }
    }

    /// Recognizes a single-date prefix, including common alternate spellings
    /// such as `about`, `circa` or `ca.`.
    #[must_use]
    pub fn from_prefix(token: &str) -> Option<Self> {
        let modifier = match token {
            "abt" | "abt." | "about" | "ca" | "ca." | "circa" => Self::About,
            "aft" | "aft." | "after" => Self::After,
            "bef" | "bef." | "before" => Self::Before,
            "cal" | "cal." | "calculated" => Self::Calculated,
            "est" | "est." | "estimate" | "estimated" => Self::Estimated,
            _ => return None,
        };
        Some(modifier)
    }
}

impl fmt::Display for DateModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One end of a date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateBound {
    /// Qualifier for this end.
    pub modifier: DateModifier,
    /// Zero-padded `yyyymmdd`, or empty if nothing could be read.
    pub value: String,
    /// The year, when `value` is present.
    pub year: Option<i32>,
}

impl DateBound {
    fn new(modifier: DateModifier, value: String) -> Self {
        let year = value.get(..4).and_then(|year| year.parse().ok());
        Self {
            modifier,
            value,
            year,
        }
    }

    /// Renders the bound as `[MOD] D MON YYYY`.
    #[must_use]
    pub fn display(&self) -> String {
        let date = match (
            self.value.get(..4),
            self.value.get(4..6).and_then(|m| m.parse::<usize>().ok()),
            self.value.get(6..8).and_then(|d| d.parse::<u32>().ok()),
        ) {
            (Some(year), Some(month), Some(day)) if month < MONTH_ABBREVIATIONS.len() => {
                format!("{day} {} {year}", MONTH_ABBREVIATIONS[month])
            }
            _ => self.value.clone(),
        };
        join_upper(self.modifier, &date)
    }

    /// Renders the bound as `[MOD] YYYY`.
    #[must_use]
    pub fn year_display(&self) -> String {
        let year = self.year.map(|year| year.to_string()).unwrap_or_default();
        join_upper(self.modifier, &year)
    }
}

fn join_upper(modifier: DateModifier, rest: &str) -> String {
    let modifier = modifier.keyword().to_uppercase();
    match (modifier.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => modifier,
        (false, false) => format!("{modifier} {rest}"),
    }
}

/// A date that was present in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownDate {
    /// The date text exactly as given.
    pub original: String,
    /// Whether the date is a period or range with distinct bounds.
    pub is_range: bool,
    /// Whether any part of the date had to be repaired.
    pub malformed: bool,
    /// Earliest bound. Comparisons use this bound.
    pub min: DateBound,
    /// Latest bound. Identical to `min` unless `is_range` is set.
    pub max: DateBound,
}

/// A normalized date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DateValue {
    /// No date was given.
    #[default]
    Unknown,
    /// A date was given.
    Known(KnownDate),
}

impl DateValue {
    /// Whether a date was given.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// The date details, when a date was given.
    #[must_use]
    pub const fn known(&self) -> Option<&KnownDate> {
        match self {
            Self::Unknown => None,
            Self::Known(date) => Some(date),
        }
    }

    /// The comparable value of the earliest bound.
    #[must_use]
    pub fn min_value(&self) -> Option<&str> {
        self.known().map(|date| date.min.value.as_str())
    }

    /// The comparable value of the latest bound.
    #[must_use]
    pub fn max_value(&self) -> Option<&str> {
        self.known().map(|date| date.max.value.as_str())
    }

    /// Renders the date with only years and modifiers, e.g. `ABT 1896` or
    /// `FROM 1900 TO 1910`. Empty for an unknown date.
    #[must_use]
    pub fn reduced(&self) -> String {
        match self {
            Self::Unknown => String::new(),
            Self::Known(date) if date.is_range => format!(
                "{} {}",
                date.min.year_display(),
                date.max.year_display()
            )
            .trim()
            .to_string(),
            Self::Known(date) => date.min.year_display(),
        }
    }

    /// Renders the full date, e.g. `ABT 1 NOV 1996` or
    /// `BET 1 JAN 1900 AND 1 JAN 1910`. Empty for an unknown date.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Unknown => String::new(),
            Self::Known(date) if date.is_range => {
                format!("{} {}", date.min.display(), date.max.display())
                    .trim()
                    .to_string()
            }
            Self::Known(date) => date.min.display(),
        }
    }
}

/// Errors that abort date normalization.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DateError {
    /// The date uses a calendar other than Gregorian.
    #[error("unsupported calendar '{calendar}' in date '{original}'")]
    UnsupportedCalendar {
        /// The calendar token.
        calendar: String,
        /// The date text.
        original: String,
    },

    /// The date could not be read and repairs were not allowed.
    #[error("malformed date '{original}': {reason}")]
    Malformed {
        /// The date text.
        original: String,
        /// What could not be read.
        reason: String,
    },
}

/// The result of normalizing a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// The normalized date.
    pub value: DateValue,
    /// One description per repair made to the input.
    pub repairs: Vec<String>,
}

/// Normalizes free-form date text.
///
/// With `strict` set, the first repair that would be needed is returned as
/// [`DateError::Malformed`] instead.
///
/// # Errors
///
/// Returns [`DateError::UnsupportedCalendar`] for any non-Gregorian calendar,
/// and [`DateError::Malformed`] in strict mode when the date needs repair.
pub fn normalize(text: &str, strict: bool) -> Result<Normalized, DateError> {
    let given = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let mut reader = EndpointReader {
        original: text,
        strict,
        repairs: Vec::new(),
    };

    let given = reader.strip_calendar(&given)?;
    let given = given.strip_suffix("bce").unwrap_or(given).trim();
    if given.is_empty() {
        return Ok(Normalized {
            value: DateValue::Unknown,
            repairs: Vec::new(),
        });
    }

    let range = given
        .strip_prefix("from ")
        .and_then(|rest| rest.split_once(" to "))
        .map(|bounds| (bounds, DateModifier::From, DateModifier::To))
        .or_else(|| {
            given
                .strip_prefix("bet ")
                .and_then(|rest| rest.split_once(" and "))
                .map(|bounds| (bounds, DateModifier::Between, DateModifier::And))
        });

    let (is_range, min, max, malformed) = if let Some(((low, high), low_mod, high_mod)) = range {
        let low = reader.endpoint(low)?;
        let high = reader.endpoint(high)?;
        let malformed = low.repaired || high.repaired;
        (
            true,
            DateBound::new(low_mod, low.value),
            DateBound::new(high_mod, high.value),
            malformed,
        )
    } else {
        let (modifier, rest) = single_modifier(given);
        let end = reader.endpoint(rest)?;
        let modifier = if modifier == DateModifier::None && !end.precise {
            DateModifier::About
        } else {
            modifier
        };
        let bound = DateBound::new(modifier, end.value);
        (false, bound.clone(), bound, end.repaired)
    };

    Ok(Normalized {
        value: DateValue::Known(KnownDate {
            original: text.to_string(),
            is_range,
            malformed,
            min,
            max,
        }),
        repairs: reader.repairs,
    })
}

fn single_modifier(given: &str) -> (DateModifier, &str) {
    if let Some(rest) = given.strip_prefix("to ") {
        return (DateModifier::To, rest);
    }
    if let Some(rest) = given.strip_prefix("from ") {
        return (DateModifier::From, rest);
    }
    match given.split_once(' ') {
        Some((first, rest)) => DateModifier::from_prefix(first)
            .map_or((DateModifier::None, given), |modifier| (modifier, rest)),
        None => (DateModifier::None, given),
    }
}

struct Endpoint {
    value: String,
    /// Day, month and year were all given and none needed repair.
    precise: bool,
    repaired: bool,
}

struct EndpointReader<'a> {
    original: &'a str,
    strict: bool,
    repairs: Vec<String>,
}

impl EndpointReader<'_> {
    fn strip_calendar<'t>(&self, text: &'t str) -> Result<&'t str, DateError> {
        let (first, rest) = text.split_once(' ').unwrap_or((text, ""));
        if first == "gregorian" || first == "@#dgregorian@" {
            return Ok(rest.trim());
        }
        let calendar = first.trim_start_matches("@#d").trim_end_matches('@');
        if CALENDARS.contains(&calendar) || first.starts_with("@#d") {
            return Err(DateError::UnsupportedCalendar {
                calendar: first.to_string(),
                original: self.original.to_string(),
            });
        }
        Ok(text)
    }

    fn repair(&mut self, reason: String) -> Result<(), DateError> {
        if self.strict {
            return Err(DateError::Malformed {
                original: self.original.to_string(),
                reason,
            });
        }
        self.repairs
            .push(format!("malformed date '{}': {reason}", self.original));
        Ok(())
    }

    fn endpoint(&mut self, text: &str) -> Result<Endpoint, DateError> {
        let text = self.strip_calendar(text.trim())?;
        let text = text.strip_suffix("bce").unwrap_or(text).trim();
        let parts: Vec<&str> = text.split_whitespace().collect();
        let repairs_before = self.repairs.len();

        let (day, month, year) = match parts.as_slice() {
            [] => {
                self.repair("no date given".to_string())?;
                return Ok(Endpoint {
                    value: String::new(),
                    precise: false,
                    repaired: true,
                });
            }
            [year] => (None, None, *year),
            [month, year] => (None, Some(*month), *year),
            [day, month, year] => (Some(*day), Some(*month), *year),
            _ => {
                self.repair(format!(
                    "too many parts; using {DEFAULT_YEAR} {DEFAULT_MONTH} {DEFAULT_DAY}"
                ))?;
                return Ok(Endpoint {
                    value: format!("{DEFAULT_YEAR:04}{DEFAULT_MONTH:02}{DEFAULT_DAY:02}"),
                    precise: false,
                    repaired: true,
                });
            }
        };

        let day = match day {
            Some(day) => self.day(day)?,
            None => DEFAULT_DAY,
        };
        let month = match month {
            Some(month) => self.month(month)?,
            None => DEFAULT_MONTH,
        };
        let year = self.year(year)?;

        let repaired = self.repairs.len() > repairs_before;
        Ok(Endpoint {
            value: format!("{year:04}{month:02}{day:02}"),
            precise: parts.len() == 3 && !repaired,
            repaired,
        })
    }

    fn day(&mut self, token: &str) -> Result<u32, DateError> {
        match token.parse::<u32>() {
            Ok(day) if (1..=31).contains(&day) && is_digits(token) => Ok(day),
            _ => {
                self.repair(format!("invalid day '{token}'; using {DEFAULT_DAY}"))?;
                Ok(DEFAULT_DAY)
            }
        }
    }

    fn month(&mut self, token: &str) -> Result<u32, DateError> {
        if let Some(month) = month_number(token) {
            return Ok(month);
        }
        let cleaned = token.replace(['-', '.'], "");
        if let Some(month) = month_number(&cleaned) {
            self.repair(format!("month '{token}' read as '{cleaned}'"))?;
            return Ok(month);
        }
        self.repair(format!("invalid month '{token}'; using {DEFAULT_MONTH}"))?;
        Ok(DEFAULT_MONTH)
    }

    fn year(&mut self, token: &str) -> Result<u32, DateError> {
        if is_digits(token) {
            match token.parse::<u32>() {
                Ok(year) if YEARS.contains(&year) => return Ok(year),
                _ => {
                    self.repair(format!(
                        "year '{token}' out of range; using {DEFAULT_YEAR}"
                    ))?;
                    return Ok(DEFAULT_YEAR);
                }
            }
        }
        // dual dating such as 1750/51 keeps the first year
        let cleaned = token
            .split('/')
            .next()
            .unwrap_or(token)
            .replace(['-', '.'], "");
        if is_digits(&cleaned) {
            if let Ok(year) = cleaned.parse::<u32>() {
                if YEARS.contains(&year) {
                    self.repair(format!("year '{token}' read as '{cleaned}'"))?;
                    return Ok(year);
                }
            }
        }
        self.repair(format!("invalid year '{token}'; using {DEFAULT_YEAR}"))?;
        Ok(DEFAULT_YEAR)
    }
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn known(text: &str) -> KnownDate {
        match normalize(text, false).expect("date should normalize").value {
            DateValue::Known(date) => date,
            DateValue::Unknown => panic!("expected a known date for '{text}'"),
        }
    }

    #[test]
    fn exact_date() {
        let date = known("7 nov 1996");

        assert!(!date.is_range);
        assert!(!date.malformed);
        assert_eq!(date.min, date.max);
        assert_eq!(
            date.min,
            DateBound {
                modifier: DateModifier::None,
                value: "19961107".to_string(),
                year: Some(1996),
            }
        );
    }

    #[test]
    fn month_and_year_is_about() {
        let date = known("nov 1996");

        assert_eq!(date.min.value, "19961101");
        assert_eq!(date.min.modifier, DateModifier::About);
        assert!(!date.malformed);
        assert_eq!(date.min, date.max);
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "blank")]
    #[test_case("GREGORIAN"; "calendar only")]
    fn empty_is_unknown(text: &str) {
        let normalized = normalize(text, false).unwrap();
        assert_eq!(normalized.value, DateValue::Unknown);
        assert!(normalized.repairs.is_empty());
    }

    #[test]
    fn between_range() {
        let date = known("bet 1 jan 1900 and 1 jan 1910");

        assert!(date.is_range);
        assert_eq!(date.min.modifier, DateModifier::Between);
        assert_eq!(date.min.value, "19000101");
        assert_eq!(date.min.year, Some(1900));
        assert_eq!(date.max.modifier, DateModifier::And);
        assert_eq!(date.max.value, "19100101");
        assert_eq!(date.max.year, Some(1910));
    }

    #[test]
    fn from_to_period() {
        let date = known("FROM 1900 TO 3 MAR 1910");

        assert!(date.is_range);
        assert_eq!(date.min.modifier, DateModifier::From);
        assert_eq!(date.min.value, "19000101");
        assert_eq!(date.max.modifier, DateModifier::To);
        assert_eq!(date.max.value, "19100303");
    }

    #[test_case("to 1850", DateModifier::To; "open start")]
    #[test_case("from 1850", DateModifier::From; "open end")]
    fn single_ended_period_mirrors_bounds(text: &str, modifier: DateModifier) {
        let date = known(text);

        assert!(!date.is_range);
        assert_eq!(date.min.modifier, modifier);
        assert_eq!(date.min.value, "18500101");
        assert_eq!(date.min, date.max);
    }

    #[test_case("abt 1850", DateModifier::About; "abt")]
    #[test_case("about 1850", DateModifier::About; "about")]
    #[test_case("ca. 1850", DateModifier::About; "ca dot")]
    #[test_case("circa 1850", DateModifier::About; "circa")]
    #[test_case("bef 1850", DateModifier::Before; "bef")]
    #[test_case("after 1850", DateModifier::After; "after")]
    #[test_case("est 1850", DateModifier::Estimated; "est")]
    #[test_case("calculated 1850", DateModifier::Calculated; "calculated")]
    fn explicit_modifier_is_kept(text: &str, modifier: DateModifier) {
        let date = known(text);
        assert_eq!(date.min.modifier, modifier);
        assert_eq!(date.min.value, "18500101");
    }

    #[test]
    fn gregorian_and_bce_are_ignored() {
        let date = known("@#DGREGORIAN@ 12 MAY 1066");
        assert_eq!(date.min.value, "10660512");

        let date = known("gregorian 44 bce");
        assert_eq!(date.min.value, "00440101");
        assert_eq!(date.min.year, Some(44));
    }

    #[test_case("@#DJULIAN@ 1 JAN 1700"; "julian escape")]
    #[test_case("hebrew 5780"; "hebrew name")]
    #[test_case("@#DFRENCH R@ 1 VEND 1"; "french escape")]
    fn other_calendars_are_fatal(text: &str) {
        let error = normalize(text, false).unwrap_err();
        assert!(matches!(error, DateError::UnsupportedCalendar { .. }));
    }

    #[test]
    fn bad_day_is_repaired() {
        let normalized = normalize("seven nov 1996", false).unwrap();
        let date = normalized.value.known().unwrap();

        assert!(date.malformed);
        assert_eq!(date.min.value, "19961101");
        assert_eq!(date.min.modifier, DateModifier::About);
        assert_eq!(normalized.repairs.len(), 1);
    }

    #[test]
    fn dotted_month_is_repaired() {
        let date = known("7 nov. 1996");
        assert!(date.malformed);
        assert_eq!(date.min.value, "19961107");
    }

    #[test]
    fn unknown_month_defaults_to_january() {
        let date = known("7 never 1996");
        assert_eq!(date.min.value, "19960107");
        assert!(date.malformed);
    }

    #[test]
    fn bad_year_defaults_to_one() {
        let date = known("7 nov ninesix");
        assert_eq!(date.min.value, "00011107");
        assert_eq!(date.min.year, Some(1));
    }

    #[test_case("1 JAN 12345"; "five digits")]
    #[test_case("1 JAN 0"; "zero")]
    #[test_case("1 JAN 99999999999"; "overflow")]
    fn out_of_range_year_defaults_to_one(text: &str) {
        let normalized = normalize(text, false).unwrap();
        let date = normalized.value.known().unwrap();

        assert!(date.malformed);
        assert_eq!(date.min.value, "00010101");
        assert_eq!(date.min.value.len(), 8);
        assert_eq!(normalized.repairs.len(), 1);
        assert!(matches!(
            normalize(text, true).unwrap_err(),
            DateError::Malformed { .. }
        ));
    }

    #[test]
    fn dual_year_keeps_first() {
        let date = known("12 feb 1750/51");
        assert_eq!(date.min.value, "17500212");
        assert!(date.malformed);
    }

    #[test]
    fn too_many_parts_uses_defaults() {
        let date = known("1 2 3 4");
        assert_eq!(date.min.value, "00010101");
        assert!(date.malformed);
    }

    #[test]
    fn strict_mode_rejects_repairs() {
        let error = normalize("7 never 1996", true).unwrap_err();
        assert!(matches!(error, DateError::Malformed { .. }));

        assert!(normalize("7 nov 1996", true).is_ok());
    }

    #[test_case("7 nov 1996", "7 NOV 1996", "1996"; "exact")]
    #[test_case("abt 1896", "ABT 1 JAN 1896", "ABT 1896"; "about")]
    #[test_case("from 1900 to 1910", "FROM 1 JAN 1900 TO 1 JAN 1910", "FROM 1900 TO 1910"; "period")]
    fn renderings(text: &str, full: &str, reduced: &str) {
        let value = normalize(text, false).unwrap().value;
        assert_eq!(value.display(), full);
        assert_eq!(value.reduced(), reduced);
    }

    #[test]
    fn day_display_drops_zero_padding() {
        let value = normalize("03 mar 1910", false).unwrap().value;
        assert_eq!(value.display(), "3 MAR 1910");
    }
}
