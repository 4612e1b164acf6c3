//! Redaction levels for re-exporting records about possibly living people.
//!
//! An individual who died long enough ago is left untouched. One who died
//! recently keeps their events but only with year precision. Everyone else
//! is assumed to be alive and has event details hidden entirely. A family
//! takes the strictest level of its two partners.

use chrono::{Datelike, Local, Months, NaiveDate};
use tracing::instrument;

use crate::domain::{fact::EventKind, Document, Individual};

/// How much of a record to hide on output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrivacyLevel {
    /// Output everything.
    #[default]
    Off,
    /// Reduce event dates to year and modifier.
    Min,
    /// Replace standard events with a bare "known" flag and drop dates from
    /// custom events.
    Max,
}

/// Thresholds for computing privacy levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivacyPolicy {
    /// Deaths at least this many years ago are not redacted.
    pub years_since_death: u32,
    /// Anyone born more than this many years before the death threshold is
    /// assumed to have died.
    pub max_lifetime: u32,
    /// The date thresholds are measured from.
    pub today: NaiveDate,
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        Self {
            years_since_death: 20,
            max_lifetime: 104,
            today: Local::now().date_naive(),
        }
    }
}

impl PrivacyPolicy {
    /// A policy measured from a fixed date.
    #[must_use]
    pub const fn as_of(today: NaiveDate) -> Self {
        Self {
            years_since_death: 20,
            max_lifetime: 104,
            today,
        }
    }

    /// `today` minus the given number of years, as `yyyymmdd`.
    fn years_ago(&self, years: u32) -> String {
        let date = self
            .today
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        format!(
            "{:04}{:02}{:02}",
            date.year().max(0),
            date.month(),
            date.day()
        )
    }

    /// Dates at or before this value count as long ago deaths.
    #[must_use]
    pub fn death_limit(&self) -> String {
        self.years_ago(self.years_since_death)
    }

    /// Dates at or before this value count as long ago births.
    #[must_use]
    pub fn birth_limit(&self) -> String {
        self.years_ago(self.years_since_death.saturating_add(self.max_lifetime))
    }

    /// Computes the level for one individual.
    ///
    /// Any death, burial or cremation record means the individual has died,
    /// which relaxes the level to at least [`PrivacyLevel::Min`]. The first
    /// such event with a known date decides: if it is at or before the death
    /// limit the level is [`PrivacyLevel::Off`]. With no death evidence at
    /// all, a birth, baptism or christening at or before the birth limit
    /// gives [`PrivacyLevel::Off`]; otherwise the individual is assumed to be
    /// living and gets [`PrivacyLevel::Max`].
    #[must_use]
    pub fn level_for(&self, individual: &Individual) -> PrivacyLevel {
        let has_death = EventKind::DEATH
            .iter()
            .any(|kind| !individual.facts().events(*kind).is_empty());

        if has_death {
            let dated = EventKind::DEATH.iter().find_map(|kind| {
                let events = individual.facts().events(*kind);
                individual
                    .facts()
                    .best_event(*kind)
                    .or_else(|| events.first())
                    .and_then(|event| event.date.max_value())
            });
            return match dated {
                Some(value) if value <= self.death_limit().as_str() => PrivacyLevel::Off,
                _ => PrivacyLevel::Min,
            };
        }

        let born = EventKind::BIRTH.iter().find_map(|kind| {
            let events = individual.facts().events(*kind);
            individual
                .facts()
                .best_event(*kind)
                .or_else(|| events.first())
                .and_then(|event| event.date.max_value())
        });
        match born {
            Some(value) if value <= self.birth_limit().as_str() => PrivacyLevel::Off,
            _ => PrivacyLevel::Max,
        }
    }
}

impl Document {
    /// Computes privacy levels for every individual and family.
    ///
    /// A family's level is the highest of its partners' levels; a missing
    /// partner contributes [`PrivacyLevel::Off`].
    #[instrument(skip(self))]
    pub fn set_privacy(&mut self, policy: &PrivacyPolicy) {
        for individual in self.individuals.values_mut() {
            individual.privacy = policy.level_for(individual);
        }
        for family in self.families.values_mut() {
            family.privacy = family
                .partners()
                .filter_map(|partner| self.individuals.get(partner))
                .map(Individual::privacy)
                .max()
                .unwrap_or_default();
        }
        tracing::debug!(
            individuals = self.individuals.len(),
            families = self.families.len(),
            "privacy levels computed"
        );
    }

    /// Sets every individual and family to the same level.
    pub fn set_all_privacy(&mut self, level: PrivacyLevel) {
        for individual in self.individuals.values_mut() {
            individual.privacy = level;
        }
        for family in self.families.values_mut() {
            family.privacy = level;
        }
    }

    /// Turns redaction off for everyone.
    pub fn unset_privacy(&mut self) {
        self.set_all_privacy(PrivacyLevel::Off);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Options;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn document(individual_lines: &str) -> Document {
        let text = format!(
            "0 HEAD\n1 GEDC\n2 VERS 5.5.1\n0 @I1@ INDI\n1 NAME Test /Person/\n{individual_lines}0 @I2@ INDI\n1 NAME Partner /Person/\n0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n0 TRLR\n"
        );
        Document::parse(&text, Options::default()).unwrap()
    }

    fn level(individual_lines: &str) -> PrivacyLevel {
        let doc = document(individual_lines);
        let policy = PrivacyPolicy::as_of(today());
        policy.level_for(doc.individual(&"i1".parse().unwrap()).unwrap())
    }

    #[test]
    fn limits_are_whole_years_before_today() {
        let policy = PrivacyPolicy::as_of(today());
        assert_eq!(policy.death_limit(), "20040615");
        assert_eq!(policy.birth_limit(), "19000615");
    }

    #[test]
    fn burial_long_ago_is_off() {
        assert_eq!(level("1 BURI\n2 DATE 3 MAR 1994\n"), PrivacyLevel::Off);
    }

    #[test]
    fn recent_death_is_min() {
        assert_eq!(level("1 DEAT\n2 DATE 2010\n"), PrivacyLevel::Min);
    }

    #[test]
    fn flagged_undated_death_is_min() {
        assert_eq!(level("1 DEAT Y\n"), PrivacyLevel::Min);
    }

    #[test]
    fn no_evidence_is_max() {
        assert_eq!(level(""), PrivacyLevel::Max);
    }

    #[test]
    fn old_birth_without_death_is_off() {
        assert_eq!(level("1 BIRT\n2 DATE 1850\n"), PrivacyLevel::Off);
    }

    #[test]
    fn recent_birth_without_death_is_max() {
        assert_eq!(level("1 BIRT\n2 DATE 1990\n"), PrivacyLevel::Max);
    }

    #[test]
    fn undated_death_does_not_fall_back_to_birth() {
        assert_eq!(level("1 BIRT\n2 DATE 1850\n1 DEAT Y\n"), PrivacyLevel::Min);
    }

    #[test]
    fn range_uses_latest_bound() {
        assert_eq!(
            level("1 DEAT\n2 DATE BET 1990 AND 2010\n"),
            PrivacyLevel::Min
        );
    }

    #[test]
    fn family_takes_strictest_partner() {
        let mut doc = document("1 DEAT\n2 DATE 1 JAN 1950\n");
        doc.set_privacy(&PrivacyPolicy::as_of(today()));

        let husband = doc.individual(&"i1".parse().unwrap()).unwrap();
        let wife = doc.individual(&"i2".parse().unwrap()).unwrap();
        let family = doc.family(&"f1".parse().unwrap()).unwrap();
        assert_eq!(husband.privacy(), PrivacyLevel::Off);
        assert_eq!(wife.privacy(), PrivacyLevel::Max);
        assert_eq!(family.privacy(), PrivacyLevel::Max);

        doc.unset_privacy();
        assert_eq!(
            doc.family(&"f1".parse().unwrap()).unwrap().privacy(),
            PrivacyLevel::Off
        );
    }
}
