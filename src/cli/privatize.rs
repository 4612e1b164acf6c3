use std::{io::Write, path::PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use gedcom::{Options, PrivacyLevel, PrivacyPolicy};
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Write the file with details of living people hidden")]
pub struct Privatize {
    /// The GEDCOM file
    file: PathBuf,

    /// Where to write, stdout if omitted
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Redaction level, computed per individual by default
    #[arg(long, value_enum, default_value_t)]
    level: Level,

    /// Deaths at least this many years ago are not redacted
    #[arg(long, default_value_t = 20)]
    years_since_death: u32,

    /// Longest expected lifetime in years
    #[arg(long, default_value_t = 104)]
    max_lifetime: u32,

    /// Measure from this date instead of today (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    as_of: Option<NaiveDate>,
}

/// How levels are assigned.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
enum Level {
    /// From each individual's death and birth events
    #[default]
    Auto,
    /// Hide nothing
    Off,
    /// Reduce every event date to its year
    Min,
    /// Hide every event
    Max,
}

impl Privatize {
    #[instrument(skip(options))]
    pub fn run(self, options: Options) -> anyhow::Result<()> {
        let mut document = super::load(&self.file, options)?;
        match self.level {
            Level::Auto => document.set_privacy(&self.policy()),
            Level::Off => document.unset_privacy(),
            Level::Min => document.set_all_privacy(PrivacyLevel::Min),
            Level::Max => document.set_all_privacy(PrivacyLevel::Max),
        }

        let mut out = super::output(self.output.as_deref())?;
        document
            .write_redacted(&mut out)
            .and_then(|()| out.flush())
            .context("failed to write output")
    }

    fn policy(&self) -> PrivacyPolicy {
        let mut policy = self
            .as_of
            .map_or_else(PrivacyPolicy::default, PrivacyPolicy::as_of);
        policy.years_since_death = self.years_since_death;
        policy.max_lifetime = self.max_lifetime;
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_reach_the_policy() {
        let command = Privatize::parse_from([
            "privatize",
            "family.ged",
            "--years-since-death",
            "30",
            "--as-of",
            "2024-06-15",
        ]);
        let policy = command.policy();

        assert_eq!(policy.years_since_death, 30);
        assert_eq!(policy.max_lifetime, 104);
        assert_eq!(policy.death_limit(), "19940615");
        assert_eq!(policy.birth_limit(), "18900615");
    }
}
