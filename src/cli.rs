use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

mod check;
mod descendants;
mod dot;
mod doubles;
mod find;
mod json;
mod loops;
mod original;
mod privatize;
mod terminal;

use anyhow::Context;
use check::Check;
use clap::ArgAction;
use descendants::Descendants;
use dot::Dot;
use doubles::Doubles;
use find::Find;
use gedcom::{Document, Options};
use json::Json;
use loops::Loops;
use original::Original;
use privatize::Privatize;
use tracing::instrument;

/// Parse a `key=value` option pair.
fn parse_option(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| format!("expected key=value, found '{s}'"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// A TOML file of reader options
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Set a reader option, e.g. `-o only-birth=true` (repeatable)
    #[arg(short = 'o', long = "option", global = true, value_parser = parse_option, value_name = "KEY=VALUE")]
    options: Vec<(String, String)>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let options = self.options()?;
        self.command.run(options)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }

    /// Options from the config file, overridden by `--option` pairs.
    fn options(&self) -> anyhow::Result<Options> {
        let (mut options, mut diagnostics) = match &self.config {
            Some(path) => Options::load(path)
                .with_context(|| format!("failed to load options from {}", path.display()))?,
            None => (Options::default(), Vec::new()),
        };
        diagnostics.extend(
            self.options
                .iter()
                .filter_map(|(key, value)| options.set(key, value)),
        );
        for diagnostic in diagnostics {
            tracing::warn!("{diagnostic}");
        }
        Ok(options)
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Read a file and report data problems
    Check(Check),

    /// Find individuals matching a condition
    Find(Find),

    /// Write the file back out unchanged
    Original(Original),

    /// Write the file with details of living people hidden
    Privatize(Privatize),

    /// Count everyone's children, descendants and generations
    Descendants(Descendants),

    /// Report facts recorded more than once
    Doubles(Doubles),

    /// Report individuals who are their own ancestors
    Loops(Loops),

    /// Write a Graphviz graph of all families
    Dot(Dot),

    /// Write individuals and families as JSON
    Json(Json),
}

impl Command {
    fn run(self, options: Options) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(options)?,
            Self::Find(command) => command.run(options)?,
            Self::Original(command) => command.run(options)?,
            Self::Privatize(command) => command.run(options)?,
            Self::Descendants(command) => command.run(options)?,
            Self::Doubles(command) => command.run(options)?,
            Self::Loops(command) => command.run(options)?,
            Self::Dot(command) => command.run(options)?,
            Self::Json(command) => command.run(options)?,
        }
        Ok(())
    }
}

/// Reads a GEDCOM file.
#[instrument(skip(options))]
fn load(path: &Path, options: Options) -> anyhow::Result<Document> {
    Document::load(path, options).with_context(|| format!("failed to read {}", path.display()))
}

/// Opens the output file, or stdout when no path or `-` is given.
fn output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn option_pairs() {
        assert_eq!(
            parse_option("only-birth = true"),
            Ok(("only-birth".to_string(), "true".to_string()))
        );
        assert!(parse_option("only-birth").is_err());
    }

    #[test]
    fn options_override_defaults() {
        let cli = Cli::parse_from([
            "ged",
            "-o",
            "only-birth=yes",
            "--option",
            "exit-on-no-individuals=false",
            "check",
            "family.ged",
        ]);
        let options = cli.options().unwrap();
        assert!(options.only_birth);
        assert!(!options.exit_on_no_individuals);
    }

    #[test]
    fn options_from_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "only-birth = true\nexit-on-bad-date = true").unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["ged", "--config", path, "-o", "only-birth=false", "check", "x.ged"]);
        let options = cli.options().unwrap();
        assert!(!options.only_birth);
        assert!(options.exit_on_bad_date);
    }
}
