use std::path::PathBuf;

use clap::Parser;
use gedcom::Options;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Read a file and report data problems")]
pub struct Check {
    /// The GEDCOM file
    file: PathBuf,

    /// Only print the summary line
    #[arg(long, short)]
    quiet: bool,
}

impl Check {
    #[instrument(skip(options))]
    pub fn run(self, options: Options) -> anyhow::Result<()> {
        let document = super::load(&self.file, options)?;
        let warnings = document.messages();

        if !self.quiet {
            for warning in warnings {
                println!("{} {warning}", "warning:".warning());
            }
        }

        let summary = format!(
            "GEDCOM {}: {} individuals, {} families",
            document.version(),
            document.individuals().len(),
            document.families().len()
        );
        if warnings.is_empty() {
            println!("{} {}", summary.success(), "no problems found".dim());
        } else {
            println!("{summary}, {}", format!("{} warnings", warnings.len()).warning());
        }
        Ok(())
    }
}
