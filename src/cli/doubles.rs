use std::path::PathBuf;

use clap::Parser;
use gedcom::Options;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Report facts recorded more than once")]
pub struct Doubles {
    /// The GEDCOM file
    file: PathBuf,

    /// Only report these tags (comma-separated, e.g. `birt,deat`)
    #[arg(long, value_delimiter = ',', value_name = "TAG")]
    tags: Vec<String>,
}

impl Doubles {
    #[instrument(skip(options))]
    pub fn run(self, options: Options) -> anyhow::Result<()> {
        let document = super::load(&self.file, options)?;
        let wanted = |tag: &str| {
            self.tags.is_empty() || self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
        };

        let mut reported = 0;
        for (xref, repeated) in document.repeated_individual_facts() {
            let name = document
                .individual(&xref)
                .map(|individual| individual.name().display.clone())
                .unwrap_or_default();
            for (tag, count) in repeated.into_iter().filter(|(tag, _)| wanted(tag)) {
                println!("{} / {name} has {count} {tag}", xref.to_string().info());
                reported += 1;
            }
        }
        for (xref, repeated) in document.repeated_family_facts() {
            for (tag, count) in repeated.into_iter().filter(|(tag, _)| wanted(tag)) {
                println!("{} has {count} {tag}", xref.to_string().info());
                reported += 1;
            }
        }

        if reported == 0 {
            println!("{}", "no repeated facts".success());
        }
        Ok(())
    }
}
