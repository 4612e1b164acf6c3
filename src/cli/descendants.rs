use std::path::PathBuf;

use clap::Parser;
use gedcom::{Options, Xref};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Count everyone's children, descendants and generations")]
pub struct Descendants {
    /// The GEDCOM file
    file: PathBuf,

    /// Report only this individual
    #[arg(long, value_name = "ID")]
    id: Option<Xref>,
}

impl Descendants {
    #[instrument(skip(options))]
    pub fn run(self, options: Options) -> anyhow::Result<()> {
        let document = super::load(&self.file, options)?;
        let result = match &self.id {
            Some(xref) => document.descendant_counts_of(xref),
            None => document.descendant_counts(),
        };

        for (parent, child) in &result.cycles {
            eprintln!(
                "{} {parent} lists {child} as a child but {child} is also an ancestor",
                "warning:".warning()
            );
        }

        println!("id\tName\tBirth\tDeath\tChildren\tDescendants\tGenerations");
        let rows = result
            .counts
            .iter()
            .filter(|(xref, _)| self.id.as_ref().is_none_or(|id| id == *xref));
        for (xref, counts) in rows {
            let Some(individual) = document.individual(xref) else {
                continue;
            };
            let summary = individual.summary();
            println!(
                "{xref}\t{}\t{}\t{}\t{}\t{}\t{}",
                summary.name,
                summary.birth,
                summary.death,
                counts.children,
                counts.descendants,
                counts.generations
            );
        }
        Ok(())
    }
}
