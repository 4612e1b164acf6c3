use std::path::PathBuf;

use clap::Parser;
use gedcom::Options;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Report individuals who are their own ancestors")]
pub struct Loops {
    /// The GEDCOM file
    file: PathBuf,
}

impl Loops {
    #[instrument(skip(options))]
    pub fn run(self, options: Options) -> anyhow::Result<()> {
        let document = super::load(&self.file, options)?;
        let loops = document.self_ancestors();
        if loops.is_empty() {
            println!("{}", "no ancestry loops".success());
            return Ok(());
        }

        for members in &loops {
            let names: Vec<String> = members
                .iter()
                .map(|xref| {
                    let name = document
                        .individual(xref)
                        .map(|individual| individual.name().display.as_str())
                        .unwrap_or_default();
                    format!("{} {name}", xref.to_string().info())
                })
                .collect();
            println!("{} {}", "loop:".warning(), names.join(", "));
        }
        anyhow::bail!("found {} ancestry loops", loops.len())
    }
}
