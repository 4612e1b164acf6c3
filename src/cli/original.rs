use std::{io::Write, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use gedcom::Options;
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Write the file back out unchanged")]
pub struct Original {
    /// The GEDCOM file
    file: PathBuf,

    /// Where to write, stdout if omitted
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Original {
    #[instrument(skip(options))]
    pub fn run(self, options: Options) -> anyhow::Result<()> {
        let document = super::load(&self.file, options)?;
        let mut out = super::output(self.output.as_deref())?;
        document
            .write_original(&mut out)
            .and_then(|()| out.flush())
            .context("failed to write output")
    }
}
