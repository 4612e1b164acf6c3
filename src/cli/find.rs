use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gedcom::{
    domain::{query, Summary},
    Document, Options, Query, Xref,
};
use regex::Regex;
use serde::Serialize;
use tracing::instrument;

use super::terminal::{fit, terminal_width, Colorize};

/// Names are cut to this width when the terminal is narrow.
const NARROW_NAME_WIDTH: usize = 24;

#[derive(Debug, Parser)]
#[command(about = "Find individuals matching a condition")]
pub struct Find {
    /// The GEDCOM file
    file: PathBuf,

    /// Tag to search, e.g. `sex`, `birt.date`, `name.surn`, `childrenof`
    tag: String,

    /// Comparison: =, !=, <, <=, >, >=, in, !in, exist, !exist
    operator: String,

    /// Value to compare with. Dates are `yyyymmdd`.
    #[arg(default_value = "")]
    value: String,

    /// Compare every candidate fact, not only the best one
    #[arg(long)]
    all: bool,

    /// Keep only matches that are also children of this individual
    #[arg(long, value_name = "ID")]
    child_of: Vec<String>,

    /// Drop matches that are children of this individual
    #[arg(long, value_name = "ID")]
    not_child_of: Vec<String>,

    /// Regular expression the display name must match
    #[arg(long, value_name = "REGEX")]
    name: Option<String>,

    /// Print the matches as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Row {
    id: String,
    #[serde(flatten)]
    summary: Summary,
}

impl Find {
    #[instrument(skip(options))]
    pub fn run(self, options: Options) -> anyhow::Result<()> {
        let document = super::load(&self.file, options)?;
        let search = Query::new(&self.tag, self.value.as_str(), &self.operator, !self.all)?;
        let mut found = document.find(&search);

        for parent in &self.child_of {
            found = query::intersection(&found, &children(&document, parent)?);
        }
        for parent in &self.not_child_of {
            found = query::difference(&found, &children(&document, parent)?);
        }

        let pattern = self
            .name
            .as_deref()
            .map(|pattern| Regex::new(pattern).with_context(|| format!("invalid regex: {pattern}")))
            .transpose()?;

        let rows: Vec<Row> = found
            .iter()
            .filter_map(|xref| document.individual(xref))
            .map(|individual| Row {
                id: individual.xref().to_string(),
                summary: individual.summary(),
            })
            .filter(|row| {
                pattern
                    .as_ref()
                    .is_none_or(|pattern| pattern.is_match(&row.summary.name))
            })
            .collect();

        if self.json {
            serde_json::to_writer_pretty(std::io::stdout(), &rows)
                .context("failed to serialize matches")?;
            println!();
        } else {
            print_table(&rows);
        }
        Ok(())
    }
}

fn children(document: &Document, parent: &str) -> anyhow::Result<Vec<Xref>> {
    let search = Query::new("childrenof", parent, "=", true)?;
    Ok(document.find(&search))
}

fn print_table(rows: &[Row]) {
    if rows.is_empty() {
        println!("{}", "no matches".dim());
        return;
    }

    let narrow = terminal_width().is_some_and(|width| width < 80);
    println!("{}", "id\tName\tBirth\tDeath".dim());
    for row in rows {
        let name = if narrow {
            fit(&row.summary.name, NARROW_NAME_WIDTH)
        } else {
            row.summary.name.clone()
        };
        println!(
            "{}\t{name}\t{}\t{}",
            row.id.info(),
            row.summary.birth,
            row.summary.death
        );
    }
}
