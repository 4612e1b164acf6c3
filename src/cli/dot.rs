use std::{
    collections::HashSet,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use gedcom::{domain::UNKNOWN_NAME, Document, Individual, Options, Xref};
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Write a Graphviz graph of all families, or of one individual's ancestors")]
pub struct Dot {
    /// The GEDCOM file
    file: PathBuf,

    /// Graph only the ancestors of this individual
    #[arg(long, value_name = "XREF")]
    id: Option<Xref>,

    /// Where to write, stdout if omitted
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Dot {
    #[instrument(skip(options))]
    pub fn run(self, options: Options) -> anyhow::Result<()> {
        let document = super::load(&self.file, options)?;
        let mut out = super::output(self.output.as_deref())?;
        let written = match &self.id {
            Some(xref) => {
                let individual = document
                    .individual(xref)
                    .with_context(|| format!("individual {xref} not found"))?;
                write_ancestors(&document, individual, &mut out)
            }
            None => write_graph(&document, &mut out),
        };
        written
            .and_then(|()| out.flush())
            .context("failed to write output")
    }
}

fn family_node(xref: &Xref) -> String {
    format!("f_{xref}")
}

fn label(document: &Document, xref: Option<&Xref>) -> String {
    xref.and_then(|xref| document.individual(xref))
        .map_or_else(|| UNKNOWN_NAME.to_string(), |individual| individual.name().html.clone())
}

/// Each family is a record node with a husband, middle and wife port. Partners
/// link from their port to the middle of the family they were born into, and
/// individuals without a family of their own get a node of their own.
fn write_graph<W: Write>(document: &Document, out: &mut W) -> io::Result<()> {
    writeln!(out, "digraph family {{")?;
    writeln!(out, "node [shape=record];")?;
    writeln!(out, "rankdir=LR;")?;

    for (xref, family) in document.families() {
        writeln!(
            out,
            "{} [label=\"<h>{}|<p>|<w>{}\"];",
            family_node(xref),
            label(document, family.husband()),
            label(document, family.wife())
        )?;
    }

    for (xref, family) in document.families() {
        for (port, partner) in [("h", family.husband()), ("w", family.wife())] {
            let parents = partner
                .and_then(|partner| document.individual(partner))
                .and_then(|individual| individual.famc().first());
            if let Some(parents) = parents {
                writeln!(out, "{}:{port} -> {}:p;", family_node(xref), family_node(parents))?;
            }
        }
    }

    for (xref, individual) in document.individuals() {
        if !individual.fams().is_empty() {
            continue;
        }
        if let Some(parents) = individual.famc().first() {
            writeln!(out, "i_{xref} [label=\"<i> {}\"];", individual.name().html)?;
            writeln!(out, "i_{xref}:i -> {}:p;", family_node(parents))?;
        }
    }

    writeln!(out, "}}")
}

/// Name with `[MOD] YYYY - [MOD] YYYY` life years on a second line.
fn ancestor_label(individual: &Individual) -> String {
    let summary = individual.summary();
    let years = format!("{} - {}", summary.birth_year, summary.death_year);
    match years.trim() {
        "" | "-" => summary.html,
        years => format!("{}\\n{years}", summary.html),
    }
}

/// Walks up through each first parent family. A family already drawn is
/// linked again but not revisited, so ancestry loops end.
fn write_ancestors<W: Write>(
    document: &Document,
    individual: &Individual,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "digraph family {{")?;
    writeln!(out, "node [shape=record];")?;
    writeln!(out, "rankdir=LR;")?;

    let root = format!("i_{}", individual.xref());
    writeln!(out, "{root}[label=\"<i> {}\"];", ancestor_label(individual))?;

    let mut drawn = HashSet::new();
    let mut pending: Vec<(String, &Xref)> = individual
        .famc()
        .first()
        .map(|parents| (format!("{root}:i"), parents))
        .into_iter()
        .collect();

    while let Some((link, xref)) = pending.pop() {
        let Some(family) = document.family(xref) else {
            continue;
        };
        let node = family_node(xref);
        let first_visit = drawn.insert(xref);
        let partners = [("h", family.husband()), ("w", family.wife())]
            .map(|(port, partner)| (port, partner.and_then(|id| document.individual(id))));

        if first_visit {
            let [husband, wife] = partners.map(|(_, partner)| {
                partner.map_or_else(|| UNKNOWN_NAME.to_string(), ancestor_label)
            });
            writeln!(out, "{node} [label=\"<h>{husband}|<p>|<w>{wife}\"];")?;
        }
        writeln!(out, "{link} -> {node}:p;")?;
        if !first_visit {
            continue;
        }

        for (port, partner) in partners.into_iter().rev() {
            if let Some(parents) = partner.and_then(|partner| partner.famc().first()) {
                pending.push((format!("{node}:{port}"), parents));
            }
        }
    }

    writeln!(out, "}}")
}
