use std::{collections::BTreeMap, io::Write, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use gedcom::{
    domain::{name::to_unicode, AttributeKind},
    Document, Family, Individual, Options, Xref,
};
use serde::Serialize;
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Write individuals and families as JSON")]
pub struct Json {
    /// The GEDCOM file
    file: PathBuf,

    /// Where to write, stdout if omitted
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Json {
    #[instrument(skip(options))]
    pub fn run(self, options: Options) -> anyhow::Result<()> {
        let document = super::load(&self.file, options)?;
        let mut out = super::output(self.output.as_deref())?;
        serde_json::to_writer_pretty(&mut out, &Export::new(&document))
            .context("failed to serialize document")?;
        writeln!(out).and_then(|()| out.flush()).context("failed to write output")
    }
}

/// Identifiers are written by number alone, so `i12` becomes `12`.
fn short_id(xref: &Xref) -> String {
    xref.number()
        .map_or_else(|| xref.to_string(), |number| number.to_string())
}

#[derive(Debug, Serialize)]
struct Export {
    individuals: BTreeMap<String, IndividualEntry>,
    families: BTreeMap<String, FamilyEntry>,
}

#[derive(Debug, Serialize)]
struct IndividualEntry {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fams: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    famc: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sex: Option<String>,
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    birth: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    death: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    given: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
}

#[derive(Debug, Serialize)]
struct FamilyEntry {
    husband: Option<String>,
    wife: Option<String>,
    children: Vec<String>,
}

impl Export {
    fn new(document: &Document) -> Self {
        Self {
            individuals: document
                .individuals()
                .iter()
                .map(|(xref, individual)| (short_id(xref), IndividualEntry::new(individual)))
                .collect(),
            families: document
                .families()
                .iter()
                .map(|(xref, family)| (short_id(xref), FamilyEntry::new(family)))
                .collect(),
        }
    }
}

impl IndividualEntry {
    fn new(individual: &Individual) -> Self {
        let summary = individual.summary();
        let parts = &individual.name().parts;
        let part = |value: Option<&String>| value.map(|value| to_unicode(value));
        Self {
            fams: individual.fams().iter().map(short_id).collect(),
            famc: individual.famc().iter().map(short_id).collect(),
            sex: individual
                .attribute(AttributeKind::Sex)
                .or_else(|| individual.attributes(AttributeKind::Sex).first())
                .map(|fact| fact.value.clone()),
            name: summary.unicode,
            birth: summary.birth,
            death: summary.death,
            given: part(parts.given.as_ref()),
            surname: part(parts.surname.as_ref()),
            nickname: part(parts.nickname.as_ref()),
        }
    }
}

impl FamilyEntry {
    fn new(family: &Family) -> Self {
        Self {
            husband: family.husband().map(short_id),
            wife: family.wife().map(short_id),
            children: family.children().iter().map(short_id).collect(),
        }
    }
}
