//! Re-emits a document's original lines, optionally redacted.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{
    domain::{
        fact::{FactKey, FactRef, Facts},
        DateValue, Document, PrivacyLevel, Section, Xref,
    },
    storage::LineId,
};

/// Lead sequence written before files that are not version 5.x.
const LEAD: &str = "\u{feff}";

impl Document {
    /// Writes every line as it was read, in file order.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_original<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_lead(out)?;
        for record in &self.records {
            self.write_subtree(out, record.line)?;
        }
        Ok(())
    }

    /// Writes every line, redacting individuals and families according to
    /// their privacy level.
    ///
    /// Records at [`PrivacyLevel::Off`] and all other sections are written
    /// verbatim. Under [`PrivacyLevel::Max`] each standard event is replaced
    /// by `<level> <TAG> Y` and custom events lose their dates. Under
    /// [`PrivacyLevel::Min`] event dates are reduced to modifier and year.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_redacted<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_lead(out)?;
        for record in &self.records {
            let xref = Xref::new(self.lines[record.line].tag()).ok();
            let target = match record.section {
                Section::Individual => xref
                    .and_then(|xref| self.individuals.get(&xref))
                    .map(|individual| (individual.facts(), individual.privacy())),
                Section::Family => xref
                    .and_then(|xref| self.families.get(&xref))
                    .map(|family| (family.facts(), family.privacy())),
                _ => None,
            };
            match target {
                Some((facts, level)) if level != PrivacyLevel::Off => {
                    self.write_redacted_record(out, record.line, facts, level)?;
                }
                _ => self.write_subtree(out, record.line)?,
            }
        }
        Ok(())
    }

    /// Writes the original lines to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save_original(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_original(&mut out)?;
        out.flush()
    }

    /// Writes the redacted lines to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save_redacted(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_redacted(&mut out)?;
        out.flush()
    }

    fn write_lead<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.version.starts_with('5') {
            Ok(())
        } else {
            out.write_all(LEAD.as_bytes())
        }
    }

    fn write_subtree<W: Write>(&self, out: &mut W, root: LineId) -> io::Result<()> {
        for (_, line) in self.lines.subtree(root) {
            writeln!(out, "{}", line.raw())?;
        }
        Ok(())
    }

    /// Writes a subtree, leaving out every `DATE` line and its sub-lines.
    fn write_without_dates<W: Write>(&self, out: &mut W, root: LineId) -> io::Result<()> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let line = &self.lines[id];
            if line.tag() == "date" {
                continue;
            }
            writeln!(out, "{}", line.raw())?;
            stack.extend(line.children().iter().rev().copied());
        }
        Ok(())
    }

    /// Writes an event with its immediate `DATE` lines reduced to modifier
    /// and year.
    fn write_reduced<W: Write>(
        &self,
        out: &mut W,
        event: LineId,
        date: &DateValue,
    ) -> io::Result<()> {
        let line = &self.lines[event];
        writeln!(out, "{}", line.raw())?;
        for &child in line.children() {
            let sub = &self.lines[child];
            if sub.tag() != "date" {
                self.write_subtree(out, child)?;
                continue;
            }
            let reduced = date.reduced();
            if reduced.is_empty() {
                writeln!(out, "{} {}", sub.level(), sub.raw_tag())?;
            } else {
                writeln!(out, "{} {} {reduced}", sub.level(), sub.raw_tag())?;
            }
            for &grandchild in sub.children() {
                self.write_subtree(out, grandchild)?;
            }
        }
        Ok(())
    }

    fn write_redacted_record<W: Write>(
        &self,
        out: &mut W,
        root: LineId,
        facts: &Facts,
        level: PrivacyLevel,
    ) -> io::Result<()> {
        writeln!(out, "{}", self.lines[root].raw())?;
        for &child in self.lines[root].children() {
            let line = &self.lines[child];
            match (facts.fact_at(child), level) {
                (
                    Some(FactRef::Keyed {
                        key: FactKey::Event(_),
                        ..
                    }),
                    PrivacyLevel::Max,
                ) => writeln!(out, "{} {} Y", line.level(), line.raw_tag())?,
                (Some(FactRef::Custom(_)), PrivacyLevel::Max) => {
                    self.write_without_dates(out, child)?;
                }
                (
                    Some(FactRef::Keyed {
                        key: FactKey::Event(_),
                        ..
                    }),
                    PrivacyLevel::Min,
                ) => {
                    let date = facts.event_at(child).map(|event| &event.date);
                    self.write_reduced(out, child, date.unwrap_or(&DateValue::Unknown))?;
                }
                (Some(FactRef::Custom(_)), PrivacyLevel::Min) => {
                    let date = facts.custom_at(child).and_then(|custom| custom.date.as_ref());
                    self.write_reduced(out, child, date.unwrap_or(&DateValue::Unknown))?;
                }
                _ => self.write_subtree(out, child)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::domain::{Options, PrivacyPolicy};

    const TEXT: &str = "0 HEAD\n1 GEDC\n2 VERS 5.5.1\n\
        0 @I1@ INDI\n1 NAME Living /Person/\n1 BIRT\n2 DATE 7 NOV 1996\n2 PLAC Paris\n\
        1 EVEN 40 cM\n2 TYPE dna\n2 DATE 1 AUG 2021\n2 NOTE kept\n\
        0 @I2@ INDI\n1 NAME Recent /Death/\n1 BIRT\n2 DATE ABT 1896\n1 DEAT\n2 DATE FROM 1 JAN 2010 TO 3 MAR 2011\n3 PHRASE spring\n\
        0 @I3@ INDI\n1 NAME Long /Gone/\n1 DEAT\n2 DATE 1 JAN 1900\n\
        0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I3@\n1 MARR\n2 DATE 2015\n\
        0 TRLR\n";

    fn document() -> Document {
        let mut doc = Document::parse(TEXT, Options::default()).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        doc.set_privacy(&PrivacyPolicy::as_of(today));
        doc
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn original_round_trips() {
        let doc = document();
        assert_eq!(render(|out| doc.write_original(out)), TEXT);
    }

    #[test]
    fn modern_versions_get_lead_sequence() {
        let text = "0 HEAD\n1 GEDC\n2 VERS 7.0.1\n0 @I1@ INDI\n0 TRLR\n";
        let doc = Document::parse(text, Options::default()).unwrap();
        assert_eq!(
            render(|out| doc.write_original(out)),
            format!("{LEAD}{text}")
        );
    }

    #[test]
    fn redacted_output() {
        let doc = document();
        let expected = "0 HEAD\n1 GEDC\n2 VERS 5.5.1\n\
            0 @I1@ INDI\n1 NAME Living /Person/\n1 BIRT Y\n\
            1 EVEN 40 cM\n2 TYPE dna\n2 NOTE kept\n\
            0 @I2@ INDI\n1 NAME Recent /Death/\n1 BIRT\n2 DATE ABT 1896\n1 DEAT\n2 DATE FROM 2010 TO 2011\n3 PHRASE spring\n\
            0 @I3@ INDI\n1 NAME Long /Gone/\n1 DEAT\n2 DATE 1 JAN 1900\n\
            0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I3@\n1 MARR Y\n\
            0 TRLR\n";
        assert_eq!(render(|out| doc.write_redacted(out)), expected);
    }

    #[test]
    fn unset_privacy_writes_original() {
        let mut doc = document();
        doc.unset_privacy();
        assert_eq!(render(|out| doc.write_redacted(out)), TEXT);
    }

    #[test]
    fn saves_to_files() {
        let dir = TempDir::new().unwrap();
        let doc = document();

        let original = dir.path().join("original.ged");
        doc.save_original(&original).unwrap();
        assert_eq!(std::fs::read_to_string(&original).unwrap(), TEXT);

        let redacted = dir.path().join("redacted.ged");
        doc.save_redacted(&redacted).unwrap();
        let written = std::fs::read_to_string(&redacted).unwrap();
        assert!(written.contains("1 BIRT Y\n"));
        assert!(!written.contains("7 NOV 1996"));
    }
}
