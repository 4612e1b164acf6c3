//! Derives individuals and families from their raw record lines.

use nonempty::NonEmpty;

use crate::{
    domain::{
        date,
        diagnostics::Messages,
        fact::{select_best, CustomFact, CustomTag, EventFact, Evidence, FactKey},
        name::{NameFact, NameParts, UNKNOWN_NAME},
        AttributeFact, AttributeKind, ChildLink, DateValue, Document, EventKind, Family,
        Individual, ParentRole, Relationship, Section, Xref,
    },
    storage::{LineArena, LineId, ParseError},
};

impl Document {
    /// Parses every individual and family record into the normalized model.
    pub(crate) fn parse_records(&mut self) -> Result<(), ParseError> {
        let mut parser = RecordParser {
            lines: &self.lines,
            messages: &mut self.messages,
            strict: self.options.exit_on_bad_date,
        };

        for record in &self.records {
            match record.section {
                Section::Individual => {
                    let individual = parser.individual(record.line)?;
                    if self.individuals.contains_key(individual.xref()) {
                        parser
                            .messages
                            .warn(format!("individual {} defined twice, keeping the first", individual.xref()));
                        continue;
                    }
                    self.individuals.insert(individual.xref.clone(), individual);
                }
                Section::Family => {
                    let family = parser.family(record.line)?;
                    if self.families.contains_key(family.xref()) {
                        parser
                            .messages
                            .warn(format!("family {} defined twice, keeping the first", family.xref()));
                        continue;
                    }
                    self.families.insert(family.xref.clone(), family);
                }
                _ => {}
            }
        }
        Ok(())
    }
}

struct RecordParser<'a> {
    lines: &'a LineArena,
    messages: &'a mut Messages,
    strict: bool,
}

impl RecordParser<'_> {
    fn individual(&mut self, record: LineId) -> Result<Individual, ParseError> {
        let lines = self.lines;
        let xref = Xref::new(lines[record].tag())?;
        let mut individual = Individual::new(xref.clone(), record);
        let mut names = Vec::new();

        for &id in lines[record].children() {
            let tag = lines[id].tag();
            match tag {
                "name" => {
                    individual.facts.record_source(id, FactKey::Name, names.len());
                    names.push(self.name(&xref, id));
                }
                "fams" => {
                    if let Some(family) = self.reference(&xref, id) {
                        individual.fams.push(family);
                    }
                }
                "famc" => {
                    if let Some(family) = self.reference(&xref, id) {
                        if let Some((_, pedigree)) = lines.children_tagged(id, "pedi").next() {
                            individual.child_links.push(ChildLink {
                                family: family.clone(),
                                relationship: Relationship::from_pedigree(
                                    pedigree.value().unwrap_or_default(),
                                ),
                                role: ParentRole::Both,
                            });
                        }
                        individual.all_famc.push(family);
                    }
                }
                _ => {
                    if let Some(kind) = AttributeKind::from_tag(tag) {
                        let candidates = individual.attributes.entry(kind).or_default();
                        if kind == AttributeKind::Exid && !candidates.is_empty() {
                            return Err(ParseError::Repeated {
                                record: xref,
                                tag: kind.tag(),
                            });
                        }
                        individual.facts.record_source(
                            id,
                            FactKey::Attribute(kind),
                            candidates.len(),
                        );
                        candidates.push(attribute(lines, id));
                    } else if let Some(custom) = CustomTag::from_tag(tag) {
                        let fact = self.custom(&xref, custom, id)?;
                        individual.facts.push_custom(fact);
                    } else if let Some(kind) =
                        EventKind::from_tag(tag).filter(|kind| kind.is_individual())
                    {
                        let fact = self.event(&xref, id)?;
                        individual.child_links.extend(self.birth_links(&xref, kind, id));
                        individual.facts.push_event(kind, fact);
                    }
                }
            }
        }

        match NonEmpty::from_vec(names) {
            Some(names) => individual.names = names,
            None => self.messages.warn(format!(
                "individual {xref} has no name, using {UNKNOWN_NAME}"
            )),
        }

        let best_name = select_best(individual.names.iter().map(|name| name.evidence));
        individual.facts.set_best(FactKey::Name, best_name);
        for (kind, candidates) in &individual.attributes {
            let best = select_best(candidates.iter().map(|fact| fact.evidence));
            individual.facts.set_best(FactKey::Attribute(*kind), best);
        }
        individual.facts.select_best_events();

        Ok(individual)
    }

    fn family(&mut self, record: LineId) -> Result<Family, ParseError> {
        let lines = self.lines;
        let xref = Xref::new(lines[record].tag())?;
        let mut family = Family::new(xref.clone(), record);
        let mut partners_seen = (false, false);

        for &id in lines[record].children() {
            let tag = lines[id].tag();
            match tag {
                "husb" | "wife" => {
                    let (seen, slot, tag) = if tag == "husb" {
                        (&mut partners_seen.0, &mut family.husband, "husb")
                    } else {
                        (&mut partners_seen.1, &mut family.wife, "wife")
                    };
                    if *seen {
                        return Err(ParseError::Repeated { record: xref, tag });
                    }
                    *seen = true;
                    *slot = self.reference(&xref, id);
                }
                "chil" => {
                    if let Some(child) = self.reference(&xref, id) {
                        family.all_children.push(child);
                    }
                }
                _ => {
                    if let Some(custom) = CustomTag::from_tag(tag) {
                        let fact = self.custom(&xref, custom, id)?;
                        family.facts.push_custom(fact);
                    } else if let Some(kind) =
                        EventKind::from_tag(tag).filter(|kind| kind.is_family())
                    {
                        let fact = self.event(&xref, id)?;
                        family.facts.push_event(kind, fact);
                    }
                }
            }
        }

        family.facts.select_best_events();
        Ok(family)
    }

    fn name(&mut self, owner: &Xref, id: LineId) -> NameFact {
        let lines = self.lines;
        let line = &lines[id];
        let value = if let Some(value) = line.non_blank_value() {
            value.trim().to_string()
        } else {
            self.messages.warn(format!(
                "individual {owner}: blank name replaced with {UNKNOWN_NAME}"
            ));
            UNKNOWN_NAME.to_string()
        };

        let mut parts = NameParts::default();
        let mut evidence = Evidence::default();
        for &child in line.children() {
            let sub = &lines[child];
            if evidence.absorb(sub.tag(), sub.value()) {
                continue;
            }
            let Some(slot) = parts.slot(sub.tag()) else {
                continue;
            };
            let mut part = sub.value().unwrap_or_default().trim().to_string();
            if sub.tag() == "surn" && part.is_empty() {
                self.messages.warn(format!(
                    "individual {owner}: blank surname replaced with {UNKNOWN_NAME}"
                ));
                part = UNKNOWN_NAME.to_string();
            }
            *slot = Some(part);
        }

        NameFact::new(value, parts, evidence, Some(id))
    }

    fn event(&mut self, owner: &Xref, id: LineId) -> Result<EventFact, ParseError> {
        let lines = self.lines;
        let line = &lines[id];
        let mut fact = EventFact {
            date: DateValue::Unknown,
            place: None,
            note: None,
            evidence: Evidence::default(),
            flagged: false,
            line: id,
        };

        // some exports put a note on the event line itself
        let mut inline_note = None;
        if let Some(value) = line.non_blank_value() {
            let value = value.trim();
            if value.eq_ignore_ascii_case("y") || value.eq_ignore_ascii_case("unknown") {
                fact.flagged = true;
            } else {
                inline_note = Some(value.replace("  ", " "));
            }
        }

        for &child in line.children() {
            let sub = &lines[child];
            if fact.evidence.absorb(sub.tag(), sub.value()) {
                continue;
            }
            match sub.tag() {
                "date" => fact.date = self.date(owner, sub.value().unwrap_or_default())?,
                "plac" => fact.place = sub.non_blank_value().map(|v| v.trim().to_string()),
                "note" => fact.note = Some(note(lines, child)),
                _ => {}
            }
        }

        if let Some(inline) = inline_note {
            fact.note = Some(match fact.note.take() {
                Some(note) => format!("{note} {inline}"),
                None => inline,
            });
        }
        Ok(fact)
    }

    fn custom(&mut self, owner: &Xref, tag: CustomTag, id: LineId) -> Result<CustomFact, ParseError> {
        let lines = self.lines;
        let line = &lines[id];
        let mut fact = CustomFact {
            tag,
            value: line.non_blank_value().map(|v| v.trim().to_string()),
            kind: None,
            date: None,
            place: None,
            note: None,
            evidence: Evidence::default(),
            extra: Vec::new(),
            line: id,
        };

        for &child in line.children() {
            let sub = &lines[child];
            if fact.evidence.absorb(sub.tag(), sub.value()) {
                continue;
            }
            match sub.tag() {
                "type" => {
                    fact.kind = Some(sub.value().unwrap_or_default().trim().to_lowercase());
                }
                "date" => fact.date = Some(self.date(owner, sub.value().unwrap_or_default())?),
                "plac" => fact.place = sub.non_blank_value().map(|v| v.trim().to_string()),
                "note" => fact.note = Some(note(lines, child)),
                other => fact
                    .extra
                    .push((other.to_string(), sub.value().map(str::to_string))),
            }
        }
        Ok(fact)
    }

    /// Child links from a `FAMC` nested under a birth, adoption or
    /// christening event.
    fn birth_links(&mut self, owner: &Xref, kind: EventKind, id: LineId) -> Vec<ChildLink> {
        let relationship = match kind {
            EventKind::Birth => Relationship::Birth,
            EventKind::Adoption => Relationship::Adopted,
            EventKind::Christening => Relationship::Christened,
            _ => return Vec::new(),
        };
        let lines = self.lines;
        lines
            .children_tagged(id, "famc")
            .filter_map(|(famc, _)| {
                let family = self.reference(owner, famc)?;
                let role = lines
                    .children_tagged(famc, "adop")
                    .next()
                    .and_then(|(_, adop)| adop.value())
                    .map(ParentRole::parse)
                    .unwrap_or_default();
                Some(ChildLink {
                    family,
                    relationship,
                    role,
                })
            })
            .collect()
    }

    /// Extracts the cross-reference from a member line, skipping lines
    /// without one.
    fn reference(&mut self, owner: &Xref, id: LineId) -> Option<Xref> {
        let line = &self.lines[id];
        let reference = line.non_blank_value().and_then(|value| Xref::new(value).ok());
        if reference.is_none() {
            self.messages.warn(format!(
                "{owner}: '{}' has no usable reference, skipped",
                line.raw()
            ));
        }
        reference
    }

    fn date(&mut self, owner: &Xref, text: &str) -> Result<DateValue, ParseError> {
        let normalized = date::normalize(text, self.strict)?;
        self.messages.extend(
            normalized
                .repairs
                .into_iter()
                .map(|repair| format!("{owner}: {repair}")),
        );
        Ok(normalized.value)
    }
}

fn attribute(lines: &LineArena, id: LineId) -> AttributeFact {
    let line = &lines[id];
    let mut evidence = Evidence::default();
    for &child in line.children() {
        evidence.absorb(lines[child].tag(), lines[child].value());
    }
    AttributeFact {
        value: line.value().unwrap_or_default().trim().to_string(),
        evidence,
        line: id,
    }
}

/// Joins a note with its `CONC` and `CONT` continuation lines.
fn note(lines: &LineArena, id: LineId) -> String {
    let mut text = lines[id].value().unwrap_or_default().to_string();
    for (_, continuation) in lines[id]
        .children()
        .iter()
        .map(|child| (*child, &lines[*child]))
        .filter(|(_, line)| matches!(line.tag(), "conc" | "cont"))
    {
        text.push_str(continuation.value().unwrap_or(" "));
    }
    text.replace("  ", " ")
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{fact::Proof, Options};

    fn parse(body: &str) -> Document {
        try_parse(body, Options::default()).unwrap()
    }

    fn try_parse(body: &str, options: Options) -> Result<Document, ParseError> {
        Document::parse(
            &format!("0 HEAD\n1 GEDC\n2 VERS 5.5.1\n{body}0 @F99@ FAM\n0 TRLR\n"),
            options,
        )
    }

    fn xref(id: &str) -> Xref {
        id.parse().unwrap()
    }

    #[test]
    fn structured_name_parts() {
        let doc = parse(
            "0 @I1@ INDI\n1 NAME Dr John /Smith/\n2 NPFX Dr\n2 GIVN John\n2 SURN Smith\n2 NICK Jack\n",
        );
        let name = doc.individual(&xref("i1")).unwrap().name();
        assert_eq!(name.display, "John Smith");
        assert_eq!(name.parts.prefix.as_deref(), Some("Dr"));
        assert_eq!(name.parts.nickname.as_deref(), Some("Jack"));
    }

    #[test]
    fn blank_name_and_surname_get_placeholder() {
        let doc = parse("0 @I1@ INDI\n1 NAME\n2 GIVN Ann\n2 SURN\n");
        let name = doc.individual(&xref("i1")).unwrap().name();
        assert_eq!(name.value, UNKNOWN_NAME);
        assert_eq!(name.parts.surname.as_deref(), Some(UNKNOWN_NAME));
        assert_eq!(name.display, format!("Ann {UNKNOWN_NAME}"));
        assert_eq!(doc.messages().len(), 2);
    }

    #[test]
    fn missing_name_keeps_placeholder() {
        let doc = parse("0 @I1@ INDI\n1 SEX F\n");
        let individual = doc.individual(&xref("i1")).unwrap();
        assert_eq!(individual.names().len(), 1);
        assert_eq!(individual.name().display, UNKNOWN_NAME);
        assert!(doc.messages()[0].contains("has no name"));
    }

    #[test]
    fn event_with_nested_details() {
        let doc = parse(
            "0 @I1@ INDI\n1 NAME A /B/\n1 BIRT\n2 DATE 14 DEC 1895\n2 PLAC York Cottage\n2 NOTE First\n3 CONC  line\n3 CONT\n",
        );
        let birth = doc
            .individual(&xref("i1"))
            .unwrap()
            .facts()
            .best_event(EventKind::Birth)
            .unwrap();
        assert_eq!(birth.date.min_value(), Some("18951214"));
        assert_eq!(birth.place.as_deref(), Some("York Cottage"));
        assert_eq!(birth.note.as_deref(), Some("First line "));
        assert!(!birth.flagged);
    }

    #[test_case("Y"; "yes")]
    #[test_case("unknown"; "unknown")]
    fn flagged_event(value: &str) {
        let doc = parse(&format!("0 @I1@ INDI\n1 NAME A /B/\n1 DEAT {value}\n"));
        let death = &doc.individual(&xref("i1")).unwrap().facts().events(EventKind::Death)[0];
        assert!(death.flagged);
        assert_eq!(death.date, DateValue::Unknown);
        assert_eq!(death.note, None);
    }

    #[test]
    fn inline_note_follows_nested_note() {
        let doc = parse(
            "0 @I1@ INDI\n1 NAME A /B/\n1 BIRT Details in  church records\n2 NOTE Parish\n",
        );
        let birth = &doc.individual(&xref("i1")).unwrap().facts().events(EventKind::Birth)[0];
        assert_eq!(birth.note.as_deref(), Some("Parish Details in church records"));
        assert_eq!(birth.date, DateValue::Unknown);
    }

    #[test]
    fn custom_event_passes_through_unknown_subtags() {
        let doc = parse(
            "0 @I1@ INDI\n1 NAME A /B/\n1 EVEN 118 cM 2%\n2 TYPE DNA\n2 DATE 1 Aug 2021\n2 _MATCH @I7@\n2 _PROOF proven\n",
        );
        let custom = &doc.individual(&xref("i1")).unwrap().facts().custom()[0];
        assert_eq!(custom.tag, CustomTag::Even);
        assert_eq!(custom.value.as_deref(), Some("118 cM 2%"));
        assert_eq!(custom.kind.as_deref(), Some("dna"));
        assert_eq!(
            custom.date.as_ref().and_then(DateValue::min_value),
            Some("20210801")
        );
        assert_eq!(custom.evidence.proof, Proof::Proven);
        assert_eq!(
            custom.extra,
            [("_match".to_string(), Some("@I7@".to_string()))]
        );
    }

    #[test]
    fn best_birth_among_candidates() {
        let doc = parse(
            "0 @I1@ INDI\n1 NAME A /B/\n1 BIRT\n2 DATE 1900\n2 _PROOF disproven\n1 BIRT\n2 DATE 1901\n1 BIRT\n2 DATE 1902\n2 _PROOF proven\n",
        );
        let facts = doc.individual(&xref("i1")).unwrap().facts();
        assert_eq!(facts.best_index(FactKey::Event(EventKind::Birth)), Some(2));
        assert_eq!(doc.repeated_individual_facts()[&xref("i1")], [("birt", 3)]);
    }

    #[test]
    fn all_disproven_has_no_best() {
        let doc = parse(
            "0 @I1@ INDI\n1 NAME A /B/\n1 SEX M\n2 _PROOF disproven\n1 SEX F\n2 _PROOF disproven\n",
        );
        let individual = doc.individual(&xref("i1")).unwrap();
        assert_eq!(individual.attribute(AttributeKind::Sex), None);
        assert_eq!(individual.attributes(AttributeKind::Sex).len(), 2);
    }

    #[test]
    fn repeated_exid_is_fatal() {
        let err = try_parse(
            "0 @I1@ INDI\n1 NAME A /B/\n1 EXID 1\n1 EXID 2\n",
            Options::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Repeated { tag: "exid", .. }));
    }

    #[test]
    fn repeated_husband_is_fatal() {
        let err = try_parse(
            "0 @I1@ INDI\n1 NAME A /B/\n0 @I2@ INDI\n1 NAME C /D/\n0 @F1@ FAM\n1 HUSB @I1@\n1 HUSB @I2@\n",
            Options::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Repeated { tag: "husb", .. }));
    }

    #[test]
    fn bad_date_is_repaired_or_fatal() {
        let body = "0 @I1@ INDI\n1 NAME A /B/\n1 BIRT\n2 DATE 32 JAN 1900\n";
        let doc = parse(body);
        let birth = &doc.individual(&xref("i1")).unwrap().facts().events(EventKind::Birth)[0];
        assert_eq!(birth.date.min_value(), Some("19000101"));
        assert!(doc.messages().iter().any(|m| m.contains("invalid day")));

        let options = Options {
            exit_on_bad_date: true,
            ..Options::default()
        };
        let err = try_parse(body, options).unwrap_err();
        assert!(matches!(err, ParseError::Date(_)));
    }

    #[test]
    fn other_calendars_are_fatal() {
        let err = try_parse(
            "0 @I1@ INDI\n1 NAME A /B/\n1 BIRT\n2 DATE @#DJULIAN@ 1 JAN 1700\n",
            Options::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Date(_)));
    }

    #[test]
    fn reference_without_value_is_skipped() {
        let doc = parse("0 @I1@ INDI\n1 NAME A /B/\n1 FAMS\n");
        assert!(doc.individual(&xref("i1")).unwrap().fams().is_empty());
        assert!(doc.messages().iter().any(|m| m.contains("no usable reference")));
    }

    #[test]
    fn adoption_metadata_becomes_child_link() {
        let doc = parse(
            "0 @I1@ INDI\n1 NAME A /B/\n1 FAMC @F99@\n1 ADOP\n2 FAMC @F99@\n3 ADOP WIFE\n",
        );
        let links = doc.individual(&xref("i1")).unwrap().child_links();
        assert_eq!(
            links,
            [ChildLink {
                family: xref("f99"),
                relationship: Relationship::Adopted,
                role: ParentRole::Wife,
            }]
        );
    }

    #[test]
    fn pedigree_becomes_child_link() {
        let doc = parse("0 @I1@ INDI\n1 NAME A /B/\n1 FAMC @F99@\n2 PEDI foster\n");
        let links = doc.individual(&xref("i1")).unwrap().child_links();
        assert_eq!(links[0].relationship, Relationship::Foster);
        assert_eq!(links[0].role, ParentRole::Both);
    }

    #[test]
    fn facts_remember_their_source_line() {
        let doc = parse("0 @I1@ INDI\n1 NAME A /B/\n1 DEAT\n2 DATE 1950\n");
        let individual = doc.individual(&xref("i1")).unwrap();
        let death_line = doc.lines()[individual.record()]
            .children()
            .iter()
            .copied()
            .find(|id| doc.lines()[*id].tag() == "deat")
            .unwrap();
        let death = individual.facts().event_at(death_line).unwrap();
        assert_eq!(death.date.min_value(), Some("19500101"));
    }

    #[test]
    fn family_events_and_members() {
        let doc = parse(
            "0 @I1@ INDI\n1 NAME A /B/\n0 @I2@ INDI\n1 NAME C /D/\n0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 MARR\n2 DATE 1920\n1 MARR\n2 DATE 1921\n2 _PRIM Y\n",
        );
        let family = doc.family(&xref("f1")).unwrap();
        assert_eq!(family.husband(), Some(&xref("i1")));
        assert_eq!(family.wife(), Some(&xref("i2")));
        assert!(family.children().is_empty());
        assert_eq!(
            family.facts().best_event(EventKind::Marriage).unwrap().date.min_value(),
            Some("19210101")
        );
        assert_eq!(doc.repeated_family_facts()[&xref("f1")], [("marr", 2)]);
    }
}
