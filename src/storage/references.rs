//! Cross-reference validation and child relationship derivation.

use tracing::instrument;

use crate::{
    domain::{diagnostics::Messages, ChildRelation, Document, Options, Xref},
    storage::ParseError,
};

impl Document {
    /// Removes references to individuals and families that do not exist.
    ///
    /// Every removal is recorded as a warning. Running the pass again on a
    /// validated document removes nothing. Returns the number of references
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingFamily`] or
    /// [`ParseError::MissingIndividual`] for the first dangling reference when
    /// the corresponding `exit-on-missing-*` option is set.
    #[instrument(skip(self))]
    pub fn validate_references(&mut self) -> Result<usize, ParseError> {
        let Self {
            individuals,
            families,
            messages,
            options,
            ..
        } = self;
        let mut removed = 0;

        for individual in individuals.values_mut() {
            let owner = individual.xref.clone();
            let mut report = |tag: &'static str, family: &Xref| {
                missing_family(messages, options, &owner, tag, family)
            };
            let exists = |family: &Xref| families.contains_key(family);

            removed += prune(&mut individual.fams, exists, |f| report("fams", f))?;
            removed += prune(&mut individual.all_famc, exists, |f| report("famc", f))?;
            removed += prune(&mut individual.birth_famc, exists, |f| report("famc", f))?;
            removed += prune(&mut individual.famc, exists, |f| report("famc", f))?;

            let (kept, dangling): (Vec<_>, Vec<_>) = std::mem::take(&mut individual.child_links)
                .into_iter()
                .partition(|link| exists(&link.family));
            individual.child_links = kept;
            for link in &dangling {
                report("famc", &link.family)?;
            }
            removed += dangling.len();
        }

        for family in families.values_mut() {
            let owner = family.xref.clone();
            let mut report = |tag: &'static str, individual: &Xref| {
                missing_individual(messages, options, &owner, tag, individual)
            };
            let exists = |individual: &Xref| individuals.contains_key(individual);

            for (tag, slot) in [("husb", &mut family.husband), ("wife", &mut family.wife)] {
                if let Some(partner) = slot.take_if(|partner| !exists(&*partner)) {
                    report(tag, &partner)?;
                    removed += 1;
                }
            }
            removed += prune(&mut family.all_children, exists, |i| report("chil", i))?;
            removed += prune(&mut family.birth_children, exists, |i| report("chil", i))?;
            removed += prune(&mut family.children, exists, |i| report("chil", i))?;
            family.child_relations.retain(|child, _| exists(child));
        }

        Ok(removed)
    }

    /// Cross-stores child links on their families and fills the birth and
    /// effective membership lists.
    pub(crate) fn derive_relations(&mut self) {
        let only_birth = self.options.only_birth;

        for family in self.families.values_mut() {
            family.child_relations.clear();
        }

        for individual in self.individuals.values_mut() {
            for link in &individual.child_links {
                if let Some(family) = self.families.get_mut(&link.family) {
                    family.child_relations.insert(
                        individual.xref.clone(),
                        ChildRelation {
                            husband: individual.relationship_to(&link.family, true),
                            wife: individual.relationship_to(&link.family, false),
                        },
                    );
                }
            }

            let birth: Vec<Xref> = individual
                .all_famc
                .iter()
                .filter(|family| {
                    individual.relationship_to(family, true).is_birth()
                        && individual.relationship_to(family, false).is_birth()
                })
                .cloned()
                .collect();
            individual.famc = if only_birth {
                birth.clone()
            } else {
                individual.all_famc.clone()
            };
            individual.birth_famc = birth;
        }

        for family in self.families.values_mut() {
            let birth: Vec<Xref> = family
                .all_children
                .iter()
                .filter(|child| family.child_relation(child).is_birth())
                .cloned()
                .collect();
            family.children = if only_birth {
                birth.clone()
            } else {
                family.all_children.clone()
            };
            family.birth_children = birth;
        }
    }
}

/// Drops the entries that do not exist, reporting each in turn.
fn prune<E, R>(list: &mut Vec<Xref>, exists: E, mut report: R) -> Result<usize, ParseError>
where
    E: Fn(&Xref) -> bool,
    R: FnMut(&Xref) -> Result<(), ParseError>,
{
    let (kept, dangling): (Vec<_>, Vec<_>) =
        std::mem::take(list).into_iter().partition(|x| exists(x));
    *list = kept;
    for reference in &dangling {
        report(reference)?;
    }
    Ok(dangling.len())
}

fn missing_family(
    messages: &mut Messages,
    options: &Options,
    individual: &Xref,
    tag: &'static str,
    family: &Xref,
) -> Result<(), ParseError> {
    if options.exit_on_missing_families {
        return Err(ParseError::MissingFamily {
            individual: individual.clone(),
            tag,
            family: family.clone(),
        });
    }
    messages.warn(format!(
        "individual {individual} lists {family} in {tag} but it was not found, removing reference"
    ));
    Ok(())
}

fn missing_individual(
    messages: &mut Messages,
    options: &Options,
    family: &Xref,
    tag: &'static str,
    individual: &Xref,
) -> Result<(), ParseError> {
    if options.exit_on_missing_individuals {
        return Err(ParseError::MissingIndividual {
            family: family.clone(),
            tag,
            individual: individual.clone(),
        });
    }
    messages.warn(format!(
        "family {family} lists {tag} {individual} but it was not found, removing reference"
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Relationship;

    const PEOPLE: &str = "0 @I1@ INDI\n1 NAME Fred /Doe/\n1 FAMS @F1@\n1 FAMS @F404@\n\
        0 @I2@ INDI\n1 NAME Jane /Doe/\n1 FAMS @F1@\n\
        0 @I3@ INDI\n1 NAME Born /Doe/\n1 FAMC @F1@\n\
        0 @I4@ INDI\n1 NAME Adopted /Doe/\n1 FAMC @F1@\n1 ADOP\n2 FAMC @F1@\n3 ADOP BOTH\n\
        0 @I5@ INDI\n1 NAME Step /Doe/\n1 FAMC @F1@\n1 BIRT\n2 FAMC @F1@\n1 ADOP\n2 FAMC @F1@\n3 ADOP HUSB\n\
        0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n1 CHIL @I4@\n1 CHIL @I5@\n1 CHIL @I404@\n";

    fn parse(options: Options) -> Result<Document, ParseError> {
        Document::parse(
            &format!("0 HEAD\n1 GEDC\n2 VERS 5.5.1\n{PEOPLE}0 TRLR\n"),
            options,
        )
    }

    fn xref(id: &str) -> Xref {
        id.parse().unwrap()
    }

    #[test]
    fn dangling_references_are_pruned_with_warnings() {
        let doc = parse(Options::default()).unwrap();

        assert_eq!(doc.individual(&xref("i1")).unwrap().fams(), [xref("f1")]);
        assert_eq!(
            doc.family(&xref("f1")).unwrap().all_children(),
            [xref("i3"), xref("i4"), xref("i5")]
        );
        assert_eq!(doc.messages().len(), 2);
        assert!(doc.messages()[0].contains("f404"));
        assert!(doc.messages()[1].contains("i404"));
    }

    #[test]
    fn validation_is_idempotent() {
        let mut doc = parse(Options::default()).unwrap();
        let warnings = doc.messages().len();

        assert_eq!(doc.validate_references().unwrap(), 0);
        assert_eq!(doc.messages().len(), warnings);
    }

    #[test]
    fn dangling_references_can_be_fatal() {
        let options = Options {
            exit_on_missing_families: true,
            ..Options::default()
        };
        let err = parse(options).unwrap_err();
        assert!(matches!(err, ParseError::MissingFamily { tag: "fams", .. }));

        let options = Options {
            exit_on_missing_individuals: true,
            ..Options::default()
        };
        let err = parse(options).unwrap_err();
        assert!(matches!(err, ParseError::MissingIndividual { tag: "chil", .. }));
    }

    #[test]
    fn child_relations_are_cross_stored() {
        let doc = parse(Options::default()).unwrap();
        let family = doc.family(&xref("f1")).unwrap();

        assert!(family.child_relation(&xref("i3")).is_birth());
        assert_eq!(
            family.child_relation(&xref("i4")),
            ChildRelation {
                husband: Relationship::Adopted,
                wife: Relationship::Adopted,
            }
        );
        assert_eq!(
            family.child_relation(&xref("i5")),
            ChildRelation {
                husband: Relationship::Adopted,
                wife: Relationship::Birth,
            }
        );
        assert_eq!(family.birth_children(), [xref("i3")]);
        assert_eq!(family.children(), family.all_children());

        let step = doc.individual(&xref("i5")).unwrap();
        assert_eq!(step.all_famc(), [xref("f1")]);
        assert!(step.birth_famc().is_empty());
        assert_eq!(step.famc(), [xref("f1")]);
    }

    #[test]
    fn only_birth_restricts_effective_lists() {
        let options = Options {
            only_birth: true,
            ..Options::default()
        };
        let doc = parse(options).unwrap();

        assert_eq!(doc.family(&xref("f1")).unwrap().children(), [xref("i3")]);
        assert!(doc.individual(&xref("i4")).unwrap().famc().is_empty());
        assert_eq!(doc.individual(&xref("i3")).unwrap().famc(), [xref("f1")]);
    }
}
