//! Traversals over the family graph.
//!
//! Relatives are found through the effective family lists, so the
//! `only-birth` option applies to every traversal here. Descendant counting
//! and the self-ancestor check are iterative and tolerate cyclic data.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use tracing::instrument;

use crate::domain::{Document, Family, Xref};

/// Descendant statistics for one individual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescendantCounts {
    /// Children across all partnerships.
    pub children: usize,
    /// Children, grandchildren and so on.
    pub descendants: usize,
    /// Depth of the deepest line of descent.
    pub generations: usize,
}

/// The result of counting descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descendants {
    /// Counts per individual visited.
    pub counts: BTreeMap<Xref, DescendantCounts>,
    /// Parent to child edges that lead back to an ancestor. Such a child is
    /// counted once without its own descendants.
    pub cycles: Vec<(Xref, Xref)>,
}

/// Pushes each reference once, in discovery order.
fn push_unique<'a>(found: &mut Vec<Xref>, seen: &mut HashSet<&'a Xref>, xref: &'a Xref) {
    if seen.insert(xref) {
        found.push(xref.clone());
    }
}

impl Document {
    /// The partners of every family in which the individual is a child.
    #[must_use]
    pub fn parents_of(&self, xref: &Xref) -> Vec<Xref> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        for family in self.child_families(xref) {
            for parent in family.partners() {
                push_unique(&mut found, &mut seen, parent);
            }
        }
        found
    }

    /// The children of every family in which the individual is a partner.
    #[must_use]
    pub fn children_of(&self, xref: &Xref) -> Vec<Xref> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        for family in self.partner_families(xref) {
            for child in family.children() {
                push_unique(&mut found, &mut seen, child);
            }
        }
        found
    }

    /// The other partner of every family in which the individual is a
    /// partner.
    #[must_use]
    pub fn partners_of(&self, xref: &Xref) -> Vec<Xref> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        for family in self.partner_families(xref) {
            for partner in family.partners().filter(|partner| *partner != xref) {
                push_unique(&mut found, &mut seen, partner);
            }
        }
        found
    }

    /// Other children of the families in which the individual is a child.
    #[must_use]
    pub fn siblings_of(&self, xref: &Xref) -> Vec<Xref> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        for family in self.child_families(xref) {
            for child in family.children().iter().filter(|child| *child != xref) {
                push_unique(&mut found, &mut seen, child);
            }
        }
        found
    }

    /// Children of a parent's other partnerships.
    ///
    /// Full siblings are not included, even when they also appear in another
    /// family of a parent.
    #[must_use]
    pub fn step_siblings_of(&self, xref: &Xref) -> Vec<Xref> {
        let Some(individual) = self.individual(xref) else {
            return Vec::new();
        };
        let own: HashSet<&Xref> = individual.famc().iter().collect();
        let siblings = self.siblings_of(xref);

        let mut found = Vec::new();
        let mut seen: HashSet<&Xref> = siblings.iter().collect();
        seen.insert(xref);
        let parents = self.parents_of(xref);
        for parent in &parents {
            let other_families = self
                .partner_families(parent)
                .filter(|family| !own.contains(family.xref()));
            for family in other_families {
                for child in family.children() {
                    push_unique(&mut found, &mut seen, child);
                }
            }
        }
        found
    }

    fn child_families<'a>(&'a self, xref: &Xref) -> impl Iterator<Item = &'a Family> {
        self.individual(xref)
            .map(|individual| individual.famc())
            .unwrap_or_default()
            .iter()
            .filter_map(|family| self.family(family))
    }

    fn partner_families<'a>(&'a self, xref: &Xref) -> impl Iterator<Item = &'a Family> {
        self.individual(xref)
            .map(|individual| individual.fams())
            .unwrap_or_default()
            .iter()
            .filter_map(|family| self.family(family))
    }

    /// Children with repeats, in the order they are listed across the
    /// individual's partnerships.
    fn listed_children<'a>(&'a self, xref: &Xref) -> impl Iterator<Item = &'a Xref> {
        self.partner_families(xref)
            .flat_map(|family| family.children().iter())
    }

    /// Counts descendants of every individual.
    #[must_use]
    #[instrument(skip(self))]
    pub fn descendant_counts(&self) -> Descendants {
        let mut result = Descendants::default();
        for xref in self.individuals.keys() {
            self.count_descendants(xref, &mut result);
        }
        result
    }

    /// Counts descendants of one individual and of everyone below them.
    #[must_use]
    pub fn descendant_counts_of(&self, xref: &Xref) -> Descendants {
        let mut result = Descendants::default();
        if self.individuals.contains_key(xref) {
            self.count_descendants(xref, &mut result);
        }
        result
    }

    /// Post-order traversal with an explicit stack. A node is finished once
    /// every child has been finished, so a child still unfinished at that
    /// point is on the current path and closes a cycle.
    fn count_descendants(&self, root: &Xref, result: &mut Descendants) {
        if result.counts.contains_key(root) {
            return;
        }
        let mut on_path: HashSet<Xref> = HashSet::new();
        let mut stack = vec![(root.clone(), false)];

        while let Some((xref, expanded)) = stack.pop() {
            if expanded {
                let mut counts = DescendantCounts::default();
                let mut deepest = 0;
                for child in self.listed_children(&xref) {
                    counts.children += 1;
                    counts.descendants += 1;
                    match result.counts.get(child) {
                        Some(below) => {
                            counts.descendants += below.descendants;
                            deepest = deepest.max(below.generations);
                        }
                        None => result.cycles.push((xref.clone(), child.clone())),
                    }
                }
                if counts.children > 0 {
                    counts.generations = deepest + 1;
                }
                on_path.remove(&xref);
                result.counts.insert(xref, counts);
                continue;
            }

            if result.counts.contains_key(&xref) || on_path.contains(&xref) {
                continue;
            }
            on_path.insert(xref.clone());
            stack.push((xref.clone(), true));
            for child in self.listed_children(&xref) {
                if !result.counts.contains_key(child) && !on_path.contains(child) {
                    stack.push((child.clone(), false));
                }
            }
        }

        if !result.cycles.is_empty() {
            tracing::debug!(cycles = result.cycles.len(), "descendant cycles found");
        }
    }

    /// Groups of individuals that are their own ancestors.
    ///
    /// Each group is a strongly connected component of the child to parent
    /// graph, sorted by identifier. An individual listed as their own parent
    /// forms a group of one.
    #[must_use]
    #[instrument(skip(self))]
    pub fn self_ancestors(&self) -> Vec<Vec<Xref>> {
        let ids: Vec<&Xref> = self.individuals.keys().collect();
        let index: HashMap<&Xref, usize> =
            ids.iter().enumerate().map(|(i, xref)| (*xref, i)).collect();

        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        for (child, xref) in ids.iter().enumerate() {
            graph.add_node(child);
            for parent in self.parents_of(xref) {
                if let Some(&parent) = index.get(&parent) {
                    graph.add_edge(child, parent, ());
                }
            }
        }

        let mut loops: Vec<Vec<Xref>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|node| graph.contains_edge(*node, *node))
            })
            .map(|component| {
                let mut members: Vec<Xref> =
                    component.into_iter().map(|node| ids[node].clone()).collect();
                members.sort();
                members
            })
            .collect();
        loops.sort();
        loops
    }

    /// Individuals with a tag that has more than one entry, and those tags
    /// with their counts.
    #[must_use]
    pub fn repeated_individual_facts(&self) -> BTreeMap<Xref, Vec<(&'static str, usize)>> {
        self.individuals
            .iter()
            .map(|(xref, individual)| (xref.clone(), individual.repeated_facts()))
            .filter(|(_, repeated)| !repeated.is_empty())
            .collect()
    }

    /// Families with an event that has more than one entry, and those events
    /// with their counts.
    #[must_use]
    pub fn repeated_family_facts(&self) -> BTreeMap<Xref, Vec<(&'static str, usize)>> {
        self.families
            .iter()
            .map(|(xref, family)| {
                let repeated: Vec<_> = family
                    .facts()
                    .repeated_events()
                    .into_iter()
                    .map(|(kind, count)| (kind.tag(), count))
                    .collect();
                (xref.clone(), repeated)
            })
            .filter(|(_, repeated)| !repeated.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Options;

    // fred + jane have ann and bob; fred + mary have cal; ann + dan have eve
    const FAMILY_TREE: &str = "0 HEAD\n1 GEDC\n2 VERS 5.5.1\n\
        0 @I1@ INDI\n1 NAME Fred /A/\n1 FAMS @F1@\n1 FAMS @F2@\n\
        0 @I2@ INDI\n1 NAME Jane /B/\n1 FAMS @F1@\n\
        0 @I3@ INDI\n1 NAME Mary /C/\n1 FAMS @F2@\n\
        0 @I4@ INDI\n1 NAME Ann /A/\n1 FAMC @F1@\n1 FAMS @F3@\n\
        0 @I5@ INDI\n1 NAME Bob /A/\n1 FAMC @F1@\n\
        0 @I6@ INDI\n1 NAME Cal /A/\n1 FAMC @F2@\n\
        0 @I7@ INDI\n1 NAME Dan /D/\n1 FAMS @F3@\n\
        0 @I8@ INDI\n1 NAME Eve /D/\n1 FAMC @F3@\n\
        0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I4@\n1 CHIL @I5@\n\
        0 @F2@ FAM\n1 HUSB @I1@\n1 WIFE @I3@\n1 CHIL @I6@\n\
        0 @F3@ FAM\n1 HUSB @I7@\n1 WIFE @I4@\n1 CHIL @I8@\n\
        0 TRLR\n";

    fn xref(id: &str) -> Xref {
        id.parse().unwrap()
    }

    fn xrefs(ids: &[&str]) -> Vec<Xref> {
        ids.iter().map(|id| xref(id)).collect()
    }

    fn document() -> Document {
        Document::parse(FAMILY_TREE, Options::default()).unwrap()
    }

    #[test]
    fn relatives() {
        let doc = document();
        assert_eq!(doc.parents_of(&xref("i4")), xrefs(&["i1", "i2"]));
        assert_eq!(doc.children_of(&xref("i1")), xrefs(&["i4", "i5", "i6"]));
        assert_eq!(doc.partners_of(&xref("i1")), xrefs(&["i2", "i3"]));
        assert_eq!(doc.siblings_of(&xref("i4")), xrefs(&["i5"]));
        assert_eq!(doc.step_siblings_of(&xref("i4")), xrefs(&["i6"]));
        assert_eq!(doc.step_siblings_of(&xref("i6")), xrefs(&["i4", "i5"]));
        assert!(doc.parents_of(&xref("i404")).is_empty());
    }

    #[test]
    fn descendant_counts() {
        let doc = document();
        let result = doc.descendant_counts();

        assert_eq!(
            result.counts[&xref("i1")],
            DescendantCounts {
                children: 3,
                descendants: 4,
                generations: 2,
            }
        );
        assert_eq!(result.counts[&xref("i7")].generations, 1);
        assert_eq!(result.counts[&xref("i8")], DescendantCounts::default());
        assert!(result.cycles.is_empty());
        assert_eq!(result.counts.len(), 8);

        let one = doc.descendant_counts_of(&xref("i4"));
        assert_eq!(one.counts.len(), 2);
        assert_eq!(one.counts[&xref("i4")].descendants, 1);
    }

    const LOOP: &str = "0 HEAD\n1 GEDC\n2 VERS 5.5.1\n\
        0 @I1@ INDI\n1 NAME Root /X/\n1 FAMS @F1@\n1 FAMC @F2@\n\
        0 @I2@ INDI\n1 NAME Child /X/\n1 FAMC @F1@\n1 FAMS @F2@\n\
        0 @I3@ INDI\n1 NAME Own /Parent/\n1 FAMS @F3@\n1 FAMC @F3@\n\
        0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n\
        0 @F2@ FAM\n1 HUSB @I2@\n1 CHIL @I1@\n\
        0 @F3@ FAM\n1 HUSB @I3@\n1 CHIL @I3@\n\
        0 TRLR\n";

    #[test]
    fn cycles_are_reported_not_followed() {
        let doc = Document::parse(LOOP, Options::default()).unwrap();
        let result = doc.descendant_counts();

        assert_eq!(result.cycles.len(), 2);
        assert!(result.cycles.contains(&(xref("i2"), xref("i1"))));
        assert!(result.cycles.contains(&(xref("i3"), xref("i3"))));
        assert_eq!(
            result.counts[&xref("i1")],
            DescendantCounts {
                children: 1,
                descendants: 2,
                generations: 2,
            }
        );
    }

    #[test]
    fn self_ancestors() {
        let doc = Document::parse(LOOP, Options::default()).unwrap();
        assert_eq!(
            doc.self_ancestors(),
            [xrefs(&["i1", "i2"]), xrefs(&["i3"])]
        );
        assert!(document().self_ancestors().is_empty());
    }
}
