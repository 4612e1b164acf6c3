//! Line tokenizing and the arena the line hierarchy lives in.

use std::ops::Index;

/// Handle to a line stored in a [`LineArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(usize);

/// A single tokenized GEDCOM line.
///
/// `1 NAME John /Smith/` has level `1`, tag `name` and value `John /Smith/`.
/// The tag is lowercased; the value is kept verbatim, including any embedded
/// spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    raw: String,
    level: u8,
    tag: String,
    value: Option<String>,
    children: Vec<LineId>,
}

/// Error returned when a line cannot be tokenized.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenizeError {
    /// The line does not start with a decimal level number.
    #[error("line does not start with a level number: '{0}'")]
    InvalidLevel(String),

    /// The level number is not followed by a tag.
    #[error("line has no tag: '{0}'")]
    MissingTag(String),
}

impl LineRecord {
    /// Splits a stripped, tab-normalized line into level, tag and value.
    ///
    /// # Errors
    ///
    /// Returns an error if the first token is not a number or there is no
    /// second token.
    pub fn tokenize(raw: &str) -> Result<Self, TokenizeError> {
        let mut parts = raw.splitn(3, ' ');
        let level = parts
            .next()
            .and_then(|level| level.parse().ok())
            .ok_or_else(|| TokenizeError::InvalidLevel(raw.to_string()))?;
        let tag = parts
            .next()
            .filter(|tag| !tag.is_empty())
            .ok_or_else(|| TokenizeError::MissingTag(raw.to_string()))?
            .to_lowercase();
        let value = parts.next().map(str::to_string);

        Ok(Self {
            raw: raw.to_string(),
            level,
            tag,
            value,
            children: Vec::new(),
        })
    }

    /// The line exactly as read, after stripping and tab normalization.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The nesting level.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// The lowercased tag. For a level-0 record this is the cross-reference,
    /// e.g. `@i1@`.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The text after the tag, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The value, with blank values treated as absent.
    #[must_use]
    pub fn non_blank_value(&self) -> Option<&str> {
        self.value().filter(|value| !value.trim().is_empty())
    }

    /// Nested lines, in file order.
    #[must_use]
    pub fn children(&self) -> &[LineId] {
        &self.children
    }

    /// The original tag token, with its case preserved.
    #[must_use]
    pub fn raw_tag(&self) -> &str {
        self.raw.split(' ').nth(1).unwrap_or_default()
    }
}

/// Owns every line of a document. Lines refer to their children by
/// [`LineId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineArena {
    lines: Vec<LineRecord>,
}

impl LineArena {
    /// Stores a line and returns its handle.
    pub fn push(&mut self, line: LineRecord) -> LineId {
        self.lines.push(line);
        LineId(self.lines.len() - 1)
    }

    /// Appends `child` to the children of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not issued by this arena.
    pub fn attach(&mut self, parent: LineId, child: LineId) {
        self.lines[parent.0].children.push(child);
    }

    /// Looks up a line.
    #[must_use]
    pub fn get(&self, id: LineId) -> Option<&LineRecord> {
        self.lines.get(id.0)
    }

    /// The number of stored lines.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The children of `parent` with the given tag.
    pub fn children_tagged<'a>(
        &'a self,
        parent: LineId,
        tag: &'a str,
    ) -> impl Iterator<Item = (LineId, &'a LineRecord)> + 'a {
        self[parent]
            .children
            .iter()
            .map(|id| (*id, &self[*id]))
            .filter(move |(_, line)| line.tag == tag)
    }

    /// `root` followed by all of its descendants, depth first in file order.
    #[must_use]
    pub fn subtree(&self, root: LineId) -> Subtree<'_> {
        Subtree {
            arena: self,
            stack: vec![root],
        }
    }
}

impl Index<LineId> for LineArena {
    type Output = LineRecord;

    fn index(&self, id: LineId) -> &Self::Output {
        &self.lines[id.0]
    }
}

/// Depth-first iterator over a line and its descendants.
#[derive(Debug)]
pub struct Subtree<'a> {
    arena: &'a LineArena,
    stack: Vec<LineId>,
}

impl<'a> Iterator for Subtree<'a> {
    type Item = (LineId, &'a LineRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let line = &self.arena[id];
        self.stack.extend(line.children.iter().rev().copied());
        Some((id, line))
    }
}
