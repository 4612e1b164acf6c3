//! Reading and writing GEDCOM text.
//!
//! The [`line`] module tokenizes individual lines into an arena. The reader
//! builds the line hierarchy and section list, after which the record parsers
//! and the cross-reference validator derive the normalized model. The writer
//! reproduces the original lines, optionally redacted.

pub mod line;
mod reader;
mod records;
mod references;
mod writer;

pub use line::{LineArena, LineId, LineRecord, TokenizeError};
pub use reader::{ParseError, SUPPORTED_VERSIONS};
