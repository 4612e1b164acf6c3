//! GEDCOM genealogy records
//!
//! Reads the line-tagged GEDCOM text format into a validated, in-memory model
//! of individuals and families. Dates are normalized into comparable values,
//! competing facts are ranked so that a "best" candidate can be selected, and
//! dangling cross-references are pruned. The model can be re-emitted verbatim
//! or with dates redacted for living people, and searched with a small query
//! facility.

pub mod domain;
pub use domain::{
    DateValue, Document, Family, Individual, Options, PrivacyLevel, PrivacyPolicy, Query, Xref,
};

/// Reading GEDCOM text into a [`Document`] and writing it back out.
pub mod storage;
pub use storage::ParseError;
