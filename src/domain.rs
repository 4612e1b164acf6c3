//! Domain models for genealogy records.
//!
//! This module contains the normalized model produced by the reader:
//! cross-references, dates, facts, individuals and families, together with
//! the passes that run over a parsed [`Document`] (privacy levels, lineage
//! traversals and queries).

mod config;
pub use config::{Options, OptionsError};

/// Warning sink shared by all parsing passes.
pub mod diagnostics;
pub use diagnostics::Messages;

/// Cross-reference identifiers.
pub mod xref;
pub use xref::{Error as XrefError, Xref};

/// Free-form date normalization.
pub mod date;
pub use date::{DateBound, DateError, DateModifier, DateValue, KnownDate};

/// Typed facts attached to individuals and families.
pub mod fact;
pub use fact::{
    AttributeFact, AttributeKind, CustomFact, CustomTag, EventFact, EventKind, Evidence, FactKey,
    FactRef, Facts, Proof,
};

/// Personal names and their escaped renditions.
pub mod name;
pub use name::{NameFact, NameParts, UNKNOWN_NAME};

mod individual;
pub use individual::{ChildLink, Individual, ParentRole, Relationship, Summary};

mod family;
pub use family::{ChildRelation, Family};

mod document;
pub use document::{Document, Record, Section};

/// Redaction levels for re-export.
pub mod privacy;
pub use privacy::{PrivacyLevel, PrivacyPolicy};

/// Family graph traversals and repeated-fact reports.
pub mod lineage;
pub use lineage::{DescendantCounts, Descendants};

/// Individual search.
pub mod query;
pub use query::{Field, Operator, Query, QueryError};
