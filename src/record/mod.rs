//! Audit record model and builder.
//!
//! A record is built once per eligible transaction, wrapped in an `Arc`, and
//! handed to every sink. Sinks serialize it independently.

pub mod builder;
pub mod types;

pub use builder::{RecordBuilder, Transaction};
pub use types::{AuditRecord, Classification, ClassificationKind, HeaderCapture, Payload};
