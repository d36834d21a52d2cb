//! HTTP audit capture middleware.
//!
//! Wraps any tower service over `axum::body::Body`, copies bounded request
//! and response bodies, decides per transaction whether to record it, and
//! ships the resulting record to an output binding and/or a local log file
//! in the background.

pub mod capture;
pub mod config;
pub mod error;
pub mod filter;
pub mod middleware;
pub mod observability;
pub mod record;
pub mod sink;

pub use config::{AuditConfig, Settings};
pub use error::{ConfigError, SinkError};
pub use middleware::{AuditLayer, AuditService};
pub use record::AuditRecord;
