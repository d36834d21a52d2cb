//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file ──────────▶ loader.rs (read & deserialize) ─┐
//!                                                        ├─▶ AuditConfig (raw)
//! property map ───────▶ AuditConfig::from_properties ───┘
//!     → validation.rs (ranges, env override, defaults, warnings)
//!     → Settings (effective, immutable)
//!     → owned by one AuditLayer for its whole lifetime
//! ```
//!
//! # Design Decisions
//! - Settings are fixed when the layer is built; changing them means building
//!   another layer
//! - Every key is optional, so an empty file or map resolves to defaults
//! - Semantic problems degrade to defaults instead of failing construction

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AuditConfig;
pub use validation::{BindingTarget, Settings, SinkSettings};
