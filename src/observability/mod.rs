//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! capture / filter / sink / middleware
//!     → tracing macros (structured fields)
//!     → subscriber installed by logging::init (binaries only)
//! ```

pub mod logging;
