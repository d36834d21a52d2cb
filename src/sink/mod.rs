//! Audit record delivery.
//!
//! # Data Flow
//! ```text
//! AuditRecord ──▶ Arc ──▶ SinkDispatcher::dispatch
//!                             ├─▶ tokio::spawn ─▶ BindingSink (gRPC, 5s deadline)
//!                             └─▶ tokio::spawn ─▶ FileSink (append one line)
//! ```
//!
//! # Design Decisions
//! - One task per sink per record; sinks fail independently
//! - Failures are logged and dropped, never retried, never propagated
//! - Tasks own their data, so they may outlive the request that made them

pub mod binding;
pub mod file;
pub mod proto;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::config::SinkSettings;
use crate::error::SinkResult;
use crate::record::AuditRecord;

pub use binding::BindingSink;
pub use file::FileSink;

/// A delivery target for finished records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Deliver one record. Called from a background task.
    async fn deliver(&self, record: &AuditRecord) -> SinkResult<()>;
}

/// Fans records out to every configured sink.
#[derive(Clone, Default)]
pub struct SinkDispatcher {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl SinkDispatcher {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }

    /// Build the binding and file sinks that `settings` enables.
    pub fn from_settings(settings: &SinkSettings) -> Self {
        let mut sinks: Vec<Arc<dyn AuditSink>> = Vec::new();

        if let Some(target) = &settings.binding {
            tracing::info!(binding = %target.name, port = target.port, "Binding sink enabled");
            sinks.push(Arc::new(BindingSink::new(target.clone())));
        }
        if let Some(path) = &settings.log_file {
            tracing::info!(path = %path.display(), "Log file sink enabled");
            sinks.push(Arc::new(FileSink::new(path.clone())));
        }

        Self { sinks }
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Start one delivery task per sink and return immediately.
    ///
    /// The returned handles may be dropped; the tasks keep running.
    pub fn dispatch(&self, record: AuditRecord) -> Vec<JoinHandle<()>> {
        let record = Arc::new(record);

        self.sinks
            .iter()
            .map(|sink| {
                let sink = Arc::clone(sink);
                let record = Arc::clone(&record);
                tokio::spawn(async move {
                    match sink.deliver(&record).await {
                        Ok(()) => tracing::debug!(
                            sink = sink.name(),
                            method = %record.method,
                            path = %record.path,
                            "Audit record delivered"
                        ),
                        Err(e) => tracing::error!(
                            sink = sink.name(),
                            error = %e,
                            "Audit record delivery failed"
                        ),
                    }
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for SinkDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("SinkDispatcher").field("sinks", &names).finish()
    }
}
