//! Append-only audit log file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::SinkResult;
use crate::record::{AuditRecord, Payload};
use crate::sink::AuditSink;

/// Stand-in for `|` inside field values.
pub const PIPE_PLACEHOLDER: char = '｜';

/// Writes one pipe-delimited line per record:
/// `timestamp|code|action|request|response`.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn deliver(&self, record: &AuditRecord) -> SinkResult<()> {
        let line = format_line(record);
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || append_line(&path, &line)).await??;
        Ok(())
    }
}

/// Render `record` as a single newline-terminated log line.
pub fn format_line(record: &AuditRecord) -> String {
    let body = |payload: &Option<Payload>| {
        payload
            .as_ref()
            .map(Payload::to_compact_string)
            .unwrap_or_default()
    };

    let fields = [
        sanitize(&record.timestamp),
        sanitize(record.classification.code()),
        sanitize(&record.action_code),
        sanitize(&body(&record.request_body)),
        sanitize(&body(&record.response_body)),
    ];

    let mut line = fields.join("|");
    line.push('\n');
    line
}

/// Keep a value on one line and free of the field separator.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            '|' => PIPE_PLACEHOLDER,
            other => other,
        })
        .collect()
}

/// Open in append mode (creating with 0644) and write the line in one call.
fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path)?;
    file.write_all(line.as_bytes())
}
