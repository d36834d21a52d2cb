//! Record assembly.

use std::collections::BTreeMap;

use axum::http::HeaderMap;
use chrono::{Local, SecondsFormat};
use serde_json::json;

use crate::capture::CapturedBody;
use crate::record::types::{AuditRecord, Classification, ClassificationKind, HeaderCapture, Payload};

/// Everything observed about one eligible transaction.
#[derive(Debug, Default)]
pub struct Transaction {
    pub method: String,
    pub path: String,
    pub classification_code: String,
    pub action_code: String,
    /// `None` when request capture is disabled.
    pub request_body: Option<CapturedBody>,
    /// `None` when response capture is disabled.
    pub response_body: Option<CapturedBody>,
    pub headers: HeaderMap,
}

/// Builds [`AuditRecord`]s with a fixed naming variant and header selection.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    classification: ClassificationKind,
    include_headers: Vec<String>,
}

impl RecordBuilder {
    pub fn new(classification: ClassificationKind, include_headers: Vec<String>) -> Self {
        Self {
            classification,
            include_headers,
        }
    }

    /// Build a record stamped with the current local time.
    pub fn build(&self, tx: Transaction) -> AuditRecord {
        let timestamp = Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);
        self.build_at(tx, timestamp)
    }

    pub fn build_at(&self, tx: Transaction, timestamp: String) -> AuditRecord {
        AuditRecord {
            timestamp,
            classification: Classification::new(self.classification, tx.classification_code),
            action_code: tx.action_code,
            request_body: tx.request_body.as_ref().map(body_payload),
            response_body: tx.response_body.as_ref().map(body_payload),
            method: tx.method,
            path: tx.path,
            headers: self.capture_headers(&tx.headers),
        }
    }

    fn capture_headers(&self, headers: &HeaderMap) -> Option<BTreeMap<String, HeaderCapture>> {
        let mut captured = BTreeMap::new();

        for name in &self.include_headers {
            let mut values: Vec<Payload> = headers
                .get_all(name.as_str())
                .iter()
                .map(|v| Payload::parse(v.as_bytes()))
                .collect();

            let entry = match values.len() {
                0 => continue,
                1 => HeaderCapture::Single(values.remove(0)),
                _ => HeaderCapture::Multiple(values),
            };
            captured.insert(name.clone(), entry);
        }

        (!captured.is_empty()).then_some(captured)
    }
}

fn body_payload(body: &CapturedBody) -> Payload {
    match &body.read_error {
        Some(error) => Payload::Structured(json!({ "error": error })),
        None => Payload::parse(&body.bytes),
    }
}
