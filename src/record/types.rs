//! Audit record types.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Which naming variant the classification code uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassificationKind {
    /// `X-Function-Code` header, `functionCode` field.
    #[default]
    Function,
    /// `X-Module-Code` header, `moduleCode` field.
    Module,
}

/// Classification code tagged with its variant; serializes as a single
/// `functionCode` or `moduleCode` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Classification {
    #[serde(rename = "functionCode")]
    Function(String),
    #[serde(rename = "moduleCode")]
    Module(String),
}

impl Classification {
    pub fn new(kind: ClassificationKind, code: impl Into<String>) -> Self {
        match kind {
            ClassificationKind::Function => Classification::Function(code.into()),
            ClassificationKind::Module => Classification::Module(code.into()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Classification::Function(code) | Classification::Module(code) => code,
        }
    }
}

/// Captured text, parsed as JSON when possible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Structured(JsonValue),
    Raw(String),
}

impl Payload {
    /// Parse `bytes` as JSON, falling back to the (lossily decoded) text.
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<JsonValue>(bytes) {
            Ok(value) => Payload::Structured(value),
            Err(_) => Payload::Raw(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Text used by line-oriented sinks: the compact JSON form.
    pub fn to_compact_string(&self) -> String {
        // Serializing a JSON value or a string cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Value of one captured request header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeaderCapture {
    Single(Payload),
    Multiple(Vec<Payload>),
}

/// One audited transaction, built once and never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// RFC 3339 timestamp taken when the record was built.
    pub timestamp: String,

    #[serde(flatten)]
    pub classification: Classification,

    pub action_code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Payload>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Payload>,

    pub method: String,

    /// Path and query as received.
    pub path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, HeaderCapture>>,
}
