//! Configuration validation.
//!
//! # Responsibilities
//! - Turn a raw [`AuditConfig`] into the effective, immutable [`Settings`]
//! - Validate value ranges (body size > 0, port is a valid u16)
//! - Apply the environment override for the binding port
//! - Pick the classification variant (function code or module code)
//!
//! # Design Decisions
//! - Never fails: every problem is a `warn!` plus a safe default
//! - Regex compilation is left to the filter, which owns the pattern sets
//! - The environment is passed in, keeping resolution a pure function

use std::path::PathBuf;
use std::time::Duration;

use crate::config::schema::{
    AuditConfig, DEFAULT_ACTION_HEADER, DEFAULT_FUNCTION_HEADER, DEFAULT_GRPC_PORT,
    DEFAULT_MAX_BODY_SIZE, DEFAULT_MODULE_HEADER,
};
use crate::record::ClassificationKind;

/// Environment variable overriding the binding endpoint port.
pub const GRPC_PORT_ENV: &str = "DAPR_GRPC_PORT";

/// Deadline for one binding invocation.
pub const BINDING_TIMEOUT: Duration = Duration::from_secs(5);

/// Effective settings derived from an [`AuditConfig`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_request: bool,
    pub log_response: bool,
    pub max_body_size: usize,
    pub classification: ClassificationKind,
    pub classification_header: String,
    pub action_header: String,
    pub log_methods: Vec<String>,
    pub include_headers: Vec<String>,
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub sinks: SinkSettings,
}

/// Where finished records go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSettings {
    pub binding: Option<BindingTarget>,
    pub log_file: Option<PathBuf>,
}

/// Binding invocation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTarget {
    pub name: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Settings {
    /// Resolve settings, reading the port override from the process
    /// environment.
    pub fn resolve(config: &AuditConfig) -> Self {
        Self::resolve_with_env(config, std::env::var(GRPC_PORT_ENV).ok())
    }

    /// Resolve settings with an explicit value for the port override.
    pub fn resolve_with_env(config: &AuditConfig, env_port: Option<String>) -> Self {
        let max_body_size = resolve_max_body_size(config.max_body_size);

        let (classification, classification_header) =
            match non_empty(config.module_header.as_deref()) {
                Some(header) => (ClassificationKind::Module, header.to_string()),
                None => (
                    ClassificationKind::Function,
                    non_empty(config.function_header.as_deref())
                        .unwrap_or(default_classification_header(ClassificationKind::Function))
                        .to_string(),
                ),
            };

        let action_header = non_empty(config.action_header.as_deref())
            .unwrap_or(DEFAULT_ACTION_HEADER)
            .to_string();

        let log_methods: Vec<String> = config
            .log_methods
            .iter()
            .map(|m| m.trim().to_ascii_uppercase())
            .filter(|m| !m.is_empty())
            .collect();
        if log_methods.is_empty() {
            tracing::warn!("log_methods is empty, no request will be recorded");
        }

        let binding = non_empty(Some(config.binding_name.as_str())).map(|name| BindingTarget {
            name: name.to_string(),
            port: resolve_port(env_port.as_deref(), config.dapr_grpc_port.as_deref()),
            timeout: BINDING_TIMEOUT,
        });

        let log_file = non_empty(config.log_file.as_deref()).map(PathBuf::from);

        Self {
            log_request: config.log_request,
            log_response: config.log_response,
            max_body_size,
            classification,
            classification_header,
            action_header,
            log_methods,
            include_headers: trimmed(&config.include_headers),
            include_paths: trimmed(&config.include_paths),
            exclude_paths: trimmed(&config.exclude_paths),
            sinks: SinkSettings { binding, log_file },
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve_with_env(&AuditConfig::default(), None)
    }
}

/// Default header name for a classification variant.
pub fn default_classification_header(kind: ClassificationKind) -> &'static str {
    match kind {
        ClassificationKind::Function => DEFAULT_FUNCTION_HEADER,
        ClassificationKind::Module => DEFAULT_MODULE_HEADER,
    }
}

fn resolve_max_body_size(raw: i64) -> usize {
    match usize::try_from(raw) {
        Ok(size) if size > 0 => size,
        _ => {
            tracing::warn!(
                value = raw,
                "Invalid maxBodySize value, using default 1MB"
            );
            DEFAULT_MAX_BODY_SIZE
        }
    }
}

/// Environment first, then configuration, then the default.
fn resolve_port(env: Option<&str>, configured: Option<&str>) -> u16 {
    let Some(raw) = non_empty(env).or_else(|| non_empty(configured)) else {
        return DEFAULT_GRPC_PORT;
    };

    match raw.parse::<u16>() {
        Ok(port) if port > 0 => port,
        _ => {
            tracing::warn!(value = %raw, "Invalid binding port, using default {}", DEFAULT_GRPC_PORT);
            DEFAULT_GRPC_PORT
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn trimmed(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
