//! Configuration schema definitions.
//!
//! This module defines the raw configuration accepted by the audit layer.
//! Values are taken as written; semantic checks and defaults that depend on
//! the environment live in [`crate::config::validation`].

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Default capture limit for request and response bodies (1 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default port of the binding endpoint.
pub const DEFAULT_GRPC_PORT: u16 = 50001;

/// Default classification header for the function-code variant.
pub const DEFAULT_FUNCTION_HEADER: &str = "X-Function-Code";

/// Default classification header for the module-code variant.
pub const DEFAULT_MODULE_HEADER: &str = "X-Module-Code";

/// Default action header.
pub const DEFAULT_ACTION_HEADER: &str = "X-Action-Code";

/// Methods recorded when nothing else is configured.
pub const DEFAULT_LOG_METHODS: &str = "POST,PUT,DELETE";

/// Root configuration for the audit layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Path of the pipe-delimited audit log. `None` or empty disables it.
    pub log_file: Option<String>,

    /// Name of the output binding. Empty disables the binding sink.
    pub binding_name: String,

    /// Port of the local binding endpoint, as written. The
    /// `DAPR_GRPC_PORT` environment variable takes precedence.
    pub dapr_grpc_port: Option<String>,

    /// Capture request bodies.
    pub log_request: bool,

    /// Capture response bodies.
    pub log_response: bool,

    /// Byte cap applied to each captured body. Non-positive values fall
    /// back to [`DEFAULT_MAX_BODY_SIZE`].
    pub max_body_size: i64,

    /// Classification header (function-code variant).
    pub function_header: Option<String>,

    /// Classification header (module-code variant). Selects the module
    /// variant when set.
    pub module_header: Option<String>,

    /// Action header.
    pub action_header: Option<String>,

    /// HTTP methods that may produce a record.
    #[serde(deserialize_with = "string_list")]
    pub log_methods: Vec<String>,

    /// Request headers copied into the record.
    #[serde(deserialize_with = "string_list")]
    pub include_headers: Vec<String>,

    /// Regular expressions a path must match (any) to be recorded.
    #[serde(deserialize_with = "string_list")]
    pub include_paths: Vec<String>,

    /// Regular expressions that exclude a path from recording.
    #[serde(deserialize_with = "string_list")]
    pub exclude_paths: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            binding_name: String::new(),
            dapr_grpc_port: None,
            log_request: true,
            log_response: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE as i64,
            function_header: None,
            module_header: None,
            action_header: None,
            log_methods: split_list(DEFAULT_LOG_METHODS),
            include_headers: Vec::new(),
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
        }
    }
}

impl AuditConfig {
    /// Build a configuration from a flat string property map.
    ///
    /// Keys follow the component-metadata naming (`logFile`, `bindingName`,
    /// `maxBodySize`, ...). Missing or empty keys keep their defaults and
    /// unparsable values are reported and replaced by defaults, so this
    /// never fails.
    pub fn from_properties(props: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            props
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut config = Self {
            log_file: get("logFile"),
            binding_name: get("bindingName").unwrap_or_default(),
            dapr_grpc_port: get("daprGRPCPort"),
            function_header: get("functionHeader"),
            module_header: get("moduleHeader"),
            action_header: get("actionHeader"),
            ..Self::default()
        };

        // Only the literal "false" switches capture off.
        config.log_request = props.get("logRequest").map(String::as_str) != Some("false");
        config.log_response = props.get("logResponse").map(String::as_str) != Some("false");

        if let Some(size) = get("maxBodySize") {
            match size.parse::<i64>() {
                Ok(parsed) => config.max_body_size = parsed,
                Err(e) => tracing::warn!(
                    value = %size,
                    error = %e,
                    "Invalid maxBodySize value, using default 1MB"
                ),
            }
        }

        if let Some(methods) = get("logMethods") {
            config.log_methods = split_list(&methods);
        }
        if let Some(headers) = get("includeHeaders") {
            config.include_headers = split_list(&headers);
        }
        if let Some(paths) = get("includePaths") {
            config.include_paths = split_list(&paths);
        }
        if let Some(paths) = get("excludePaths") {
            config.exclude_paths = split_list(&paths);
        }

        config
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts either a TOML array of strings or one comma-separated string.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::One(s) => split_list(&s),
        Raw::Many(items) => items
            .iter()
            .flat_map(|item| split_list(item))
            .collect(),
    })
}
