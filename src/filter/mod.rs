//! Recording eligibility.
//!
//! # Data Flow
//! ```text
//! (method, path, headers)
//!     → method allow-set        ── miss ─▶ Skip(Method)
//!     → include patterns (any)  ── miss ─▶ Skip(NotIncluded)
//!     → exclude patterns (any)  ── hit ──▶ Skip(Excluded)
//!     → code headers non-empty  ── miss ─▶ Skip(MissingCodes)
//!     → Record { classification, action }
//! ```
//!
//! # Design Decisions
//! - Steps short-circuit in the order above
//! - An empty method set admits nothing; empty pattern sets are no-ops
//! - Exclude only runs after include passed, and always wins

pub mod matcher;

use axum::http::HeaderMap;

use crate::config::Settings;
pub use matcher::PatternSet;

/// Why a transaction was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Method,
    NotIncluded,
    Excluded,
    MissingCodes,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::Method => "method not recorded",
            SkipReason::NotIncluded => "path not included",
            SkipReason::Excluded => "path excluded",
            SkipReason::MissingCodes => "missing code headers",
        };
        f.write_str(text)
    }
}

/// Outcome of [`FilterEngine::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Record {
        classification_code: String,
        action_code: String,
    },
    Skip(SkipReason),
}

/// Method, path and header filter built once per layer.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    methods: Vec<String>,
    include: PatternSet,
    exclude: PatternSet,
    classification_header: String,
    action_header: String,
}

impl FilterEngine {
    pub fn new(
        methods: &[String],
        include: PatternSet,
        exclude: PatternSet,
        classification_header: impl Into<String>,
        action_header: impl Into<String>,
    ) -> Self {
        Self {
            methods: methods.iter().map(|m| m.to_ascii_uppercase()).collect(),
            include,
            exclude,
            classification_header: classification_header.into(),
            action_header: action_header.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let include = PatternSet::compile("include_paths", &settings.include_paths);
        let exclude = PatternSet::compile("exclude_paths", &settings.exclude_paths);

        Self::new(
            &settings.log_methods,
            include,
            exclude,
            settings.classification_header.clone(),
            settings.action_header.clone(),
        )
    }

    /// Decide whether the transaction should produce a record.
    pub fn evaluate(&self, method: &str, path: &str, headers: &HeaderMap) -> Verdict {
        if !self.methods.iter().any(|m| m.eq_ignore_ascii_case(method)) {
            return Verdict::Skip(SkipReason::Method);
        }

        if !self.include.is_empty() && !self.include.matches(path) {
            return Verdict::Skip(SkipReason::NotIncluded);
        }

        if !self.exclude.is_empty() && self.exclude.matches(path) {
            return Verdict::Skip(SkipReason::Excluded);
        }

        match (
            header_value(headers, &self.classification_header),
            header_value(headers, &self.action_header),
        ) {
            (Some(classification_code), Some(action_code)) => Verdict::Record {
                classification_code,
                action_code,
            },
            _ => Verdict::Skip(SkipReason::MissingCodes),
        }
    }

    pub fn eligible(&self, method: &str, path: &str, headers: &HeaderMap) -> bool {
        matches!(self.evaluate(method, path, headers), Verdict::Record { .. })
    }
}

/// First value of `name` decoded as UTF-8 (lossy), if present and non-empty.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .filter(|v| !v.is_empty())
}
