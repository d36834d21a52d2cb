//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile configured regular expressions once
//! - Drop (and report) patterns that do not compile
//! - Answer "does any pattern match this path" in configured order
//!
//! # Design Decisions
//! - Patterns are unanchored, as written by the operator
//! - Matching runs against path plus query, the way the request was received
//! - An empty set has no opinion; the caller decides what that means

use regex::Regex;

/// Ordered set of compiled path patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile `sources`, skipping invalid ones with a warning. `kind` names
    /// the option in log output.
    pub fn compile(kind: &str, sources: &[String]) -> Self {
        let patterns = sources
            .iter()
            .filter_map(|source| match Regex::new(source) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(
                        option = kind,
                        pattern = %source,
                        error = %e,
                        "Invalid path regex pattern, ignoring"
                    );
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if any pattern matches `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> PatternSet {
        let owned: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        PatternSet::compile("test", &owned)
    }

    #[test]
    fn test_matches_any() {
        let patterns = set(&["^/api/users", "^/api/orders/\\d+$"]);
        assert!(patterns.matches("/api/users/1"));
        assert!(patterns.matches("/api/orders/42"));
        assert!(!patterns.matches("/api/orders/abc"));
        assert!(!patterns.matches("/health"));
    }

    #[test]
    fn test_unanchored_pattern() {
        let patterns = set(&["/health"]);
        assert!(patterns.matches("/health"));
        assert!(patterns.matches("/internal/health?verbose=1"));
    }

    #[test]
    fn test_invalid_patterns_are_dropped() {
        let patterns = set(&["(unclosed", "^/ok", "[z-a]"]);
        assert_eq!(patterns.len(), 1);
        assert!(patterns.matches("/ok"));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let patterns = set(&[]);
        assert!(patterns.is_empty());
        assert!(!patterns.matches("/anything"));
    }
}
