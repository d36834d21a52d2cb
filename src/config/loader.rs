//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::AuditConfig;
use crate::error::ConfigError;

/// Load configuration from a TOML file.
///
/// Only I/O and syntax problems are errors here. Semantic problems (a bad
/// size, a broken pattern) are handled later with warnings so that a running
/// server never refuses to start because of its audit settings.
pub fn load_config(path: &Path) -> Result<AuditConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AuditConfig = toml::from_str(&content)?;

    tracing::debug!(path = %path.display(), "Audit configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_file = "audit.log"
binding_name = "audit-out"
max_body_size = 4096
log_methods = "POST,PATCH"
exclude_paths = ["/health"]
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.log_file.as_deref(), Some("audit.log"));
        assert_eq!(config.binding_name, "audit-out");
        assert_eq!(config.max_body_size, 4096);
        assert_eq!(config.log_methods, vec!["POST", "PATCH"]);
        assert_eq!(config.exclude_paths, vec!["/health"]);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/audit.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_config_bad_syntax() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_request = maybe").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
