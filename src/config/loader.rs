//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigError> {
    let config: RouterConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [database]
            url = "postgres://db.internal/users"
            username = "web"

            [rewrite]
            location = "/dir"
            default_destination = "/dir.1"
            tables = "t1 /dir.2 t2 /dir.3"
            document_root = "/srv/www"
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.rewrite.tables, "t1 /dir.2 t2 /dir.3");
        assert_eq!(config.database.username.as_deref(), Some("web"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/identity-router.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            parse_config("[rewrite\nlocation = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation_error_lists_problems() {
        let err = parse_config(
            r#"
            [rewrite]
            location = "/dir"
            default_destination = "/dir.1"
            tables = "t1"
            "#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("database.url"));
        assert!(message.contains("odd number of tokens"));
    }
}
