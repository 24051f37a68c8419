//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// One entry per failed check, all reported together
    #[error("config validation error:\n- {}", .0.join("\n- "))]
    Validation(Vec<String>),

    #[error("unknown fields in `{}`: {}", path.display(), fields.join(", "))]
    UnknownFields { path: PathBuf, fields: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_lists_every_error() {
        let err = ConfigError::Validation(vec!["first".into(), "second".into()]);
        let text = err.to_string();
        assert!(text.contains("- first"));
        assert!(text.contains("- second"));
    }

    #[test]
    fn test_unknown_fields_display() {
        let err = ConfigError::UnknownFields {
            path: PathBuf::from("preview.toml"),
            fields: vec!["api.entyr".into(), "extra".into()],
        };
        assert_eq!(
            err.to_string(),
            "unknown fields in `preview.toml`: api.entyr, extra"
        );
    }
}
