//! Document Producers
//!
//! A producer turns the watched project into the JSON document pushed to
//! viewers. Production is blocking and may be slow; the coordinator runs it
//! on a blocking thread.
//!
//! - `FileProducer` - reads a JSON (or TOML) file
//! - `CommandProducer` - runs a command and parses its stdout as JSON

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::utils::exec::Cmd;

/// Failure to produce a document. Reported to viewers, never fatal.
#[derive(Debug, Error)]
pub enum ProduceError {
    #[error("cannot read `{0}`: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("command `{0}` not found")]
    CommandNotFound(String),

    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("producer panicked")]
    Panicked,
}

/// Source of the document pushed to viewers
pub trait DocumentProducer: Send + Sync + 'static {
    /// Label used in error messages ("<name> error: ...")
    fn name(&self) -> &str;

    fn produce(&self) -> Result<Value, ProduceError>;
}

/// Reads the document from a file, JSON or TOML by extension
#[derive(Debug, Clone)]
pub struct FileProducer {
    name: String,
    path: PathBuf,
}

impl FileProducer {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentProducer for FileProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn produce(&self) -> Result<Value, ProduceError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| ProduceError::Io(self.path.clone(), e))?;

        let is_toml = self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }
}

/// Runs a command and parses its stdout as JSON
#[derive(Debug, Clone)]
pub struct CommandProducer {
    name: String,
    cmd: Cmd,
}

impl CommandProducer {
    /// `command[0]` is the program. Runs in `root`.
    pub fn new(name: impl Into<String>, command: &[String], root: &Path) -> Self {
        Self {
            name: name.into(),
            cmd: Cmd::from_slice(command).cwd(root),
        }
    }
}

impl DocumentProducer for CommandProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn produce(&self) -> Result<Value, ProduceError> {
        let program = self.cmd.program_name();
        if self.cmd.resolve().is_none() {
            return Err(ProduceError::CommandNotFound(program));
        }

        let output = self
            .cmd
            .output()
            .map_err(|e| ProduceError::Io(PathBuf::from(&program), e))?;

        if !output.status.success() {
            return Err(ProduceError::CommandFailed {
                command: program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_file_producer_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.json");
        std::fs::write(&path, r#"{"title": "Users", "version": 2}"#).unwrap();

        let producer = FileProducer::new("API", &path);
        assert_eq!(producer.name(), "API");
        assert_eq!(
            producer.produce().unwrap(),
            json!({"title": "Users", "version": 2})
        );
    }

    #[test]
    fn test_file_producer_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.toml");
        std::fs::write(&path, "title = \"Users\"\n[servers]\nbase = \"/v1\"\n").unwrap();

        let doc = FileProducer::new("API", &path).produce().unwrap();
        assert_eq!(doc, json!({"title": "Users", "servers": {"base": "/v1"}}));
    }

    #[test]
    fn test_file_producer_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.json");
        std::fs::write(&path, "{\"title\": ").unwrap();

        let err = FileProducer::new("API", &path).produce().unwrap_err();
        assert!(matches!(err, ProduceError::Json(_)));
    }

    #[test]
    fn test_file_producer_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = FileProducer::new("API", dir.path().join("absent.json"))
            .produce()
            .unwrap_err();
        assert!(matches!(err, ProduceError::Io(..)));
    }

    #[test]
    fn test_command_not_found() {
        let dir = TempDir::new().unwrap();
        let producer =
            CommandProducer::new("API", &["livedoc-no-such-program-xyz".into()], dir.path());
        assert!(matches!(
            producer.produce(),
            Err(ProduceError::CommandNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_stdout_is_document() {
        let dir = TempDir::new().unwrap();
        let command = ["sh".into(), "-c".into(), r#"printf '{"ok": true}'"#.into()];
        let doc = CommandProducer::new("API", &command, dir.path())
            .produce()
            .unwrap();
        assert_eq!(doc, json!({"ok": true}));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let command = ["sh".into(), "-c".into(), "echo 'line 3: bad type' >&2; exit 2".into()];
        match CommandProducer::new("API", &command, dir.path()).produce() {
            Err(ProduceError::CommandFailed { stderr, .. }) => {
                assert_eq!(stderr, "line 3: bad type");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }
}
