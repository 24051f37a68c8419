//! Preview configuration from `preview.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # One struct per table
//! │   ├── api        # [api]     document source
//! │   ├── viewer     # [viewer]  viewer files and entry HTML
//! │   ├── serve      # [serve]   static web server
//! │   ├── reload     # [reload]  push server host and port range
//! │   └── watch      # [watch]   file watching
//! ├── error          # ConfigError
//! └── mod.rs         # PreviewConfig (this file)
//! ```
//!
//! The file is optional. Without one, defaults apply with the current
//! directory as project root. Command-line flags override file values.

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{ApiConfig, ReloadConfig, ServeConfig, ViewerConfig, WatchConfig};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Commands, DEFAULT_CONFIG, ServeArgs};
use crate::utils::path::{normalize_path, resolve_in};

/// Root configuration structure representing preview.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Absolute path to the config file, empty when running on defaults
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root: the config file's directory, or the current directory
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub reload: ReloadConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl PreviewConfig {
    /// Load configuration for `cli`, searching upward from the current
    /// directory for the config file.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_in(cli, &cwd)
    }

    /// Same as [`load`](Self::load), with `cwd` as the search start.
    pub fn load_in(cli: &Cli, cwd: &Path) -> Result<Self> {
        let found = find_config_file(&cli.config, cwd);

        let (mut config, root) = match found {
            Some(path) => {
                let config = Self::from_path(&path)?;
                let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                crate::debug!("config"; "loaded {}", path.display());
                (
                    Self {
                        config_path: normalize_path(&path),
                        ..config
                    },
                    root,
                )
            }
            None if cli.config != Path::new(DEFAULT_CONFIG) => {
                bail!("Config file '{}' not found", cli.config.display());
            }
            None => (Self::default(), cwd.to_path_buf()),
        };

        if let Commands::Serve { args } = &cli.command {
            config.apply_serve_args(args, cwd);
        }
        config.resolve_paths(&root);
        config.validate(&cli.command)?;

        Ok(config)
    }

    /// Load configuration from file path, rejecting unknown fields.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            return Err(ConfigError::UnknownFields {
                path: path.to_path_buf(),
                fields: ignored,
            });
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply `serve` flags. Paths given on the command line are relative
    /// to the working directory, not the project root.
    fn apply_serve_args(&mut self, args: &ServeArgs, cwd: &Path) {
        crate::logger::set_verbose(args.verbose);

        if let Some(api) = &args.api {
            self.api.entry = cwd.join(api);
            self.api.command.clear();
        }
        if let Some(viewer) = &args.viewer {
            self.viewer.source = cwd.join(viewer);
        }
        Self::update_option(&mut self.viewer.main_file, args.main_file.as_ref());
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.watch.enable, args.watch.as_ref());
        Self::update_option(&mut self.serve.open, args.open.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make document and viewer paths absolute.
    fn resolve_paths(&mut self, root: &Path) {
        let root = normalize_path(root);
        self.api.entry = normalize_path(&resolve_in(&root, &self.api.entry));
        self.viewer.source = normalize_path(&resolve_in(&root, &self.viewer.source));
        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration for `command`, collecting every failure.
    fn validate(&self, command: &Commands) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        self.reload.validate(&mut errors);
        self.viewer.validate(&mut errors);

        if matches!(command, Commands::Serve { .. }) && !self.viewer.source.is_dir() {
            errors.push(format!(
                "viewer.source `{}` is not a directory",
                self.viewer.source.display()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Find config file by searching upward from `start`
///
/// ```text
/// /home/user/api/docs/        ← cwd
/// /home/user/api/preview.toml ← found!
/// ```
fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.is_file().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PreviewConfig {
    let (parsed, ignored) = PreviewConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
