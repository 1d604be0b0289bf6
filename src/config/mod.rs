//! Client configuration management for `relive.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── client.rs   # [client] section
//! ├── error.rs    # ConfigError
//! ├── util.rs     # url rewriting, config lookup
//! └── mod.rs      # ReliveConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section    | Purpose                                          |
//! |------------|--------------------------------------------------|
//! | `[client]` | Socket url, reconnect interval, autostart, page  |

mod client;
mod error;
mod util;

pub use client::{ClientConfig, DEFAULT_RECONNECT_MS};
pub use error::ConfigError;

use util::find_config_file;

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing relive.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReliveConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths are resolved against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Live-reload client settings
    #[serde(default)]
    pub client: ClientConfig,
}

impl ReliveConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file. A missing file is not an
    /// error: defaults are used and the root is the current directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config, &cwd) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    config_path: cwd.join(&cli.config),
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.apply_command_options(cli);
        config.client.validate()?;
        if let Some(warning) = config.client.scheme_warning() {
            log!("warning"; "{}", warning);
        }
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "ignoring unknown fields in {}: {}", display_path, fields.join(", "));
    }

    /// Apply `watch` command overrides.
    fn apply_command_options(&mut self, cli: &Cli) {
        if let Some(Commands::Watch {
            page,
            url,
            interval,
        }) = &cli.command
        {
            Self::update_option(&mut self.client.page, page.as_ref());
            Self::update_option(&mut self.client.url, url.as_ref());
            Self::update_option(&mut self.client.reconnect_interval, interval.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Absolute path of the page seeding the document, with `~` expanded.
    pub fn page_path(&self) -> PathBuf {
        let raw = self.client.page.to_string_lossy();
        let expanded = PathBuf::from(shellexpand::tilde(&raw).into_owned());
        if expanded.is_relative() {
            self.root.join(expanded)
        } else {
            expanded
        }
    }
}

/// Parse config and panic on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ReliveConfig {
    let (parsed, ignored) = ReliveConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(ReliveConfig::from_str("[client\nurl = \"ws://x\"").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[client]\nautostart = false\nretries = 3\n[server]\nport = 1";
        let (config, ignored) = ReliveConfig::parse_with_ignored(content).unwrap();

        assert!(!config.client.autostart);
        assert!(ignored.iter().any(|f| f == "client.retries"));
        assert!(ignored.iter().any(|f| f.contains("server")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let (_, ignored) =
            ReliveConfig::parse_with_ignored("[client]\nurl = \"ws://localhost/~watch.js\"")
                .unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_watch_args_override_file() {
        let mut config = test_parse_config("[client]\nurl = \"ws://a/\"\nreconnect_interval = 50");
        let cli = Cli::parse_from(["relive", "watch", "docs/page.html", "-u", "ws://b/"]);
        config.apply_command_options(&cli);

        assert_eq!(config.client.url, "ws://b/");
        assert_eq!(config.client.reconnect_interval, 50);
        assert_eq!(config.client.page, PathBuf::from("docs/page.html"));
    }

    #[test]
    fn test_page_path_relative_to_root() {
        let dir = TempDir::new().unwrap();
        let config = ReliveConfig {
            root: dir.path().to_path_buf(),
            ..ReliveConfig::default()
        };
        assert_eq!(config.page_path(), dir.path().join("index.html"));

        let absolute = ReliveConfig {
            client: ClientConfig {
                page: dir.path().join("other.html"),
                ..ClientConfig::default()
            },
            ..ReliveConfig::default()
        };
        assert_eq!(absolute.page_path(), dir.path().join("other.html"));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relive.toml");
        fs::write(&path, "[client]\nautostart = false\n").unwrap();

        let config = ReliveConfig::from_path(&path).unwrap();
        assert!(!config.client.autostart);

        let missing = ReliveConfig::from_path(&dir.path().join("absent.toml"));
        assert!(missing.is_err());
    }
}
