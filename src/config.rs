//! Feed configuration.
//!
//! Handles loading, normalizing, and validating the optional `config.json`
//! that sits at the root of a scanned drive. The file overlays a set of
//! defaults; it never replaces them wholesale.
//!
//! ## Config File Location
//!
//! ```text
//! /media/usb0/
//! ├── config.json              # Optional, root level only
//! ├── video1.mp4
//! └── promo/
//!     └── ad1.mov
//! ```
//!
//! ## Configuration Options
//!
//! ```json
//! {
//!     "BASE_URL": "http://localhost/",
//!     "MEDIA_EXTENSIONS": [".avi", ".mkv", ".mov", ".mp4"]
//! }
//! ```
//!
//! Both keys are optional. Unknown keys are ignored so a drive prepared for
//! a newer version still produces feeds with an older one.
//!
//! ## Failure Policy
//!
//! A missing file means defaults. A file that cannot be read, is not a JSON
//! object, has a key of the wrong type, or fails validation is logged and
//! also means defaults. Configuration problems never abort a run; the
//! outcome is recorded in [`ConfigSource`] so callers can report it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the user config file looked up at the scan root.
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Resolved feed configuration.
///
/// Serializes with the same upper-case keys the user file uses, which is
/// how `gen-config` renders the stock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Prefix of every generated URL. Always ends with `/`.
    #[serde(rename = "BASE_URL")]
    pub base_url: String,
    /// Lowercase extensions, leading dot included (e.g. `.mp4`).
    #[serde(rename = "MEDIA_EXTENSIONS")]
    pub media_extensions: BTreeSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/".to_string(),
            media_extensions: [".mp4", ".mov", ".avi", ".mkv"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    /// Whether `ext` (with or without leading dot, any case) is a media extension.
    pub fn is_media_extension(&self, ext: &str) -> bool {
        self.media_extensions.contains(&normalize_extension(ext))
    }

    /// Validate invariants that serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("BASE_URL must not be empty".into()));
        }
        if !self.base_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "BASE_URL must end with '/'".into(),
            ));
        }
        if self.media_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "MEDIA_EXTENSIONS must not be empty".into(),
            ));
        }
        if self.media_extensions.iter().any(|e| e.len() < 2) {
            return Err(ConfigError::Validation(
                "MEDIA_EXTENSIONS entries must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// The subset of `config.json` we understand. Every key is optional and
/// anything else in the object is silently dropped.
#[derive(Debug, Default, Deserialize)]
struct ConfigOverlay {
    #[serde(rename = "BASE_URL")]
    base_url: Option<String>,
    #[serde(rename = "MEDIA_EXTENSIONS")]
    media_extensions: Option<Vec<String>>,
}

/// Where the resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No `config.json` at the scan root.
    Defaults,
    /// `config.json` was read and overlaid.
    UserFile,
    /// `config.json` exists but was unusable; defaults were used instead.
    Fallback { reason: String },
}

/// A configuration together with its provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

/// Lowercase an extension and make sure it carries a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Read `config.json` from `root` without interpreting it.
///
/// Returns `Ok(None)` if the file does not exist.
fn load_overlay(root: &Path) -> Result<Option<ConfigOverlay>, ConfigError> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if !config_path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let overlay: ConfigOverlay = serde_json::from_str(&content)?;
    Ok(Some(overlay))
}

/// Apply an overlay on top of `defaults`, normalize, and validate.
fn apply_overlay(defaults: &Config, overlay: ConfigOverlay) -> Result<Config, ConfigError> {
    let mut config = defaults.clone();
    if let Some(mut base_url) = overlay.base_url {
        if !base_url.is_empty() && !base_url.ends_with('/') {
            base_url.push('/');
        }
        config.base_url = base_url;
    }
    if let Some(extensions) = overlay.media_extensions {
        config.media_extensions = extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();
    }
    config.validate()?;
    Ok(config)
}

/// Resolve the configuration for a scan root on top of explicit `defaults`.
///
/// Never fails: problems with the user file are logged and reported as
/// [`ConfigSource::Fallback`].
pub fn resolve_config(root: &Path, defaults: &Config) -> ResolvedConfig {
    let attempt = load_overlay(root).and_then(|overlay| match overlay {
        Some(ov) => apply_overlay(defaults, ov).map(Some),
        None => Ok(None),
    });

    match attempt {
        Ok(Some(config)) => ResolvedConfig {
            config,
            source: ConfigSource::UserFile,
        },
        Ok(None) => ResolvedConfig {
            config: defaults.clone(),
            source: ConfigSource::Defaults,
        },
        Err(e) => {
            tracing::warn!(
                path = %root.join(CONFIG_FILE_NAME).display(),
                error = %e,
                "ignoring unusable config file, using defaults"
            );
            ResolvedConfig {
                config: defaults.clone(),
                source: ConfigSource::Fallback {
                    reason: e.to_string(),
                },
            }
        }
    }
}

/// Resolve against the stock defaults.
pub fn load_config(root: &Path) -> ResolvedConfig {
    resolve_config(root, &Config::default())
}

/// The stock configuration as a pretty-printed `config.json`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_json() -> Result<String, ConfigError> {
    let mut json = serde_json::to_string_pretty(&Config::default())?;
    json.push('\n');
    Ok(json)
}
