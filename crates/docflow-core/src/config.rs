//! Configuration settings
//!
//! Read from `docflow.toml`; every section and key is optional.
//!
//! ```toml
//! [store]
//! dir = ".docflow/store"
//! debounce_ms = 2000
//!
//! [templating]
//! start = "{"
//! end = "}"
//! missing = "empty"   # or "error"
//! linebreaks = true
//!
//! [output]
//! dir = "out"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use docflow_ooxml::{Delimiters, FillOptions, MissingPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name
pub const CONFIG_FILE: &str = "docflow.toml";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Durable form record storage
    pub store: StoreSettings,
    /// Placeholder substitution
    pub templating: TemplatingSettings,
    /// Where downloads are written
    pub output: OutputSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from `path`, falling back to defaults if it does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(Error::Config(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Self::from_toml_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Substitution options for the template engines
    pub fn fill_options(&self) -> FillOptions {
        FillOptions {
            delimiters: Delimiters::new(&self.templating.start, &self.templating.end),
            missing: self.templating.missing,
            linebreaks: self.templating.linebreaks,
        }
    }

    /// Quiet period before scheduled saves are written
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.store.debounce_ms)
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory holding one JSON file per page key
    pub dir: PathBuf,
    /// Debounce delay in milliseconds
    pub debounce_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".docflow/store"),
            debounce_ms: 2000,
        }
    }
}

/// Templating configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatingSettings {
    pub start: String,
    pub end: String,
    /// Policy for placeholders without a value
    pub missing: MissingPolicy,
    pub linebreaks: bool,
}

impl Default for TemplatingSettings {
    fn default() -> Self {
        Self {
            start: "{".to_string(),
            end: "}".to_string(),
            missing: MissingPolicy::Empty,
            linebreaks: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}
