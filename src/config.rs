//! Application configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use switchyard_core::RouterConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "switchyard=info,switchyard_core=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

/// Registry population settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Source tag for manifest entries that do not name one
    #[serde(default = "default_source")]
    pub default_source: String,
    /// Manifests loaded at startup, in order
    #[serde(default)]
    pub manifests: Vec<PathBuf>,
}

fn default_source() -> String {
    "manifest".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_source: default_source(),
            manifests: Vec::new(),
        }
    }
}
