//! Resource and task manifests
//!
//! A resource manifest is a YAML document listing resources by namespace:
//!
//! ```yaml
//! source: user
//! priority: 100
//! resources:
//!   - namespace: skill:pdf
//!     dependencies: ["command:pdftotext"]
//!   - namespace: command:pdftotext
//!     enabled: false
//! ```
//!
//! A task manifest is a YAML list of [`Task`] values.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use switchyard_core::{ResourceRecord, ResourceRegistry, Task};
use tracing::info;

/// One resource file
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceManifest {
    /// Source tag for every entry that does not set its own
    #[serde(default)]
    pub source: Option<String>,
    /// Priority for every entry that does not set its own
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub resources: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub namespace: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub config: HashMap<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl ResourceManifest {
    /// Parse a manifest from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse resource manifest")
    }

    /// Turn entries into records; `path` is recorded on each of them
    pub fn into_records(
        self,
        default_source: &str,
        path: Option<&Path>,
    ) -> Result<Vec<ResourceRecord>> {
        let manifest_source = self.source.unwrap_or_else(|| default_source.to_string());
        let manifest_priority = self.priority;
        self.resources
            .into_iter()
            .map(|entry| {
                let mut record = ResourceRecord::from_namespace(&entry.namespace)
                    .with_context(|| format!("Invalid resource '{}'", entry.namespace))?
                    .with_source(entry.source.unwrap_or_else(|| manifest_source.clone()))
                    .with_priority(entry.priority.unwrap_or(manifest_priority))
                    .with_dependencies(entry.dependencies);
                record.config = entry.config;
                if !entry.enabled {
                    record = record.disabled();
                }
                if let Some(path) = path {
                    record = record.with_path(path);
                }
                Ok(record)
            })
            .collect()
    }
}

/// Load every manifest in order into a fresh registry
pub fn load_registry(paths: &[impl AsRef<Path>], default_source: &str) -> Result<ResourceRegistry> {
    let mut registry = ResourceRegistry::new();
    for path in paths {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let records = ResourceManifest::from_yaml(&text)
            .with_context(|| format!("In manifest {}", path.display()))?
            .into_records(default_source, Some(path))?;
        let changed = registry.load_all(records)?;
        info!(manifest = %path.display(), changed, "Loaded manifest");
    }
    Ok(registry)
}

/// Load a task list
pub fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read task file {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("Failed to parse task file {}", path.display()))
}
