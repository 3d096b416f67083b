//! Resource records and namespaces.
//!
//! Every registered capability is keyed by a namespace of the form
//! `"{type}:{name}"`. [`Namespace::parse`] is the single place that splits
//! such a string; nothing else in the crate inspects prefixes by hand.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;


/// Kind of resource a namespace refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Reusable skill workflow
    Skill,
    /// Delegated agent
    Agent,
    /// Slash-style command
    Command,
    /// Prompt template
    Prompt,
    /// Direct execution backend (default when a namespace has no prefix)
    Backend,
}

impl ResourceType {
    /// All resource types, in declaration order
    pub const ALL: [ResourceType; 5] = [
        ResourceType::Skill,
        ResourceType::Agent,
        ResourceType::Command,
        ResourceType::Prompt,
        ResourceType::Backend,
    ];

    /// Namespace prefix for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Skill => "skill",
            ResourceType::Agent => "agent",
            ResourceType::Command => "command",
            ResourceType::Prompt => "prompt",
            ResourceType::Backend => "backend",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "skill" => Ok(ResourceType::Skill),
            "agent" => Ok(ResourceType::Agent),
            "command" => Ok(ResourceType::Command),
            "prompt" => Ok(ResourceType::Prompt),
            "backend" => Ok(ResourceType::Backend),
            other => Err(Error::Validation(format!("unknown resource type '{}'", other))),
        }
    }
}

/// Parsed namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// Resource kind selected by the prefix
    pub kind: ResourceType,
    /// Name part after the prefix
    pub name: String,
}

impl Namespace {
    /// Create a namespace from its parts
    pub fn new(kind: ResourceType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Parse a namespace string.
    ///
    /// Splits on the first `:`. Without a separator the whole string is a
    /// backend name. An unrecognised prefix stays part of the backend name,
    /// so `"gpt:4o"` parses as backend `gpt:4o`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::Validation("namespace must not be empty".to_string()));
        }

        let namespace = match raw.split_once(':') {
            Some((prefix, name)) => match prefix.parse::<ResourceType>() {
                Ok(kind) => Self::new(kind, name),
                Err(_) => Self::new(ResourceType::Backend, raw),
            },
            None => Self::new(ResourceType::Backend, raw),
        };

        if namespace.name.trim().is_empty() {
            return Err(Error::Validation(format!(
                "namespace '{}' has an empty name",
                raw
            )));
        }
        Ok(namespace)
    }

    /// Canonical `"{type}:{name}"` form used as the registry key
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.kind, self.name)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

impl FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Namespace::parse(s)
    }
}

fn default_true() -> bool {
    true
}

fn default_source() -> String {
    "unknown".to_string()
}

/// Metadata for one registered resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Globally unique key (`"{type}:{name}"`)
    pub namespace: String,
    /// Short name
    pub name: String,
    /// Resource kind
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Provenance tag (e.g. "builtin", "user", "project")
    #[serde(default = "default_source")]
    pub source: String,
    /// Override priority, higher wins
    #[serde(default)]
    pub priority: i64,
    /// Whether the resource may be routed to
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Namespaces this resource depends on, in declaration order
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Free-form configuration
    #[serde(default)]
    pub config: HashMap<String, Value>,
    /// Where the resource was declared, if it came from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ResourceRecord {
    /// Create an enabled record with the canonical namespace for `kind` and `name`
    pub fn new(kind: ResourceType, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            namespace: Namespace::new(kind, name.clone()).canonical(),
            name,
            resource_type: kind,
            source: default_source(),
            priority: 0,
            enabled: true,
            dependencies: Vec::new(),
            config: HashMap::new(),
            path: None,
        }
    }

    /// Create a record from a namespace string
    pub fn from_namespace(raw: &str) -> Result<Self> {
        let namespace = Namespace::parse(raw)?;
        Ok(Self::new(namespace.kind, namespace.name))
    }

    /// Set the source tag
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the priority
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Add a dependency
    #[must_use]
    pub fn with_dependency(mut self, namespace: impl Into<String>) -> Self {
        self.dependencies.push(namespace.into());
        self
    }

    /// Replace the dependency list
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = namespaces.into_iter().map(Into::into).collect();
        self
    }

    /// Add a config entry
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// Set the declaration path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Mark the record disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the record declares any dependencies
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }
}
