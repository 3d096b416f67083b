//! Resource registry with priority-based override.
//!
//! The registry maps each namespace to exactly one effective
//! [`ResourceRecord`]. When two records claim the same namespace the one with
//! the strictly higher priority wins; on a tie the incumbent stays.
//!
//! # Overview
//!
//! - **Override**: deterministic from priority and arrival order
//! - **Filtering**: by type, source and enabled flag, ordered by priority
//! - **Dependencies**: transitive resolution, missing-dependency reports,
//!   reverse lookups and cycle detection, all computed on demand
//!
//! The registry itself is not locked. Hosts that share it across tasks wrap
//! it in a [`SharedRegistry`] and keep a single writer.
//!
//! # Example
//!
//! ```ignore
//! use switchyard_core::{ResourceFilter, ResourceRecord, ResourceRegistry, ResourceType};
//!
//! let mut registry = ResourceRegistry::new();
//! registry.register(ResourceRecord::new(ResourceType::Skill, "lint").with_priority(10))?;
//! registry.register(
//!     ResourceRecord::new(ResourceType::Agent, "reviewer").with_dependency("skill:lint"),
//! )?;
//!
//! let order = registry.resolve_dependencies("agent:reviewer")?;
//! assert_eq!(order, vec!["skill:lint"]);
//!
//! let skills = registry.list(&ResourceFilter::new().with_type(ResourceType::Skill));
//! ```

use crate::dependency::{detect_cycles, DependencyGraph};
use crate::error::{Error, Result};
use crate::resource::{Namespace, ResourceRecord, ResourceType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};


/// Registry shared between a single writer and concurrent readers
pub type SharedRegistry = Arc<RwLock<ResourceRegistry>>;

#[derive(Debug, Clone)]
struct Entry {
    record: ResourceRecord,
    /// Registration sequence of the stored record
    seq: u64,
}

/// Filter for [`ResourceRegistry::list`]
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    /// Only this resource type
    pub resource_type: Option<ResourceType>,
    /// Only this source tag
    pub source: Option<String>,
    /// Skip disabled records
    pub enabled_only: bool,
}

impl ResourceFilter {
    /// Filter that matches everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one type
    #[must_use]
    pub fn with_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    /// Restrict to one source
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Skip disabled records
    #[must_use]
    pub fn enabled_only(mut self) -> Self {
        self.enabled_only = true;
        self
    }

    fn matches(&self, record: &ResourceRecord) -> bool {
        self.resource_type
            .map_or(true, |t| record.resource_type == t)
            && self
                .source
                .as_deref()
                .map_or(true, |s| record.source == s)
            && (!self.enabled_only || record.enabled)
    }
}

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Number of records
    pub total: usize,
    /// Number of enabled records
    pub enabled: usize,
    /// Records per type
    pub by_type: BTreeMap<ResourceType, usize>,
    /// Records per source tag
    pub by_source: BTreeMap<String, usize>,
    /// Records declaring at least one dependency
    pub with_dependencies: usize,
}

/// Namespace → effective resource record
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from a snapshot (see [`ResourceRegistry::snapshot`])
    pub fn from_records(records: impl IntoIterator<Item = ResourceRecord>) -> Result<Self> {
        let mut registry = Self::new();
        registry.load_all(records)?;
        Ok(registry)
    }

    /// Wrap the registry for sharing with a router
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Register a record.
    ///
    /// The namespace and every dependency are stored in canonical
    /// `"{type}:{name}"` form, so `claude` and `backend:claude` name the same
    /// resource. A namespace whose prefix disagrees with the record's type is
    /// rejected.
    ///
    /// Returns `true` when the stored record changed: either the namespace
    /// was new, or the new record has a strictly higher priority than the
    /// incumbent.
    pub fn register(&mut self, mut record: ResourceRecord) -> Result<bool> {
        let namespace = Namespace::parse(&record.namespace).map_err(|_| {
            Error::Validation(format!(
                "resource '{}' has an invalid namespace '{}'",
                record.name, record.namespace
            ))
        })?;
        if namespace.kind != record.resource_type {
            return Err(Error::Validation(format!(
                "namespace '{}' is a {} but resource '{}' is typed {}",
                namespace, namespace.kind, record.name, record.resource_type
            )));
        }
        record.namespace = namespace.canonical();
        record.dependencies = record
            .dependencies
            .iter()
            .map(|dep| {
                Namespace::parse(dep).map(|ns| ns.canonical()).map_err(|_| {
                    Error::Validation(format!(
                        "{} has an invalid dependency '{}'",
                        record.namespace, dep
                    ))
                })
            })
            .collect::<Result<_>>()?;

        let seq = self.next_seq;
        self.next_seq += 1;

        match self.entries.get_mut(&record.namespace) {
            Some(existing) if record.priority > existing.record.priority => {
                debug!(
                    namespace = %record.namespace,
                    old_priority = existing.record.priority,
                    new_priority = record.priority,
                    old_source = %existing.record.source,
                    new_source = %record.source,
                    "Resource overridden"
                );
                *existing = Entry { record, seq };
                Ok(true)
            }
            Some(existing) => {
                debug!(
                    namespace = %record.namespace,
                    kept_priority = existing.record.priority,
                    rejected_priority = record.priority,
                    rejected_source = %record.source,
                    "Resource kept over lower or equal priority registration"
                );
                Ok(false)
            }
            None => {
                debug!(namespace = %record.namespace, source = %record.source, "Registered resource");
                self.entries
                    .insert(record.namespace.clone(), Entry { record, seq });
                Ok(true)
            }
        }
    }

    /// Register records in bulk; returns how many changed the registry
    pub fn load_all(&mut self, records: impl IntoIterator<Item = ResourceRecord>) -> Result<usize> {
        let mut changed = 0;
        for record in records {
            if self.register(record)? {
                changed += 1;
            }
        }
        info!("Loaded {} resources into registry", changed);
        Ok(changed)
    }

    /// Get a record by its canonical namespace
    pub fn get(&self, namespace: &str) -> Option<&ResourceRecord> {
        self.entries.get(namespace).map(|e| &e.record)
    }

    /// Get a record by any spelling of its namespace, e.g. `claude` for
    /// `backend:claude`
    pub fn lookup(&self, raw: &str) -> Option<&ResourceRecord> {
        self.get(raw.trim()).or_else(|| {
            let canonical = Namespace::parse(raw).ok()?.canonical();
            self.get(&canonical)
        })
    }

    /// Whether a namespace is registered
    pub fn contains(&self, namespace: &str) -> bool {
        self.entries.contains_key(namespace)
    }

    /// Number of registered namespaces
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order
    fn ordered(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries
    }

    /// Matching records, highest priority first, then registration order
    pub fn list(&self, filter: &ResourceFilter) -> Vec<&ResourceRecord> {
        let mut matches: Vec<&Entry> = self
            .entries
            .values()
            .filter(|e| filter.matches(&e.record))
            .collect();
        matches.sort_by(|a, b| {
            b.record
                .priority
                .cmp(&a.record.priority)
                .then(a.seq.cmp(&b.seq))
        });
        matches.into_iter().map(|e| &e.record).collect()
    }

    /// Every record in registration order, for external snapshot caches
    pub fn snapshot(&self) -> Vec<ResourceRecord> {
        self.ordered().into_iter().map(|e| e.record.clone()).collect()
    }

    /// All transitive dependencies of `namespace`, dependency-first, each
    /// exactly once.
    ///
    /// Unregistered dependencies appear as leaves; use
    /// [`ResourceRegistry::validate_dependencies`] to report them.
    pub fn resolve_dependencies(&self, namespace: &str) -> Result<Vec<String>> {
        let root = self
            .lookup(namespace)
            .ok_or_else(|| Error::ResourceNotFound(namespace.to_string()))?;

        let mut resolved = Vec::new();
        let mut done: HashSet<&str> = HashSet::new();
        let mut on_path: HashSet<&str> = HashSet::from([root.namespace.as_str()]);
        // (namespace, its dependencies, index of the next one to visit)
        let mut stack: Vec<(&str, &[String], usize)> =
            vec![(root.namespace.as_str(), root.dependencies.as_slice(), 0)];

        while let Some(top) = stack.last_mut() {
            let (node, deps, next) = *top;
            top.2 += 1;

            let Some(dep) = deps.get(next).map(String::as_str) else {
                stack.pop();
                on_path.remove(node);
                if !stack.is_empty() {
                    done.insert(node);
                    resolved.push(node.to_string());
                }
                continue;
            };

            if on_path.contains(dep) {
                let start = stack.iter().position(|(n, _, _)| *n == dep).unwrap_or(0);
                let cycle = stack[start..].iter().map(|(n, _, _)| n.to_string()).collect();
                return Err(Error::cycle(cycle));
            }
            if done.contains(dep) {
                continue;
            }

            let inner = self.get(dep).map_or(&[][..], |r| r.dependencies.as_slice());
            on_path.insert(dep);
            stack.push((dep, inner, 0));
        }

        Ok(resolved)
    }

    /// Report every declared dependency that is not registered
    pub fn validate_dependencies(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for entry in self.ordered() {
            for dep in &entry.record.dependencies {
                if !self.contains(dep) {
                    errors.push(format!(
                        "{} depends on missing '{}'",
                        entry.record.namespace, dep
                    ));
                }
            }
        }
        errors
    }

    /// Namespaces whose dependency list names `namespace`
    pub fn get_dependents(&self, namespace: &str) -> Vec<String> {
        let namespace = match Namespace::parse(namespace) {
            Ok(parsed) => parsed.canonical(),
            Err(_) => return Vec::new(),
        };
        self.ordered()
            .into_iter()
            .filter(|e| e.record.dependencies.iter().any(|d| *d == namespace))
            .map(|e| e.record.namespace.clone())
            .collect()
    }

    /// Registry contents as a dependency graph (nodes in registration order)
    pub fn dependency_graph(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for entry in self.ordered() {
            graph.add_node(entry.record.namespace.clone());
            for dep in &entry.record.dependencies {
                graph.add_edge(entry.record.namespace.clone(), dep.clone());
            }
        }
        graph
    }

    /// Every cycle among registered records
    pub fn check_circular_dependency(&self) -> Vec<Vec<String>> {
        detect_cycles(&self.dependency_graph())
    }

    /// Counts by type, source and dependency presence
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total: self.entries.len(),
            ..Default::default()
        };
        for entry in self.entries.values() {
            let record = &entry.record;
            if record.enabled {
                stats.enabled += 1;
            }
            if record.has_dependencies() {
                stats.with_dependencies += 1;
            }
            *stats.by_type.entry(record.resource_type).or_default() += 1;
            *stats.by_source.entry(record.source.clone()).or_default() += 1;
        }
        stats
    }

    /// Remove every record
    pub fn clear(&mut self) {
        self.entries.clear();
        info!("Cleared resource registry");
    }
}
