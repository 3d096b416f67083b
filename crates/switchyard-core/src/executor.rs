//! Execution contract between the router and host-supplied backends.
//!
//! The host application implements [`ResourceExecutor`] once per resource
//! type (skill runner, agent call, command runner, prompt renderer, direct
//! backend) and hands them to the router in an [`ExecutorSet`].

use crate::resource::{Namespace, ResourceRecord, ResourceType};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;


/// Context handed to an executor for one attempt
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Parsed namespace of the chosen candidate
    pub namespace: Namespace,
    /// Registry record at the time availability was checked
    pub record: ResourceRecord,
    /// Zero-based position of the candidate in the route's list
    pub attempt: usize,
}

/// Trait for resource execution backends
///
/// An `Err` is treated as a recoverable failure: the router records the
/// message and falls back to the next candidate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceExecutor: Send + Sync {
    /// Run the resource for one request
    async fn execute(
        &self,
        request: &Value,
        context: &ExecutionContext,
    ) -> std::result::Result<Value, String>;
}

/// Executors keyed by resource type
#[derive(Clone, Default)]
pub struct ExecutorSet {
    executors: HashMap<ResourceType, Arc<dyn ResourceExecutor>>,
}

impl ExecutorSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an executor for a type
    #[must_use]
    pub fn with_executor(mut self, kind: ResourceType, executor: Arc<dyn ResourceExecutor>) -> Self {
        self.insert(kind, executor);
        self
    }

    /// Add or replace the executor for a type
    pub fn insert(&mut self, kind: ResourceType, executor: Arc<dyn ResourceExecutor>) {
        self.executors.insert(kind, executor);
    }

    /// Executor for a type
    pub fn get(&self, kind: ResourceType) -> Option<Arc<dyn ResourceExecutor>> {
        self.executors.get(&kind).cloned()
    }

    /// Whether an executor exists for a type
    pub fn contains(&self, kind: ResourceType) -> bool {
        self.executors.contains_key(&kind)
    }

    /// Types with an executor, in declaration order
    pub fn kinds(&self) -> Vec<ResourceType> {
        ResourceType::ALL
            .into_iter()
            .filter(|k| self.executors.contains_key(k))
            .collect()
    }
}

impl fmt::Debug for ExecutorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorSet")
            .field("kinds", &self.kinds())
            .finish()
    }
}
