//! # Switchyard Core - Resource Registry and Fallback Routing
//!
//! This crate keeps track of named, typed, prioritised resources (skills,
//! agents, commands, prompts and direct backends), orders work by its
//! dependencies, and routes a request through a ranked list of candidates
//! until one of them succeeds.
//!
//! ## Core Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResourceRegistry`] | Namespace → record map with priority override |
//! | [`DependencyAnalyzer`] | Parallel levels, execution order and cycle reports for tasks |
//! | [`ExecutionRouter`] | Ordered fallback over candidate namespaces |
//! | [`ResourceExecutor`] | Host-supplied execution backend, one per resource type |
//!
//! ## Architecture
//!
//! ```text
//! Manifests / plugins / user config
//!     │  register (priority override)
//!     ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │  ResourceRegistry                                           │
//! │  • One effective record per namespace                      │
//! │  • Dependency resolution and cycle checks                  │
//! └────────────────────────────────────────────────────────────┘
//!     │  shared read access
//!     ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │  ExecutionRouter                                            │
//! │  • Availability checks per candidate                       │
//! │  • First success wins, failures fall through               │
//! └────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! ResourceExecutor (skill runner, agent, command, prompt, backend)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use switchyard_core::{
//!     ExecutionRouter, ExecutorSet, ResourceRecord, ResourceRegistry, ResourceType,
//! };
//!
//! let mut registry = ResourceRegistry::new();
//! registry.register(ResourceRecord::new(ResourceType::Skill, "pdf").with_priority(10))?;
//!
//! let router = ExecutionRouter::new(
//!     registry.into_shared(),
//!     ExecutorSet::new().with_executor(ResourceType::Skill, skill_runner),
//! );
//! let result = router.route(&["skill:pdf", "claude"], &request).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dependency;
pub mod error;
pub mod executor;
pub mod registry;
pub mod resource;
pub mod router;

pub use dependency::{
    dependency_depth, detect_cycles, topological_sort, DependencyAnalyzer, DependencyGraph,
    DependencyStats, Level, Task,
};
pub use error::{Error, Result};
pub use executor::{ExecutionContext, ExecutorSet, ResourceExecutor};
pub use registry::{RegistryStats, ResourceFilter, ResourceRegistry, SharedRegistry};
pub use resource::{Namespace, ResourceRecord, ResourceType};
pub use router::{
    AttemptRecord, CandidateReport, ExecutionRouter, RouteResult, RouterConfig, SkipReason,
};
