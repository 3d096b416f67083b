//! Execution router with ordered fallback.
//!
//! The router turns one ranked candidate list into exactly one successful
//! execution. Candidates are walked in the order given, never reordered:
//!
//! ```text
//! candidates ──► parse namespace ──► availability check ──► execute
//!                                        │                     │
//!                                  unavailable: skip      failed: skip
//!                                        └──────► next candidate ◄──┘
//! ```
//!
//! # Availability
//!
//! | Check | Skip reason |
//! |-------|-------------|
//! | namespace parses | `invalid namespace` |
//! | registered | `not found` |
//! | enabled | `disabled` |
//! | dependencies resolve, all registered and enabled | `missing/disabled dependency` |
//! | executor for the type | `no executor` |
//!
//! Unavailability and execution errors are routine: they are recorded per
//! candidate and the router moves on. Only exhausting the whole list is an
//! error ([`Error::RoutingExhausted`]), and its message names every
//! candidate with its reason.
//!
//! # Example
//!
//! ```ignore
//! use switchyard_core::{ExecutionRouter, ExecutorSet, ResourceType};
//!
//! let executors = ExecutorSet::new()
//!     .with_executor(ResourceType::Skill, skill_runner)
//!     .with_executor(ResourceType::Agent, agent_backend);
//! let router = ExecutionRouter::new(registry.into_shared(), executors);
//!
//! let result = router
//!     .route(&["skill:pdf", "agent:reader"], &json!({"file": "a.pdf"}))
//!     .await?;
//! println!("handled by {:?}", result.namespace);
//! ```

use crate::error::{Error, Result};
use crate::executor::{ExecutionContext, ExecutorSet, ResourceExecutor};
use crate::registry::{ResourceRegistry, SharedRegistry};
use crate::resource::{Namespace, ResourceType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};


/// Why a candidate was passed over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Candidate string is not a valid namespace
    InvalidNamespace(String),
    /// Not registered
    NotFound,
    /// Registered but disabled
    Disabled,
    /// A dependency is missing, disabled, or part of a cycle
    MissingDependency(String),
    /// No executor for the candidate's type
    NoExecutor(ResourceType),
    /// Executor returned an error
    ExecutionFailed(String),
    /// Executor did not finish within the configured timeout
    TimedOut {
        /// Timeout that elapsed
        timeout_ms: u64,
    },
    /// Candidate sits past the configured candidate limit
    OverLimit {
        /// Configured limit
        limit: usize,
    },
}

impl SkipReason {
    /// Whether the candidate was executed before being skipped
    pub fn was_executed(&self) -> bool {
        matches!(
            self,
            SkipReason::ExecutionFailed(_) | SkipReason::TimedOut { .. }
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidNamespace(msg) => write!(f, "invalid namespace: {}", msg),
            SkipReason::NotFound => f.write_str("not found"),
            SkipReason::Disabled => f.write_str("disabled"),
            SkipReason::MissingDependency(detail) => {
                write!(f, "missing/disabled dependency: {}", detail)
            }
            SkipReason::NoExecutor(kind) => write!(f, "no executor for '{}'", kind),
            SkipReason::ExecutionFailed(msg) => write!(f, "execution failed: {}", msg),
            SkipReason::TimedOut { timeout_ms } => {
                write!(f, "execution failed: timed out after {}ms", timeout_ms)
            }
            SkipReason::OverLimit { limit } => {
                write!(f, "not tried: beyond the candidate limit of {}", limit)
            }
        }
    }
}

/// One skipped candidate and its reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Candidate as supplied by the caller
    pub namespace: String,
    /// Why it was skipped
    pub reason: SkipReason,
}

impl AttemptRecord {
    /// Create a record
    pub fn new(namespace: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            namespace: namespace.into(),
            reason,
        }
    }
}

/// Result of a successful route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResult {
    /// Whether a candidate succeeded
    pub success: bool,
    /// Registry namespace of the candidate that ran
    pub namespace: Option<String>,
    /// Executor output
    pub output: Option<Value>,
    /// Error message (if failed)
    pub error: Option<String>,
    /// Candidates skipped before the successful one
    pub attempts: Vec<AttemptRecord>,
}

/// Availability of one candidate, without executing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateReport {
    /// Candidate as supplied by the caller
    pub candidate: String,
    /// Registry namespace it resolved to (if registered)
    pub namespace: Option<String>,
    /// Skip reason, `None` when the candidate would be executed
    pub reason: Option<SkipReason>,
}

impl CandidateReport {
    /// Whether the router would execute this candidate
    pub fn is_available(&self) -> bool {
        self.reason.is_none()
    }
}

/// Configuration for the execution router
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Per-candidate execution timeout in milliseconds (none by default)
    #[serde(default)]
    pub execute_timeout_ms: Option<u64>,
    /// Candidates past this position are not tried (no limit by default)
    #[serde(default)]
    pub max_candidates: Option<usize>,
}

impl RouterConfig {
    /// Set the per-candidate timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.execute_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the candidate limit
    #[must_use]
    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = Some(max);
        self
    }

    /// Per-candidate timeout as a duration
    pub fn execute_timeout(&self) -> Option<Duration> {
        self.execute_timeout_ms.map(Duration::from_millis)
    }

    /// Reject settings the router cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_candidates == Some(0) {
            return Err(Error::Configuration(
                "router.max_candidates must be at least 1".to_string(),
            ));
        }
        if self.execute_timeout_ms == Some(0) {
            return Err(Error::Configuration(
                "router.execute_timeout_ms must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of checking one candidate
enum Availability {
    Available {
        context: ExecutionContext,
        executor: Arc<dyn ResourceExecutor>,
    },
    Unavailable(SkipReason),
}

/// Outcome of one candidate, consumed by the routing loop
enum Attempt {
    Executed { namespace: String, output: Value },
    Skipped(SkipReason),
}

/// Routes ranked candidates to the first one that is available and succeeds
pub struct ExecutionRouter {
    registry: SharedRegistry,
    executors: ExecutorSet,
    config: RouterConfig,
}

impl ExecutionRouter {
    /// Create a router over a shared registry
    pub fn new(registry: SharedRegistry, executors: ExecutorSet) -> Self {
        Self {
            registry,
            executors,
            config: RouterConfig::default(),
        }
    }

    /// Set custom configuration, rejecting settings the router cannot use
    pub fn with_config(mut self, config: RouterConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// The registry this router reads
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Current configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Route a request through the candidate list.
    ///
    /// Returns the first success. If every candidate is unavailable or
    /// fails, or the list is empty, returns [`Error::RoutingExhausted`].
    #[instrument(skip(self, candidates, request), fields(candidates = candidates.len()))]
    pub async fn route<S: AsRef<str>>(&self, candidates: &[S], request: &Value) -> Result<RouteResult> {
        let limit = self.config.max_candidates.unwrap_or(usize::MAX);
        let mut attempts = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            let candidate = candidate.as_ref();
            if index >= limit {
                attempts.push(AttemptRecord::new(candidate, SkipReason::OverLimit { limit }));
                continue;
            }
            match self.attempt(candidate, index, request).await {
                Attempt::Executed { namespace, output } => {
                    info!(
                        namespace = %namespace,
                        skipped = attempts.len(),
                        "Routed request"
                    );
                    return Ok(RouteResult {
                        success: true,
                        namespace: Some(namespace),
                        output: Some(output),
                        error: None,
                        attempts,
                    });
                }
                Attempt::Skipped(reason) => {
                    if reason.was_executed() {
                        warn!(candidate = %candidate, reason = %reason, "Candidate failed, falling back");
                    } else {
                        debug!(candidate = %candidate, reason = %reason, "Candidate unavailable");
                    }
                    attempts.push(AttemptRecord::new(candidate, reason));
                }
            }
        }

        if candidates.len() > limit {
            warn!(
                "{} candidate(s) past the limit of {} were not tried",
                candidates.len() - limit,
                limit
            );
        }

        let err = Error::RoutingExhausted { attempts };
        warn!("{}", err);
        Err(err)
    }

    /// Route a single entity with no fallback
    pub async fn route_entity(&self, entity: &str, request: &Value) -> Result<RouteResult> {
        self.route(&[entity], request).await
    }

    /// Report the availability of every candidate without executing any
    pub async fn check_candidates<S: AsRef<str>>(&self, candidates: &[S]) -> Vec<CandidateReport> {
        let limit = self.config.max_candidates.unwrap_or(usize::MAX);
        let registry = self.registry.read().await;
        candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let candidate = candidate.as_ref();
                let availability = if index >= limit {
                    Availability::Unavailable(SkipReason::OverLimit { limit })
                } else {
                    self.check(&registry, candidate, index)
                };
                match availability {
                    Availability::Available { context, .. } => CandidateReport {
                        candidate: candidate.to_string(),
                        namespace: Some(context.record.namespace),
                        reason: None,
                    },
                    Availability::Unavailable(reason) => CandidateReport {
                        candidate: candidate.to_string(),
                        namespace: Self::lookup_key(&registry, candidate),
                        reason: Some(reason),
                    },
                }
            })
            .collect()
    }

    async fn attempt(&self, candidate: &str, index: usize, request: &Value) -> Attempt {
        let availability = {
            let registry = self.registry.read().await;
            self.check(&registry, candidate, index)
        };

        let (context, executor) = match availability {
            Availability::Available { context, executor } => (context, executor),
            Availability::Unavailable(reason) => return Attempt::Skipped(reason),
        };

        debug!(namespace = %context.record.namespace, attempt = index, "Executing candidate");
        let run = executor.execute(request, &context);
        let result = match self.config.execute_timeout() {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    return Attempt::Skipped(SkipReason::TimedOut {
                        timeout_ms: limit.as_millis() as u64,
                    })
                }
            },
            None => run.await,
        };

        match result {
            Ok(output) => Attempt::Executed {
                namespace: context.record.namespace,
                output,
            },
            Err(message) => Attempt::Skipped(SkipReason::ExecutionFailed(message)),
        }
    }

    /// Registry key for a candidate in any namespace spelling
    fn lookup_key(registry: &ResourceRegistry, candidate: &str) -> Option<String> {
        registry.lookup(candidate).map(|record| record.namespace.clone())
    }

    fn check(&self, registry: &ResourceRegistry, candidate: &str, index: usize) -> Availability {
        let namespace = match Namespace::parse(candidate) {
            Ok(namespace) => namespace,
            Err(e) => return Availability::Unavailable(SkipReason::InvalidNamespace(e.to_string())),
        };

        let Some(record) = registry.lookup(candidate) else {
            return Availability::Unavailable(SkipReason::NotFound);
        };
        let key = record.namespace.as_str();

        if !record.enabled {
            return Availability::Unavailable(SkipReason::Disabled);
        }

        let dependencies = match registry.resolve_dependencies(key) {
            Ok(dependencies) => dependencies,
            Err(e) => {
                return Availability::Unavailable(SkipReason::MissingDependency(e.to_string()))
            }
        };
        for dep in &dependencies {
            match registry.get(dep) {
                None => {
                    return Availability::Unavailable(SkipReason::MissingDependency(format!(
                        "'{}' is not registered",
                        dep
                    )))
                }
                Some(dep_record) if !dep_record.enabled => {
                    return Availability::Unavailable(SkipReason::MissingDependency(format!(
                        "'{}' is disabled",
                        dep
                    )))
                }
                Some(_) => {}
            }
        }

        let Some(executor) = self.executors.get(namespace.kind) else {
            return Availability::Unavailable(SkipReason::NoExecutor(namespace.kind));
        };

        Availability::Available {
            context: ExecutionContext {
                namespace,
                record: record.clone(),
                attempt: index,
            },
            executor,
        }
    }
}
