//! Error types for switchyard-core

use crate::router::AttemptRecord;
use thiserror::Error;


/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed record or namespace (rejected, never stored)
    #[error("validation error: {0}")]
    Validation(String),

    /// An ordering operation hit a cycle
    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Cycle members, with the first member repeated at the end
        cycle: Vec<String>,
    },

    /// Resource not registered
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Task id not present in the graph
    #[error("unknown task: {0}")]
    UnknownTask(String),

    /// Every routing candidate was unavailable or failed
    #[error("{}", summarize_attempts(.attempts))]
    RoutingExhausted {
        /// Each candidate with the reason it was skipped
        attempts: Vec<AttemptRecord>,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Build a cycle error, closing the loop for display purposes
    pub(crate) fn cycle(mut members: Vec<String>) -> Self {
        if let Some(first) = members.first().cloned() {
            if members.last() != Some(&first) || members.len() == 1 {
                members.push(first);
            }
        }
        Error::CyclicDependency { cycle: members }
    }

    /// Per-candidate reasons of an exhausted route (empty for other errors)
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            Error::RoutingExhausted { attempts } => attempts,
            _ => &[],
        }
    }

    /// Whether this error reports a dependency cycle
    pub fn is_cycle(&self) -> bool {
        matches!(self, Error::CyclicDependency { .. })
    }
}

fn summarize_attempts(attempts: &[AttemptRecord]) -> String {
    if attempts.is_empty() {
        return "routing failed: no candidates supplied".to_string();
    }
    let details: Vec<String> = attempts
        .iter()
        .map(|a| format!("{} ({})", a.namespace, a.reason))
        .collect();
    format!(
        "routing failed: all {} candidates exhausted: {}",
        attempts.len(),
        details.join("; ")
    )
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
