//! # Error Taxonomy
//!
//! The error kinds used across the orchestration core, with the propagation policy
//! described there: persistence errors fail the calling operation;
//! worker/cancellation errors terminate a run and are recorded on the
//! Task; notifier errors are absorbed internally by the Notifier and
//! never reach this enum at all.

use thiserror::Error;

/// Result alias used throughout the orchestration core.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Malformed request or missing context input. Does not create a
    /// Task if raised before creation; if raised after, the caller is
    /// responsible for marking the Task `failed`.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Task id, service name, step name, or handler type unknown.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Any exception raised from inside a step or background worker.
    #[error("worker failed: {0}")]
    Worker(String),

    /// A `WorkerError` subtype signaling cooperative stop.
    #[error("cancelled: {0}")]
    Cancellation(String),

    /// Store read/write failure. The offending operation fails
    /// atomically: no cache mutation, no event emission.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceFailure),

    /// Send to a particular observer failed. Handled internally by the
    /// Notifier via pruning — this variant exists so call sites that
    /// *do* need to observe it (e.g. `send_snapshot`) can propagate it.
    #[error("notifier error: {0}")]
    Notifier(String),
}

impl OrchestrationError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    pub fn cancellation(msg: impl Into<String>) -> Self {
        Self::Cancellation(msg.into())
    }

    pub fn notifier(msg: impl Into<String>) -> Self {
        Self::Notifier(msg.into())
    }

    /// Whether this error, recorded on a Task, should drive the Task to
    /// `cancelled` rather than `failed`.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancellation(_))
    }
}

/// Underlying store failure, kept distinct from [`OrchestrationError`]
/// so a `TaskStore` implementation can be written against a narrow
/// error type and converted once at the boundary.
#[derive(Debug, Error)]
pub enum PersistenceFailure {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "web-api")]
mod web {
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use serde_json::json;

    use super::OrchestrationError;

    impl IntoResponse for OrchestrationError {
        fn into_response(self) -> Response {
            let status = match &self {
                OrchestrationError::Validation(_) => StatusCode::BAD_REQUEST,
                OrchestrationError::NotFound { .. } => StatusCode::NOT_FOUND,
                OrchestrationError::Worker(_)
                | OrchestrationError::Cancellation(_)
                | OrchestrationError::Persistence(_)
                | OrchestrationError::Notifier(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let body = Json(json!({ "error": self.to_string() }));
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_constructor() {
        let err = OrchestrationError::validation("missing type");
        assert!(matches!(err, OrchestrationError::Validation(m) if m == "missing type"));
    }

    #[test]
    fn not_found_constructor_and_display() {
        let err = OrchestrationError::not_found("task", "abc123");
        assert_eq!(format!("{err}"), "task not found: abc123");
    }

    #[test]
    fn cancellation_is_detected() {
        let err = OrchestrationError::cancellation("stopped");
        assert!(err.is_cancellation());
        let err = OrchestrationError::worker("boom");
        assert!(!err.is_cancellation());
    }

    #[test]
    fn persistence_failure_converts_from_sqlx() {
        let sqlx_err = sqlx::Error::RowNotFound;
        let failure: PersistenceFailure = sqlx_err.into();
        let err: OrchestrationError = failure.into();
        assert!(matches!(err, OrchestrationError::Persistence(_)));
    }

    #[test]
    fn notifier_errors_never_mark_a_task_failed_elsewhere() {
        // Notifier errors are a distinct variant precisely so callers
        // can choose to swallow them without confusing
        // them with WorkerError, which does mark a Task failed.
        let err = OrchestrationError::notifier("peer gone");
        assert!(!err.is_cancellation());
        assert_eq!(format!("{err}"), "notifier error: peer gone");
    }
}
