//! Centralized error type for the review-orchestration core.
//!
//! All fallible operations return [`Result`]; library code never panics
//! outside of genuinely unreachable invariant violations in test code.

use thiserror::Error;

/// Primary error type for `review_core`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ---- user errors (§7: reported synchronously, never affect task phase) ----
    /// No task exists with the given id.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// No document exists with the given id on the given task.
    #[error("document not found: task={task}, document={document}")]
    DocumentNotFound { task: String, document: String },

    /// No diff exists with the given id on the given task.
    #[error("diff not found: task={task}, diff={diff}")]
    DiffNotFound { task: String, diff: String },

    /// A command requires a phase the task is not currently in.
    #[error("invalid phase for task {task}: expected {expected}, was {actual}")]
    InvalidPhase {
        task: String,
        expected: String,
        actual: String,
    },

    /// `resume` was called while pending diffs still lack a decision.
    #[error("approval incomplete for task {task}: {missing} diff(s) undecided")]
    ApprovalIncomplete { task: String, missing: usize },

    /// A decision was submitted for a diff that is not `pending`.
    #[error("diff {diff} is not pending (status: {status})")]
    DiffNotPending { diff: String, status: String },

    /// Request body / arguments failed structural or semantic validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // ---- skill dispatcher errors (§4.A) ----
    /// `call` referenced a skill id that was never registered.
    #[error("skill not registered: {0}")]
    SkillNotRegistered(String),

    /// `register` was called twice for the same skill id in one process.
    #[error("skill already registered: {0}")]
    DuplicateSkill(String),

    /// Skill input failed the registration's input schema.
    #[error("skill input invalid for {skill}: {reason}")]
    InputInvalid { skill: String, reason: String },

    /// Skill output failed the registration's output schema.
    #[error("skill output invalid for {skill}: {reason}")]
    OutputInvalid { skill: String, reason: String },

    /// The remote workflow backend could not be reached (after retry bound).
    #[error("skill backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Skill exceeded its configured timeout.
    #[error("skill timed out: {0}")]
    SkillTimeout(String),

    /// Skill handler returned a domain-logic failure.
    #[error("skill execution failed: {0}")]
    SkillExecutionFailed(String),

    /// A remote skill call was throttled by the per-target rate limiter.
    #[error("rate limit exceeded for remote skill target: {0}")]
    RateLimited(String),

    // ---- structural errors (§7: task -> failed) ----
    /// `start_review` was called without a primary document.
    #[error("task {0} has no primary document")]
    MissingPrimaryDocument(String),

    /// The parser collaborator failed to produce a `DocumentStructure`.
    #[error("document structure parse failed: {0}")]
    StructureParseFailed(String),

    /// A persisted `MachineSnapshot` could not be deserialized or was internally inconsistent.
    #[error("snapshot corrupted for task {task}: {reason}")]
    SnapshotCorrupted { task: String, reason: String },

    // ---- infrastructure errors ----
    /// The persistence adapter failed a read or write.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic I/O failure (filesystem, network).
    #[error("I/O error: {0}")]
    Io(String),

    /// Catch-all for conditions that should not occur in normal operation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout `review_core`.
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[cfg(feature = "storage")]
impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::BackendUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_actionable() {
        let err = Error::TaskNotFound("t-1".into());
        assert_eq!(err.to_string(), "task not found: t-1");

        let err = Error::ApprovalIncomplete {
            task: "t-1".into(),
            missing: 2,
        };
        assert!(err.to_string().contains("2 diff(s)"));
    }

    #[test]
    fn errors_are_cloneable_and_comparable() {
        let a = Error::TaskNotFound("t-1".into());
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Error::TaskNotFound("t-2".into()));
    }

    #[test]
    fn json_error_converts_to_serialization_variant() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = json_err.into();
        matches!(err, Error::Serialization(_));
    }
}
