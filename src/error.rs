//! Error types for mvc-dispatch.

use thiserror::Error;

use crate::controller::PipelineStage;

/// Main error type for dispatch operations.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The first path segment names an application source folder.
    #[error("refused: reserved path '{0}'")]
    ReservedPath(String),

    /// No controller could be resolved for the request.
    #[error("no controller for path '{0}'")]
    NoController(String),

    /// The controller has no action for the method and name.
    #[error("no action '{action}' for method {method}")]
    ActionNotFound { method: String, action: String },

    /// An action or lifecycle hook reported a fault.
    #[error("handler fault: {0}")]
    Handler(String),

    /// Session with the given ID was not found.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A cookie value that is not a well-formed session ID.
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),

    /// Session with the given ID already exists.
    #[error("session already exists: {0}")]
    SessionExists(String),

    /// Session injection was attempted without a controller.
    #[error("cannot set session: controller is missing")]
    MissingController,

    /// Session injection was attempted without a request.
    #[error("cannot set session: request is missing")]
    MissingRequest,

    /// A header name or value could not be written to the response.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The response status was already written to the sink.
    #[error("response already written")]
    ResponseCommitted,

    /// Invalid pipeline stage transition attempted.
    #[error("invalid pipeline transition from {from:?} to {to:?}")]
    InvalidStageTransition {
        from: PipelineStage,
        to: PipelineStage,
    },

    /// A session value could not be (de)serialized.
    #[error("session value error: {0}")]
    SessionValue(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,
}

impl DispatchError {
    /// Build a handler fault from any displayable message.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

/// Convenience Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
