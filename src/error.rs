use thiserror::Error;

/// Unified error type for git-lifecycle operations
///
/// Every variant is terminal for the current invocation: nothing in the
/// library retries or recovers, the CLI prints the error and exits with 1.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("State error: {0}")]
    State(String),

    #[error(
        "Merge conflict while merging into '{target}': {}. Resolve the conflicts manually and finish the merge with git",
        .paths.join(", ")
    )]
    MergeConflict { target: String, paths: Vec<String> },

    #[error("Command failed: {command}: {message}")]
    CommandExecution {
        command: String,
        message: String,
        /// Last command of the same flush that completed before the failure
        last_success: Option<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results in git-lifecycle
pub type Result<T> = std::result::Result<T, LifecycleError>;

impl LifecycleError {
    /// Create a configuration error with context
    pub fn configuration(msg: impl Into<String>) -> Self {
        LifecycleError::Configuration(msg.into())
    }

    /// Create a validation error with context
    pub fn validation(msg: impl Into<String>) -> Self {
        LifecycleError::Validation(msg.into())
    }

    /// Create a state error with context
    pub fn state(msg: impl Into<String>) -> Self {
        LifecycleError::State(msg.into())
    }

    /// Create an execution error for a backend call that failed outside a queue flush
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        LifecycleError::CommandExecution {
            command: command.into(),
            message: message.into(),
            last_success: None,
        }
    }

    /// Wrap a libgit2 failure of a structural query
    pub fn query(operation: &str, err: git2::Error) -> Self {
        LifecycleError::command(operation, err.message())
    }
}
