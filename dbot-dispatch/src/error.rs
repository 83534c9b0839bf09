//! Error types for registration, lifecycle and context data operations.
//!
//! Callback failures are plain [`anyhow::Error`]s and never surface here: the dispatch loop
//! routes them to the error-handler chain.

use dbot_core::DbotError;
use thiserror::Error;

/// Invalid handler construction or registration.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Command `{0}` is not a valid bot command")]
    InvalidCommand(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Handler is already registered in group {0}")]
    DuplicateHandler(i32),

    #[error("Group {0} does not exist")]
    UnknownGroup(i32),

    #[error("Handler is not registered in group {0}")]
    HandlerNotInGroup(i32),
}

/// Application state transition attempted from the wrong state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("This Application was not initialized via `initialize`")]
    NotInitialized,

    #[error("This Application is already running")]
    AlreadyRunning,

    #[error("This Application is not running")]
    NotRunning,

    #[error("This Application is still running")]
    StillRunning,
}

/// Invalid arguments to `migrate_chat_data`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationError {
    #[error("Message and chat_id pair are mutually exclusive")]
    Conflicting,

    #[error("chat_id pair or message must be passed")]
    Missing,

    #[error("Invalid message: it must have either `migrate_from_chat_id` or `migrate_to_chat_id`")]
    NotMigrationMessage,

    #[error("old_chat_id and new_chat_id must both be given")]
    IncompleteIds,
}

/// Top-level error of the dispatch crate.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("Bot error: {0}")]
    Bot(#[from] DbotError),

    #[error("Invalid application config: {0}")]
    Config(String),

    #[error("Update queue is closed")]
    QueueClosed,

    #[error("{hook} hook failed: {error:#}")]
    Hook {
        hook: &'static str,
        error: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, DispatchError>;
