//! Error types for the EduBot dialog crate.
//!
//! Only the edges of the system fail with these errors: loading configuration,
//! loading lesson content, and persisting the session context. Conversation
//! turns never return an error; missing topics, unrecognized input, exhausted
//! retries and knowledge lookup failures are recovered locally.

use std::path::PathBuf;

/// A specialized `Result` type for dialog operations.
pub type Result<T> = std::result::Result<T, DialogError>;

/// Errors that can occur while preparing or persisting a conversation.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your edubot.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Lesson Loading Errors
    // ========================================================================
    /// Lesson file was not found at the specified path.
    #[error("Lesson not found: '{path}'\n\nSuggestion: Check the 'lesson' field in edubot.json or pass a lesson path")]
    LessonNotFound {
        /// Path where the lesson was expected.
        path: PathBuf,
    },

    /// Lesson file is not a valid lesson document.
    #[error("Invalid lesson file '{path}': {message}\n\nSuggestion: A lesson needs 'lesson_title' and 'topics' keys")]
    LessonParseError {
        /// Path to the lesson file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Lesson content breaks an authoring rule.
    #[error("Invalid lesson content: {message}\n\nSuggestion: {suggestion}")]
    InvalidLesson {
        /// Description of the content problem.
        message: String,
        /// Actionable suggestion for the lesson author.
        suggestion: String,
    },

    // ========================================================================
    // Session Persistence Errors
    // ========================================================================
    /// Session file contains malformed JSON that cannot be restored.
    #[error("Corrupted session file '{path}': {message}\n\nSuggestion: Remove the session file to start the lesson fresh")]
    SessionCorrupted {
        /// Path to the corrupted session file.
        path: PathBuf,
        /// Description of the corruption.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DialogError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `LessonNotFound` error.
    #[must_use]
    pub fn lesson_not_found(path: impl Into<PathBuf>) -> Self {
        Self::LessonNotFound { path: path.into() }
    }

    /// Creates a new `LessonParseError`.
    #[must_use]
    pub fn lesson_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::LessonParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidLesson` error.
    #[must_use]
    pub fn invalid_lesson(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidLesson {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `SessionCorrupted` error.
    #[must_use]
    pub fn session_corrupted(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SessionCorrupted {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the error comes from user-editable input files.
    ///
    /// These are the errors a host should report with their suggestion
    /// instead of treating them as internal failures.
    #[must_use]
    pub const fn is_content_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::LessonNotFound { .. }
                | Self::LessonParseError { .. }
                | Self::InvalidLesson { .. }
        )
    }
}
