//! Session progress context for the lesson dialog.
//!
//! The [`SessionContext`] is everything a host must keep between turns: the
//! lesson content, the current topic index and the awaited [`DialogState`].
//! It is plain serializable data, so a host can store it anywhere that holds
//! JSON and restore it verbatim before the next turn.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DialogError, Result};
use crate::lesson::{Lesson, Topic};
use crate::prompt::ChoicePrompt;

// ============================================================================
// DialogState
// ============================================================================

/// Where the lesson dialog is in its per-topic turn sequence.
///
/// The state transitions through:
/// - `Presenting` -> `AwaitingChoiceAnswer` (topic card sent)
/// - `Presenting` -> `Exhausted` (no topic left at entry)
/// - `AwaitingChoiceAnswer` -> `AwaitingTypedAnswer` (correct choice)
/// - `AwaitingTypedAnswer` -> `AwaitingContinuationChoice` (correct typed answer)
/// - `AwaitingContinuationChoice` -> `Presenting` (next topic, or retries exhausted)
/// - `AwaitingContinuationChoice` -> `Completed` (next after the last topic)
///
/// A wrong answer in either awaiting-answer state goes back to `Presenting`
/// for the same topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogState {
    /// The current topic is about to be presented.
    #[default]
    Presenting,
    /// Waiting for the student to pick one of the topic's answer options.
    AwaitingChoiceAnswer,
    /// Waiting for the student to type the answer.
    AwaitingTypedAnswer,
    /// Waiting for the student to advance or stay on the topic.
    AwaitingContinuationChoice {
        /// The outstanding wrap-up prompt, including its remaining attempts.
        prompt: ChoicePrompt,
    },
    /// The last topic was finished.
    Completed,
    /// There was no topic to present when the dialog started.
    Exhausted,
}

/// The shape of reply a waiting state expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedInput {
    /// The structured payload of a selected answer option.
    AnswerChoice,
    /// Free text containing the answer.
    TypedAnswer,
    /// One of the wrap-up prompt's literal choices, as text.
    ContinuationChoice,
}

impl DialogState {
    /// Returns `true` if the lesson dialog is finished.
    ///
    /// Terminal states are: `Completed`, `Exhausted`.
    ///
    /// # Examples
    ///
    /// ```
    /// use edubot_dialog::DialogState;
    ///
    /// assert!(DialogState::Completed.is_terminal());
    /// assert!(!DialogState::AwaitingTypedAnswer.is_terminal());
    /// ```
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Exhausted)
    }

    /// Returns `true` if the dialog is suspended waiting for the student.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        self.expected_input().is_some()
    }

    /// The kind of reply the current state is waiting for, if any.
    #[must_use]
    pub const fn expected_input(&self) -> Option<ExpectedInput> {
        match self {
            Self::AwaitingChoiceAnswer => Some(ExpectedInput::AnswerChoice),
            Self::AwaitingTypedAnswer => Some(ExpectedInput::TypedAnswer),
            Self::AwaitingContinuationChoice { .. } => Some(ExpectedInput::ContinuationChoice),
            Self::Presenting | Self::Completed | Self::Exhausted => None,
        }
    }

    /// Short snake_case name of the state.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Presenting => "presenting",
            Self::AwaitingChoiceAnswer => "awaiting_choice_answer",
            Self::AwaitingTypedAnswer => "awaiting_typed_answer",
            Self::AwaitingContinuationChoice { .. } => "awaiting_continuation_choice",
            Self::Completed => "completed",
            Self::Exhausted => "exhausted",
        }
    }
}

impl std::fmt::Display for DialogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SessionContext
// ============================================================================

/// Progress of one conversation through one lesson.
///
/// Only the lesson dialog mutates a context; hosts store and restore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// The lesson being taught.
    pub lesson: Lesson,

    /// Index of the current topic; equal to the topic count when none remain.
    pub current_topic_index: usize,

    /// The state awaited by the dialog.
    pub state: DialogState,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,
}

impl SessionContext {
    /// Creates a context at the first topic, about to present it.
    ///
    /// # Examples
    ///
    /// ```
    /// use edubot_dialog::{DialogState, Lesson, SessionContext};
    ///
    /// let ctx = SessionContext::new(Lesson::new("Empty", vec![]));
    /// assert_eq!(ctx.current_topic_index, 0);
    /// assert_eq!(ctx.state, DialogState::Presenting);
    /// assert!(ctx.current_topic().is_none());
    /// ```
    #[must_use]
    pub fn new(lesson: Lesson) -> Self {
        let now = Utc::now();
        Self {
            lesson,
            current_topic_index: 0,
            state: DialogState::Presenting,
            started_at: now,
            updated_at: now,
        }
    }

    /// The topic at the current index, if it exists.
    #[must_use]
    pub fn current_topic(&self) -> Option<&Topic> {
        self.lesson.topic(self.current_topic_index)
    }

    /// Returns `true` if the dialog is finished.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Returns `true` if the dialog is waiting for the student.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        self.state.is_waiting()
    }

    /// Updates the `updated_at` timestamp to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Persists the context as JSON.
    ///
    /// Writes to a temporary file next to `path` and renames it into place,
    /// creating the parent directory if needed.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    /// Restores a context saved with [`SessionContext::save`].
    ///
    /// Returns `Ok(None)` if there is no file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `DialogError::SessionCorrupted` if the file is not a valid
    /// session context.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| DialogError::session_corrupted(path, e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
