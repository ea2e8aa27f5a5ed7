//! Messages exchanged with the conversation host.
//!
//! The dialog never talks to a transport directly. Each turn takes one
//! [`InboundMessage`] and returns the [`Activity`] values the host should
//! deliver, in order.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// One inbound message from the student.
///
/// Mirrors a transport activity: free text, a structured payload from a
/// selected card action, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Free text typed by the student.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Structured payload attached to a selected action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl InboundMessage {
    /// A message carrying only free text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            value: None,
        }
    }

    /// A message carrying the payload of a selected answer choice.
    #[must_use]
    pub fn choice(answer: impl Into<String>) -> Self {
        let answer = answer.into();
        Self {
            value: Some(answer_payload(&answer)),
            text: Some(answer),
        }
    }

    /// A message carrying an arbitrary structured payload.
    #[must_use]
    pub fn value(value: serde_json::Value) -> Self {
        Self {
            text: None,
            value: Some(value),
        }
    }
}

/// Payload attached to each answer choice of a question card.
#[must_use]
pub fn answer_payload(answer: &str) -> serde_json::Value {
    json!({ "answer": answer })
}

/// A selectable action on a question card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardChoice {
    /// Label shown to the student.
    pub title: String,
    /// Payload sent back when the choice is selected.
    pub value: serde_json::Value,
}

/// Output the host must deliver to the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Activity {
    /// Plain text message.
    Text {
        /// Message body.
        text: String,
    },
    /// A topic's question with its image and selectable answers.
    QuestionCard {
        /// Question text.
        question: String,
        /// Image shown with the question.
        image_url: String,
        /// One action per answer option, in presentation order.
        choices: Vec<CardChoice>,
    },
    /// A closed-choice prompt; the reply is matched against `choices`.
    ChoicePrompt {
        /// Prompt text.
        prompt: String,
        /// Accepted replies.
        choices: Vec<String>,
    },
    /// Text to display together with speech to play back.
    Speak {
        /// Displayed text.
        text: String,
        /// Text to synthesize.
        speak: String,
    },
}

impl Activity {
    /// Creates a plain text activity.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Returns the text body of a `Text` activity.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}
