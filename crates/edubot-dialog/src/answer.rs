//! Student answers and how they are checked.

use serde::{Deserialize, Serialize};

use crate::lesson::Topic;

/// An answer extracted from an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentResponse {
    /// The answer text as given by the student.
    pub answer: String,
}

impl StudentResponse {
    /// Creates a response from raw answer text.
    #[must_use]
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }

    /// Parses the structured payload attached to a selected answer choice.
    ///
    /// The payload is expected to be an object with a string `answer` field,
    /// as produced by [`crate::Activity::QuestionCard`] choices. Anything else
    /// yields `None`, which the dialog treats as a wrong answer.
    #[must_use]
    pub fn from_choice_payload(payload: &serde_json::Value) -> Option<Self> {
        Self::deserialize(payload).ok()
    }

    /// Builds a response from free text; absent text yields `None`.
    #[must_use]
    pub fn from_text(text: Option<&str>) -> Option<Self> {
        text.map(Self::new)
    }
}

/// Returns `true` if the response matches the topic's correct answer.
///
/// Comparison ignores case using Unicode lowercase mapping, which does not
/// depend on the host locale. An absent response is never correct.
#[must_use]
pub fn is_correct(response: Option<&StudentResponse>, topic: &Topic) -> bool {
    response.is_some_and(|r| eq_ignore_case(&r.answer, &topic.correct_answer))
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
