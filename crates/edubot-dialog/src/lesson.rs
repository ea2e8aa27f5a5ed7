//! Lesson content for the EduBot dialog.
//!
//! A [`Lesson`] is an ordered list of [`Topic`]s. The order of `topics` is
//! the order in which the lesson dialog walks through them. Lesson values are
//! read-only once loaded; progress through a lesson is tracked separately in
//! the session context.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DialogError, Result};

/// A lesson: a title plus an ordered sequence of topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Display title of the lesson.
    #[serde(rename = "lesson_title")]
    pub title: String,

    /// Topics in presentation order.
    pub topics: Vec<Topic>,
}

/// One question/answer unit within a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Question shown on the topic card.
    pub question: String,

    /// Image shown below the question.
    pub image_url: String,

    /// Selectable answers, unique, in presentation order.
    pub answer_options: Vec<String>,

    /// The expected answer, compared case-insensitively.
    pub correct_answer: String,

    /// Feedback sent after a correct answer.
    pub correct_answer_response: String,

    /// Feedback sent after a wrong or missing answer.
    pub wrong_answer_response: String,

    /// Instruction sent before the correct answer is spoken aloud.
    pub pronunciation_phrase: String,

    /// Continuation choice that advances to the next topic.
    pub next_topic_phrase: String,

    /// Continuation choice that repeats the pronunciation step.
    pub stay_on_topic_phrase: String,
}

impl Topic {
    /// Returns `true` if `correct_answer` matches one of the answer options.
    #[must_use]
    pub fn has_matching_option(&self) -> bool {
        let expected = self.correct_answer.to_lowercase();
        self.answer_options
            .iter()
            .any(|option| option.to_lowercase() == expected)
    }
}

impl Lesson {
    /// Creates a lesson from a title and topics.
    #[must_use]
    pub fn new(title: impl Into<String>, topics: Vec<Topic>) -> Self {
        Self {
            title: title.into(),
            topics,
        }
    }

    /// Loads and validates a lesson from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `DialogError::LessonNotFound` if the file doesn't exist.
    /// Returns `DialogError::LessonParseError` if the file is not a lesson document.
    /// Returns `DialogError::InvalidLesson` if the content breaks an authoring rule.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DialogError::lesson_not_found(path)
            } else {
                DialogError::Io(e)
            }
        })?;
        Self::from_json(path, &contents)
    }

    /// Parses and validates a lesson from JSON text.
    ///
    /// `origin` is only used in error messages.
    pub fn from_json(origin: impl AsRef<Path>, contents: &str) -> Result<Self> {
        let lesson: Self = serde_json::from_str(contents)
            .map_err(|e| DialogError::lesson_parse(origin.as_ref(), e.to_string()))?;
        lesson.validate()?;
        Ok(lesson)
    }

    /// Checks the authoring rules the dialog relies on.
    ///
    /// A `correct_answer` that matches none of the options is only logged:
    /// such a topic can never be answered correctly, but the dialog still
    /// behaves predictably with it.
    ///
    /// # Errors
    ///
    /// Returns `DialogError::InvalidLesson` for a topic with no options,
    /// duplicate options, or identical continuation phrases.
    pub fn validate(&self) -> Result<()> {
        for (index, topic) in self.topics.iter().enumerate() {
            let number = index + 1;

            if topic.answer_options.is_empty() {
                return Err(DialogError::invalid_lesson(
                    format!("topic {number} has no answer options"),
                    "Give every topic at least one entry in 'answer_options'",
                ));
            }

            let mut seen = HashSet::new();
            if let Some(duplicate) = topic
                .answer_options
                .iter()
                .find(|option| !seen.insert(option.as_str()))
            {
                return Err(DialogError::invalid_lesson(
                    format!("topic {number} lists answer option '{duplicate}' more than once"),
                    "Remove the duplicate from 'answer_options'",
                ));
            }

            if topic.next_topic_phrase == topic.stay_on_topic_phrase {
                return Err(DialogError::invalid_lesson(
                    format!("topic {number} uses the same phrase to advance and to stay"),
                    "Make 'next_topic_phrase' and 'stay_on_topic_phrase' different",
                ));
            }

            if !topic.has_matching_option() {
                warn!(
                    topic = number,
                    correct_answer = %topic.correct_answer,
                    "Correct answer matches none of the answer options"
                );
            }
        }
        Ok(())
    }

    /// Returns the topic at `index`, if any.
    #[must_use]
    pub fn topic(&self, index: usize) -> Option<&Topic> {
        self.topics.get(index)
    }

    /// Number of topics in the lesson.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Returns `true` if `index` is the final topic.
    #[must_use]
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.topics.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
