//! Closed-choice prompt with a capped number of attempts.
//!
//! A [`ChoicePrompt`] is plain data so it can sit inside the persisted
//! session context between turns. Each inbound reply is fed to
//! [`ChoicePrompt::accept`], which either returns the matched choice,
//! asks the caller to re-prompt, or reports that the attempts ran out.

use serde::{Deserialize, Serialize};

use crate::activity::Activity;

/// State of an outstanding closed-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoicePrompt {
    /// Accepted replies, matched literally and case-sensitively.
    pub choices: Vec<String>,

    /// Message shown when the prompt is first presented.
    pub prompt: String,

    /// Message shown after an unrecognized reply.
    pub retry_prompt: String,

    /// Unrecognized replies still tolerated before giving up.
    pub attempts_remaining: u32,
}

/// Result of feeding one reply to a [`ChoicePrompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// The reply matched this choice; the prompt is finished.
    Chosen(String),
    /// The reply was not recognized; show this activity and wait again.
    Retry(Activity),
    /// The reply was not recognized and no attempts remain.
    AttemptsExhausted,
}

impl ChoicePrompt {
    /// Creates a prompt allowing `max_attempts` unrecognized replies.
    ///
    /// The attempt that uses up the last try ends the prompt with
    /// [`PromptOutcome::AttemptsExhausted`] rather than a re-prompt.
    #[must_use]
    pub fn new(
        choices: Vec<String>,
        prompt: impl Into<String>,
        retry_prompt: impl Into<String>,
        max_attempts: u32,
    ) -> Self {
        Self {
            choices,
            prompt: prompt.into(),
            retry_prompt: retry_prompt.into(),
            attempts_remaining: max_attempts,
        }
    }

    /// The activity that first presents the prompt.
    #[must_use]
    pub fn activity(&self) -> Activity {
        Activity::ChoicePrompt {
            prompt: self.prompt.clone(),
            choices: self.choices.clone(),
        }
    }

    /// Matches one reply against the accepted choices.
    ///
    /// A missing reply counts as unrecognized.
    pub fn accept(&mut self, reply: Option<&str>) -> PromptOutcome {
        let matched = reply
            .and_then(|r| self.choices.iter().find(|c| c.as_str() == r))
            .cloned();
        match matched {
            Some(choice) => PromptOutcome::Chosen(choice),
            None => self.reject(),
        }
    }

    /// Consumes one attempt without matching a reply.
    pub fn reject(&mut self) -> PromptOutcome {
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.attempts_remaining == 0 {
            PromptOutcome::AttemptsExhausted
        } else {
            PromptOutcome::Retry(Activity::ChoicePrompt {
                prompt: self.retry_prompt.clone(),
                choices: self.choices.clone(),
            })
        }
    }
}
