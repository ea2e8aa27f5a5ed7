//! Configuration types for EduBot.
//!
//! Configuration lives in an optional `edubot.json` file. Every key has a
//! default, so a missing file yields a working configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DialogError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "edubot.json";

/// Default lesson file path.
fn default_lesson() -> String {
    "lesson.json".to_string()
}

/// Default session file path.
fn default_state_file() -> String {
    ".edubot/session.json".to_string()
}

/// Default number of unrecognized replies tolerated by the topic wrap-up prompt.
const fn default_continuation_attempts() -> u32 {
    2
}

/// Default minimum knowledge-base score, exclusive, on a 0-100 scale.
const fn default_qna_threshold() -> f64 {
    80.0
}

/// Default conversational context name used for routing.
fn default_router_context() -> String {
    "default".to_string()
}

fn default_no_more_lessons() -> String {
    "There are no more lessons for you right now. Come back later!".to_string()
}

fn default_lesson_complete() -> String {
    "This is the end of the current lesson. Thank you!".to_string()
}

fn default_topic_wrap_up() -> String {
    "This marks the end of current topic!".to_string()
}

fn default_retry_prompt() -> String {
    "I am sorry but I didn't understand that. I need you to select one of the options below"
        .to_string()
}

fn default_fallback() -> String {
    "Sorry, I did not understand that.".to_string()
}

/// Main configuration for EduBot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Path to the lesson file.
    #[serde(default = "default_lesson")]
    pub lesson: String,

    /// Path where the session context is persisted between turns.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Unrecognized replies tolerated by the topic wrap-up prompt.
    #[serde(default = "default_continuation_attempts")]
    pub continuation_attempts: u32,

    /// Knowledge-base answers need a score strictly above this value.
    #[serde(default = "default_qna_threshold")]
    pub qna_threshold: f64,

    /// Conversational context whose knowledge base answers free text.
    #[serde(default = "default_router_context")]
    pub router_context: String,

    /// Fixed messages sent by the dialog.
    #[serde(default)]
    pub messages: Messages,

    /// Knowledge bases keyed by conversational context name.
    #[serde(default)]
    pub knowledge_bases: BTreeMap<String, KnowledgeBaseConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lesson: default_lesson(),
            state_file: default_state_file(),
            continuation_attempts: default_continuation_attempts(),
            qna_threshold: default_qna_threshold(),
            router_context: default_router_context(),
            messages: Messages::default(),
            knowledge_bases: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `edubot.json` in the current directory. If not found,
    /// returns the default configuration.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            DialogError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `edubot.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `DialogError::ConfigParseError` if the file cannot be read or
    /// contains invalid JSON.
    ///
    /// Returns `DialogError::ConfigValidationError` if a value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(DialogError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| DialogError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `DialogError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.lesson.trim().is_empty() {
            return Err(DialogError::config_validation(
                "lesson path must not be empty",
                "Provide a valid lesson file path in your edubot.json",
            ));
        }

        if self.state_file.trim().is_empty() {
            return Err(DialogError::config_validation(
                "stateFile must not be empty",
                "Provide a path for the session file in your edubot.json",
            ));
        }

        if self.continuation_attempts == 0 {
            return Err(DialogError::config_validation(
                "continuationAttempts must be greater than 0",
                "Set continuationAttempts to at least 1 in your edubot.json",
            ));
        }

        if !(0.0..=100.0).contains(&self.qna_threshold) {
            return Err(DialogError::config_validation(
                format!(
                    "qnaThreshold must be between 0 and 100, got {}",
                    self.qna_threshold
                ),
                "Knowledge-base scores use a 0-100 scale; the usual threshold is 80",
            ));
        }

        for (context, kb) in &self.knowledge_bases {
            kb.validate(context)?;
        }

        Ok(())
    }

    /// Returns the dialog settings derived from this configuration.
    #[must_use]
    pub fn dialog_settings(&self) -> DialogSettings {
        DialogSettings {
            continuation_attempts: self.continuation_attempts,
            messages: self.messages.clone(),
        }
    }
}

/// Fixed messages sent by the lesson dialog and the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Messages {
    /// Sent when a session starts with no topic left to present.
    #[serde(default = "default_no_more_lessons")]
    pub no_more_lessons: String,

    /// Sent after the last topic is finished.
    #[serde(default = "default_lesson_complete")]
    pub lesson_complete: String,

    /// Prompt of the topic wrap-up choice.
    #[serde(default = "default_topic_wrap_up")]
    pub topic_wrap_up: String,

    /// Re-prompt after an unrecognized wrap-up reply.
    #[serde(default = "default_retry_prompt")]
    pub retry_prompt: String,

    /// Sent by the host when nothing else handled a message.
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            no_more_lessons: default_no_more_lessons(),
            lesson_complete: default_lesson_complete(),
            topic_wrap_up: default_topic_wrap_up(),
            retry_prompt: default_retry_prompt(),
            fallback: default_fallback(),
        }
    }
}

/// Connection details for one knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfig {
    /// Base URL of the knowledge-base runtime, e.g. `https://my-kb.azurewebsites.net/qnamaker`.
    pub endpoint: String,

    /// Identifier of the knowledge base.
    pub knowledge_base_id: String,

    /// Endpoint key; read from the environment when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_key: Option<String>,
}

impl KnowledgeBaseConfig {
    fn validate(&self, context: &str) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(DialogError::config_validation(
                format!("knowledgeBases.{context}.endpoint must be an http(s) URL"),
                "Use the runtime endpoint shown in your knowledge-base publish settings",
            ));
        }

        if self.knowledge_base_id.trim().is_empty() {
            return Err(DialogError::config_validation(
                format!("knowledgeBases.{context}.knowledgeBaseId must not be empty"),
                "Copy the knowledge base id from your publish settings",
            ));
        }

        Ok(())
    }
}

/// Settings the lesson dialog needs from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSettings {
    /// Unrecognized replies tolerated by the topic wrap-up prompt.
    pub continuation_attempts: u32,
    /// Fixed dialog messages.
    pub messages: Messages,
}

impl Default for DialogSettings {
    fn default() -> Self {
        Config::default().dialog_settings()
    }
}

// ============================================================================
// Tests
// ============================================================================
