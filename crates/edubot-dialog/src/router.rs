//! Confidence-gated routing of free-text messages.
//!
//! When no lesson turn is pending, a host passes each message to
//! [`ConfidenceRouter::route`]. The router asks the knowledge source
//! configured for the conversational context and answers only when the
//! score clears the threshold. Everything else, lookup failures included,
//! is reported as unhandled so the host can run its fallback handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::activity::Activity;

/// Default minimum score, exclusive, for a knowledge-base answer.
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Best answer returned by a knowledge source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QnaResult {
    /// Answer text.
    pub answer: String,
    /// Example phrasings the answer was authored for.
    #[serde(default)]
    pub questions: Vec<String>,
    /// Confidence on a 0-100 scale.
    pub score: f64,
}

/// Why a knowledge lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The knowledge source could not be reached.
    #[error("knowledge source unreachable: {0}")]
    Transport(String),
    /// The knowledge source answered with something unusable.
    #[error("unexpected knowledge source response: {0}")]
    Response(String),
}

impl LookupError {
    /// Returns `true` for network-level failures.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// A scored question-answering source.
///
/// Dropping the returned future cancels the lookup.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Looks up the best answer for `text`.
    async fn query(&self, text: &str) -> Result<QnaResult, LookupError>;
}

/// Result of routing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The knowledge source answered; deliver these activities.
    Answered(Vec<Activity>),
    /// Nothing was answered; the fallback handler should run.
    Unhandled,
}

impl RouteOutcome {
    /// Returns `true` if the message was answered.
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}

/// Routes free text to a knowledge source when it is confident enough.
#[derive(Clone)]
pub struct ConfidenceRouter {
    sources: HashMap<String, Arc<dyn KnowledgeSource>>,
    threshold: f64,
}

impl std::fmt::Debug for ConfidenceRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut contexts: Vec<&String> = self.sources.keys().collect();
        contexts.sort();
        f.debug_struct("ConfidenceRouter")
            .field("contexts", &contexts)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl ConfidenceRouter {
    /// Creates a router from a map of context name to knowledge source.
    ///
    /// Answers need a score strictly greater than `threshold`.
    #[must_use]
    pub fn new(sources: HashMap<String, Arc<dyn KnowledgeSource>>, threshold: f64) -> Self {
        Self { sources, threshold }
    }

    /// Returns `true` if `context` has a knowledge source.
    #[must_use]
    pub fn has_source(&self, context: &str) -> bool {
        self.sources.contains_key(context)
    }

    /// The score a result must exceed to be answered.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Routes one message received in `context`.
    ///
    /// Never fails: lookup errors are logged and reported as
    /// [`RouteOutcome::Unhandled`], the same as a low-confidence answer.
    pub async fn route(&self, context: &str, text: &str) -> RouteOutcome {
        let Some(source) = self.sources.get(context) else {
            debug!(context, "No knowledge source for context");
            return RouteOutcome::Unhandled;
        };

        match source.query(text).await {
            Ok(result) if result.score > self.threshold => {
                info!(context, score = result.score, "Answering from knowledge source");
                RouteOutcome::Answered(answer_activities(&result))
            }
            Ok(result) => {
                debug!(
                    context,
                    score = result.score,
                    threshold = self.threshold,
                    "Knowledge source answer below threshold"
                );
                RouteOutcome::Unhandled
            }
            Err(e) if e.is_transport() => {
                warn!(context, error = %e, "Knowledge lookup failed, falling back");
                RouteOutcome::Unhandled
            }
            Err(e) => {
                error!(context, error = %e, "Knowledge lookup failed, falling back");
                RouteOutcome::Unhandled
            }
        }
    }
}

/// Activities sent for a knowledge-base answer.
fn answer_activities(result: &QnaResult) -> Vec<Activity> {
    vec![Activity::text(&result.answer)]
}

// ============================================================================
// Tests
// ============================================================================
