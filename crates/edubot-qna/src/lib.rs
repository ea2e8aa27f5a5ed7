//! EduBot QnA client
//!
//! HTTP client for a QnA-Maker-style knowledge base.
//!
//! [`QnaClient`] implements [`edubot_dialog::KnowledgeSource`], so it can be
//! registered with an [`edubot_dialog::ConfidenceRouter`] for a
//! conversational context.

mod client;

pub use client::{QnaClient, ENDPOINT_KEY_ENV};

use edubot_dialog::LookupError;
use thiserror::Error;

/// A specialized `Result` type for knowledge-base operations.
pub type Result<T> = std::result::Result<T, QnaError>;

/// Errors that can occur while querying a knowledge base.
#[derive(Debug, Error)]
pub enum QnaError {
    /// The request could not be sent or its response could not be read.
    #[error("knowledge base request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The knowledge base answered with a non-success status.
    #[error("knowledge base returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body was not a generateAnswer response.
    #[error("invalid knowledge base response: {0}")]
    Decode(String),

    /// No endpoint key was configured or found in the environment.
    #[error("no endpoint key for knowledge base '{knowledge_base_id}': set endpointKey or {env}", env = ENDPOINT_KEY_ENV)]
    MissingEndpointKey {
        /// The knowledge base lacking a key.
        knowledge_base_id: String,
    },
}

impl From<QnaError> for LookupError {
    fn from(err: QnaError) -> Self {
        match err {
            QnaError::Request(_) => Self::Transport(err.to_string()),
            QnaError::HttpStatus { .. } | QnaError::Decode(_) | QnaError::MissingEndpointKey { .. } => {
                Self::Response(err.to_string())
            }
        }
    }
}
