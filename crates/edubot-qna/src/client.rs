//! Knowledge-base client for EduBot.
//!
//! Queries the `generateAnswer` runtime endpoint of a QnA-Maker-style
//! knowledge base and returns its top answer.

use async_trait::async_trait;
use edubot_dialog::{KnowledgeBaseConfig, KnowledgeSource, LookupError, QnaResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{QnaError, Result};

/// Environment variable holding the endpoint key when the config has none.
pub const ENDPOINT_KEY_ENV: &str = "EDUBOT_QNA_ENDPOINT_KEY";

/// Client for one knowledge base.
///
/// # Example
///
/// ```no_run
/// use edubot_qna::QnaClient;
///
/// # async fn example() -> Result<(), edubot_qna::QnaError> {
/// let client = QnaClient::new("https://my-kb.azurewebsites.net/qnamaker", "kb-id", "key");
/// let result = client.generate_answer("What is a noun?").await?;
/// println!("{} ({})", result.answer, result.score);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QnaClient {
    http: reqwest::Client,
    endpoint: String,
    knowledge_base_id: String,
    endpoint_key: String,
}

impl QnaClient {
    /// Creates a client for the knowledge base at `endpoint`.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        knowledge_base_id: impl Into<String>,
        endpoint_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            knowledge_base_id: knowledge_base_id.into(),
            endpoint_key: endpoint_key.into(),
        }
    }

    /// Creates a client from configuration.
    ///
    /// Uses the configured endpoint key, or [`ENDPOINT_KEY_ENV`] when the
    /// configuration has none.
    ///
    /// # Errors
    ///
    /// Returns [`QnaError::MissingEndpointKey`] if neither provides a key.
    pub fn from_config(config: &KnowledgeBaseConfig) -> Result<Self> {
        let key = config
            .endpoint_key
            .clone()
            .or_else(|| std::env::var(ENDPOINT_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| QnaError::MissingEndpointKey {
                knowledge_base_id: config.knowledge_base_id.clone(),
            })?;
        Ok(Self::new(
            &config.endpoint,
            &config.knowledge_base_id,
            key,
        ))
    }

    /// Replaces the underlying HTTP client, e.g. to set timeouts.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// The `generateAnswer` URL of this knowledge base.
    #[must_use]
    pub fn generate_answer_url(&self) -> String {
        format!(
            "{}/knowledgebases/{}/generateAnswer",
            self.endpoint.trim_end_matches('/'),
            self.knowledge_base_id
        )
    }

    /// Asks the knowledge base for its best answer to `question`.
    ///
    /// An empty answer list yields a result with an empty answer and a
    /// score of zero.
    ///
    /// # Errors
    ///
    /// Returns [`QnaError::Request`] if the request cannot be completed,
    /// [`QnaError::HttpStatus`] for a non-success status, and
    /// [`QnaError::Decode`] for an unreadable body.
    #[instrument(skip(self, question), fields(kb = %self.knowledge_base_id))]
    pub async fn generate_answer(&self, question: &str) -> Result<QnaResult> {
        let response = self
            .http
            .post(self.generate_answer_url())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("EndpointKey {}", self.endpoint_key),
            )
            .json(&GenerateAnswerRequest { question, top: 1 })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(QnaError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateAnswerResponse =
            serde_json::from_str(&body).map_err(|e| QnaError::Decode(e.to_string()))?;
        let result = parsed
            .answers
            .into_iter()
            .next()
            .map_or_else(empty_result, |a| QnaResult {
                answer: a.answer,
                questions: a.questions,
                score: a.score,
            });

        debug!(score = result.score, "Knowledge base answered");
        Ok(result)
    }
}

#[async_trait]
impl KnowledgeSource for QnaClient {
    async fn query(&self, text: &str) -> std::result::Result<QnaResult, LookupError> {
        self.generate_answer(text).await.map_err(LookupError::from)
    }
}

fn empty_result() -> QnaResult {
    QnaResult {
        answer: String::new(),
        questions: Vec::new(),
        score: 0.0,
    }
}

#[derive(Debug, Serialize)]
struct GenerateAnswerRequest<'a> {
    question: &'a str,
    top: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateAnswerResponse {
    #[serde(default)]
    answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
struct Answer {
    answer: String,
    #[serde(default)]
    questions: Vec<String>,
    score: f64,
}

// ============================================================================
// Tests
// ============================================================================
