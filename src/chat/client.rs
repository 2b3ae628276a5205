//! HTTP client for the remote answering service.

use serde::{Deserialize, Serialize};

/// Request body for the answering service's `/query` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's free-text question.
    pub question: String,
    /// Page text selected by the user, empty when none was captured.
    pub selected_text: String,
}

/// Response body from the answering service.
///
/// The service may include additional fields (retrieval sources and the
/// like); only the answer is part of the contract and anything else is
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The computed answer.
    pub answer: String,
}

/// Client for the external question-answering backend.
///
/// The backend is a collaborator whose internals are unspecified here;
/// this client covers only the request/response contract: one
/// `POST /query` per question, no authentication, no retries, and no
/// timeout of its own. Any transport failure or non-2xx status is a
/// uniform failure.
#[derive(Clone)]
pub struct AnswerClient {
    http: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for AnswerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AnswerClient {
    /// Create a client for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Base URL this client targets.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask one question, optionally with selected page text as context.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure, a non-success status, or
    /// a response body without a readable answer.
    pub async fn ask(&self, question: &str, selected_text: &str) -> anyhow::Result<String> {
        let url = format!("{}/query", self.base_url.trim_end_matches('/'));
        let body = QueryRequest {
            question: question.to_string(),
            selected_text: selected_text.to_string(),
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: QueryResponse = resp.json().await?;
        Ok(parsed.answer)
    }
}
