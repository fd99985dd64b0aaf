//! Remote document service.
//!
//! [`DocumentService`] is the only seam between the workspace and the
//! backend. [`HttpDocumentService`] is the production implementation; tests
//! supply scripted implementations.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::types::{DocumentId, FlowItem};

/// Body of one chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(rename = "documentList")]
    pub document_ids: Vec<DocumentId>,
    /// Full conversation including the new question, JSON-encoded.
    pub history: String,
    pub question: String,
}

/// Answer to a chat turn. `text` is optional on the wire; the chat
/// controller treats a missing or empty text as a failed turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub text: Option<String>,
}

/// Operations the workspace needs from the backend.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Runs the AI analysis and returns the model's raw JSON text.
    async fn analyze(&self, document_ids: &[DocumentId]) -> Result<String, ServiceError>;

    /// Builds the document-relationship timeline.
    async fn fetch_flow(&self, document_ids: &[DocumentId]) -> Result<Vec<FlowItem>, ServiceError>;

    /// Answers one chat question in the context of the documents.
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ServiceError>;
}

/// Connection settings for [`HttpDocumentService`].
#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
}

/// `reqwest`-backed client for the REST backend.
#[derive(Debug, Clone)]
pub struct HttpDocumentService {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentListBody<'a> {
    document_list: &'a [DocumentId],
}

#[derive(Deserialize)]
struct AnalyzeEnvelope {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Deserialize)]
struct ChatEnvelope {
    answer: Option<String>,
}

impl HttpDocumentService {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] if the TLS backend cannot be initialised.
    pub fn new(config: HttpServiceConfig) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            token: config.token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        name: &'static str,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ServiceError> {
        let mut request = self.client.post(self.endpoint(path)).json(body);
        if let Some(token) = &self.token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("basic:{token}"));
        }
        let response = request.send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ServiceError::Status {
                endpoint: name,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn analyze(&self, document_ids: &[DocumentId]) -> Result<String, ServiceError> {
        let body = DocumentListBody { document_list: document_ids };
        let envelope: AnalyzeEnvelope = self.post("Analyze API", "aiAnalyze", &body).await?.json().await?;
        first_candidate_text(envelope)
    }

    async fn fetch_flow(&self, document_ids: &[DocumentId]) -> Result<Vec<FlowItem>, ServiceError> {
        let body = DocumentListBody { document_list: document_ids };
        Ok(self.post("Flow API", "aiFlow", &body).await?.json().await?)
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ServiceError> {
        let envelope: ChatEnvelope = self.post("LLM API", "aiChat", &request).await?.json().await?;
        Ok(ChatReply { text: envelope.answer })
    }
}

fn first_candidate_text(envelope: AnalyzeEnvelope) -> Result<String, ServiceError> {
    envelope
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| ServiceError::InvalidResponse("Invalid response format from Analyze API".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_first_candidate() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"summary\":\"S\"}"}]}}]}"#;
        let envelope: AnalyzeEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(first_candidate_text(envelope).unwrap(), r#"{"summary":"S"}"#);
    }

    #[test]
    fn missing_candidates_is_invalid() {
        let envelope: AnalyzeEnvelope = serde_json::from_str("{}").unwrap();
        let err = first_candidate_text(envelope).unwrap_err();
        assert_eq!(err.to_string(), "Invalid response format from Analyze API");
    }

    #[test]
    fn chat_request_uses_backend_field_names() {
        let request = ChatRequest {
            document_ids: vec![1, 2],
            history: "[]".into(),
            question: "why?".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["documentList"], serde_json::json!([1, 2]));
        assert_eq!(json["question"], "why?");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let service = HttpDocumentService::new(HttpServiceConfig {
            base_url: "http://localhost:8080/api/".into(),
            token: None,
            timeout: None,
        })
        .unwrap();
        assert_eq!(service.endpoint("aiFlow"), "http://localhost:8080/api/aiFlow");
    }
}
