//! Generation backend abstractions and implementations.
//!
//! The gateway talks to its backend through [`RagProvider`], so tests and
//! local runs can swap Vertex AI for the in-process mock.

pub mod mock;
pub mod vertex;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to establish backend session: {0}")]
    Session(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Backend returned no text")]
    EmptyResponse,
}

/// Decoding settings sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub candidate_count: u32,
}

/// Sampling policy of the gateway. Callers cannot change it.
pub const RAG_SAMPLING: SamplingConfig = SamplingConfig {
    temperature: 0.2,
    top_p: 0.8,
    top_k: 40,
    max_output_tokens: 500,
    candidate_count: 1,
};

/// Retrieval tool binding; the backend grounds its answer in this corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalTool {
    pub rag_corpus: String,
}

/// Fully assembled generation call. Never exposed to HTTP callers.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub sampling: SamplingConfig,
    pub retrieval: RetrievalTool,
}

/// Result of a provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Text of the primary candidate, if any.
    pub text: Option<String>,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    /// Finish reason.
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn from_api(reason: Option<&str>) -> Self {
        match reason {
            None | Some("STOP") | Some("FINISH_REASON_UNSPECIFIED") => FinishReason::Complete,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") | Some("SPII") => {
                FinishReason::ContentFilter
            }
            Some(_) => FinishReason::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other => "other",
        }
    }
}

/// A retrieval-augmented text generation backend.
#[async_trait]
pub trait RagProvider: Send + Sync {
    /// Run one generation call. Implementations must not retry.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<ProviderResponse, ProviderError>;

    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;
}
