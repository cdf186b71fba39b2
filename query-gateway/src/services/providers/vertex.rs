//! Vertex AI provider implementation.
//!
//! Calls `generateContent` with a Vertex RAG store retrieval tool so answers
//! are grounded in the configured corpus. Every call opens its own session:
//! a bearer token is taken from configuration or fetched from the GCE
//! metadata server.

use super::{
    FinishReason, GenerationRequest, ProviderError, ProviderResponse, RagProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vertex provider configuration.
#[derive(Debug)]
pub struct VertexConfig {
    pub project: String,
    pub location: String,
    /// Overrides the regional endpoint; used for private endpoints and tests.
    pub api_endpoint: Option<String>,
    pub access_token: Option<SecretString>,
    pub metadata_token_url: String,
    pub request_timeout: Option<Duration>,
}

/// Vertex AI RAG provider.
pub struct VertexRagProvider {
    config: VertexConfig,
    client: Client,
}

impl VertexRagProvider {
    pub fn new(config: VertexConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { config, client })
    }

    fn base_url(&self) -> String {
        match &self.config.api_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None if self.config.location == "global" => {
                "https://aiplatform.googleapis.com".to_string()
            }
            None => format!("https://{}-aiplatform.googleapis.com", self.config.location),
        }
    }

    /// Build the `generateContent` URL for a model.
    ///
    /// Bare model ids resolve to Google publisher models; full resource names
    /// (`projects/...`) are used as given.
    fn api_url(&self, model: &str) -> String {
        let base = self.base_url();
        if model.starts_with("projects/") {
            return format!("{}/v1/{}:generateContent", base, model);
        }

        let model_path = if model.starts_with("publishers/") {
            model.to_string()
        } else {
            format!("publishers/google/models/{}", model)
        };

        format!(
            "{}/v1/projects/{}/locations/{}/{}:generateContent",
            base, self.config.project, self.config.location, model_path
        )
    }

    fn check_configured(&self, request: &GenerationRequest) -> Result<(), ProviderError> {
        let missing: Vec<&str> = [
            ("project", self.config.project.as_str()),
            ("region", self.config.location.as_str()),
            ("model", request.model.as_str()),
            ("rag corpus", request.retrieval.rag_corpus.as_str()),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(format!(
                "missing {}",
                missing.join(", ")
            )))
        }
    }

    /// Obtain a bearer token for this call.
    async fn access_token(&self) -> Result<String, ProviderError> {
        if let Some(token) = &self.config.access_token {
            return Ok(token.expose_secret().clone());
        }

        let response = self
            .client
            .get(&self.config.metadata_token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| ProviderError::Session(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Session(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| ProviderError::Session(format!("invalid token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(ProviderError::Session("empty access token".to_string()));
        }

        Ok(token.access_token)
    }

    fn build_body(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                    thought: None,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.sampling.temperature,
                top_p: request.sampling.top_p,
                top_k: request.sampling.top_k,
                max_output_tokens: request.sampling.max_output_tokens,
                candidate_count: request.sampling.candidate_count,
            },
            tools: vec![Tool {
                retrieval: Retrieval {
                    vertex_rag_store: VertexRagStore {
                        rag_resources: vec![RagResource {
                            rag_corpus: request.retrieval.rag_corpus.clone(),
                        }],
                    },
                },
            }],
        }
    }
}

#[async_trait]
impl RagProvider for VertexRagProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        self.check_configured(request)?;
        let token = self.access_token().await?;

        let url = self.api_url(&request.model);
        let body = Self::build_body(request);

        tracing::debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "Sending request to Vertex AI"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Vertex AI API error {}: {}",
                status,
                error_text.trim()
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        if api_response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
            .is_some()
        {
            return Err(ProviderError::ContentFiltered);
        }

        let candidate = api_response.candidates.first();

        let finish_reason =
            FinishReason::from_api(candidate.and_then(|c| c.finish_reason.as_deref()));
        if finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentFiltered);
        }

        // Concatenate the answer parts of the primary candidate, skipping thoughts.
        let text: String = candidate
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought.unwrap_or(false))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default();

        let usage = api_response.usage_metadata.unwrap_or_default();

        Ok(ProviderResponse {
            text: (!text.is_empty()).then_some(text),
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        })
    }

    fn name(&self) -> &'static str {
        "vertex"
    }
}

// ============================================================================
// Vertex AI Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
    candidate_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    retrieval: Retrieval,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Retrieval {
    vertex_rag_store: VertexRagStore,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VertexRagStore {
    rag_resources: Vec<RagResource>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RagResource {
    rag_corpus: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
