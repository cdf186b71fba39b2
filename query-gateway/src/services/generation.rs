//! Turns an authenticated query into a RAG generation call.

use crate::services::providers::{
    GenerationRequest, ProviderError, RagProvider, RetrievalTool, RAG_SAMPLING,
};
use metrics::counter;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct GenerationAdapter {
    provider: Arc<dyn RagProvider>,
    model: String,
    rag_corpus: String,
}

impl GenerationAdapter {
    pub fn new(
        provider: Arc<dyn RagProvider>,
        model: impl Into<String>,
        rag_corpus: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            rag_corpus: rag_corpus.into(),
        }
    }

    pub fn build_request(&self, contents: &str) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            prompt: contents.to_string(),
            sampling: RAG_SAMPLING,
            retrieval: RetrievalTool {
                rag_corpus: self.rag_corpus.clone(),
            },
        }
    }

    /// Generate grounded text for `contents`.
    ///
    /// `parameters` is accepted so the wire contract stays stable, but it has
    /// no effect: sampling is fixed by [`RAG_SAMPLING`]. A response without
    /// text is an error, never an empty success.
    pub async fn generate(
        &self,
        contents: &str,
        parameters: Option<&Map<String, Value>>,
    ) -> Result<String, ProviderError> {
        if let Some(params) = parameters.filter(|p| !p.is_empty()) {
            tracing::debug!(
                keys = ?params.keys().collect::<Vec<_>>(),
                "Ignoring caller-supplied generation parameters"
            );
        }

        let request = self.build_request(contents);
        let provider = self.provider.name();
        let start = Instant::now();

        let result = self.provider.generate(&request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                counter!("generation_requests_total", "provider" => provider, "outcome" => "error")
                    .increment(1);
                tracing::error!(provider, elapsed_ms, error = %e, "Generation failed");
                return Err(e);
            }
        };

        let Some(text) = response.text.filter(|t| !t.is_empty()) else {
            counter!("generation_requests_total", "provider" => provider, "outcome" => "empty")
                .increment(1);
            tracing::warn!(
                provider,
                elapsed_ms,
                finish_reason = response.finish_reason.as_str(),
                "Generation returned no text"
            );
            return Err(ProviderError::EmptyResponse);
        };

        counter!("generation_requests_total", "provider" => provider, "outcome" => "ok")
            .increment(1);
        tracing::info!(
            provider,
            elapsed_ms,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = response.finish_reason.as_str(),
            "Generation completed"
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockRagProvider;

    fn adapter(provider: Arc<MockRagProvider>) -> GenerationAdapter {
        GenerationAdapter::new(provider, "gemini-1.5-pro", "projects/p/ragCorpora/1")
    }

    #[tokio::test]
    async fn returns_provider_text() {
        let provider = Arc::new(MockRagProvider::with_text("Revenue was $5M"));
        let text = adapter(provider.clone())
            .generate("What is revenue?", None)
            .await
            .unwrap();

        assert_eq!(text, "Revenue was $5M");
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemini-1.5-pro");
        assert_eq!(requests[0].prompt, "What is revenue?");
        assert_eq!(requests[0].retrieval.rag_corpus, "projects/p/ragCorpora/1");
    }

    #[tokio::test]
    async fn parameters_do_not_change_sampling() {
        let provider = Arc::new(MockRagProvider::echo());
        let mut params = Map::new();
        params.insert("temperature".to_string(), Value::from(1.5));
        params.insert("maxOutputTokens".to_string(), Value::from(4096));

        adapter(provider.clone())
            .generate("q", Some(&params))
            .await
            .unwrap();

        let sampling = provider.requests()[0].sampling;
        assert_eq!(sampling, RAG_SAMPLING);
        assert_eq!(sampling.temperature, 0.2);
        assert_eq!(sampling.top_p, 0.8);
        assert_eq!(sampling.top_k, 40);
        assert_eq!(sampling.max_output_tokens, 500);
        assert_eq!(sampling.candidate_count, 1);
    }

    #[tokio::test]
    async fn empty_text_is_an_error() {
        let provider = Arc::new(MockRagProvider::empty());
        let err = adapter(provider).generate("q", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));

        let provider = Arc::new(MockRagProvider::with_text(""));
        let err = adapter(provider).generate("q", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn provider_errors_propagate_without_retry() {
        let provider = Arc::new(MockRagProvider::failing("backend unavailable"));
        let err = adapter(provider.clone())
            .generate("q", None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "API error: backend unavailable");
        assert_eq!(provider.call_count(), 1);
    }
}
