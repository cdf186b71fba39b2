use gateway_core::config as core_config;
use gateway_core::error::AppError;
use gateway_core::middleware::signature::DEFAULT_MAX_BODY_BYTES;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::str::FromStr;

/// Default GCE metadata endpoint for the runtime service account's token.
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Process-wide settings, read once at startup and never mutated.
///
/// Empty backend values are not rejected here outside production; they
/// surface as errors on the first request that needs them.
#[derive(Debug)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub project: String,
    pub region: String,
    pub signing_secret: SecretString,
    pub model_name: String,
    pub rag_corpus: String,
    pub max_body_bytes: usize,
    pub backend: BackendKind,
    pub vertex: VertexSettings,
    pub otlp_endpoint: Option<String>,
    pub metrics_port: Option<u16>,
}

/// Connection settings for the Vertex AI backend.
#[derive(Debug)]
pub struct VertexSettings {
    /// Overrides `https://{region}-aiplatform.googleapis.com`.
    pub api_endpoint: Option<String>,
    /// Static bearer token; when unset a token is fetched from the metadata server.
    pub access_token: Option<SecretString>,
    pub metadata_token_url: String,
    /// No timeout is applied unless this is set.
    pub request_timeout_secs: Option<u64>,
}

impl Default for VertexSettings {
    fn default() -> Self {
        Self {
            api_endpoint: None,
            access_token: None,
            metadata_token_url: DEFAULT_METADATA_TOKEN_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

/// Which generation backend serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Vertex,
    Mock,
}

impl FromStr for BackendKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "vertex" | "vertexai" => Ok(BackendKind::Vertex),
            "mock" => Ok(BackendKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown GENERATION_BACKEND '{}'",
                other
            ))),
        }
    }
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let config = GatewayConfig {
            common,
            project: get_env("PROJECT", is_prod)?,
            region: get_env("REGION", is_prod)?,
            signing_secret: SecretString::new(get_env("VERTEX_CF_AUTH_TOKEN", is_prod)?),
            model_name: get_env("MODEL_NAME", is_prod)?,
            rag_corpus: get_env("RAG_CORPUS", is_prod)?,
            max_body_bytes: parse_optional_env("MAX_BODY_BYTES")?
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            backend: optional_env("GENERATION_BACKEND")
                .as_deref()
                .unwrap_or("vertex")
                .parse()?,
            vertex: VertexSettings {
                api_endpoint: optional_env("VERTEX_API_ENDPOINT"),
                access_token: optional_env("VERTEX_ACCESS_TOKEN").map(SecretString::new),
                metadata_token_url: optional_env("GCE_METADATA_TOKEN_URL")
                    .unwrap_or_else(|| DEFAULT_METADATA_TOKEN_URL.to_string()),
                request_timeout_secs: parse_optional_env("VERTEX_REQUEST_TIMEOUT_SECS")?,
            },
            otlp_endpoint: optional_env("OTLP_ENDPOINT"),
            metrics_port: parse_optional_env("METRICS_PORT")?,
        };

        Ok(config)
    }

    /// Names of required settings that are empty.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        [
            ("PROJECT", self.project.is_empty()),
            ("REGION", self.region.is_empty()),
            (
                "VERTEX_CF_AUTH_TOKEN",
                self.signing_secret.expose_secret().is_empty(),
            ),
            ("MODEL_NAME", self.model_name.is_empty()),
            ("RAG_CORPUS", self.rag_corpus.is_empty()),
        ]
        .into_iter()
        .filter_map(|(key, missing)| missing.then_some(key))
        .collect()
    }
}

/// Required values default to empty outside production.
fn get_env(key: &str, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required in production but not set",
            key
        ))),
        _ => Ok(String::new()),
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_optional_env<T>(key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| parse_value(key, &raw))
        .transpose()
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: '{}' ({})", key, raw, e))
    })
}
