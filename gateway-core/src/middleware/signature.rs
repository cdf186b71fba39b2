use crate::error::AppError;
use crate::utils::signature::verify_signature;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, Limited};
use secrecy::{ExposeSecret, SecretString};

pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Default cap on buffered request bodies (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Message returned for both missing and mismatched signatures.
pub const INVALID_SIGNATURE_MESSAGE: &str = "Invalid signature";

#[derive(Debug)]
pub struct SignatureConfig {
    pub secret: SecretString,
    pub max_body_bytes: usize,
}

/// Buffers the raw body and checks its `X-Signature` before anything parses it.
///
/// The verified bytes are handed to the inner service unchanged.
pub async fn signature_validation_middleware<S>(
    State(state): State<S>,
    req: Request,
    next: Next,
) -> Result<Response, AppError>
where
    S: AsRef<SignatureConfig> + Clone + Send + Sync + 'static,
{
    let config = state.as_ref();

    let (parts, body) = req.into_parts();
    let bytes = Limited::new(body, config.max_body_bytes)
        .collect()
        .await
        .map_err(|e| AppError::BodyRead(anyhow::anyhow!("Failed to read body: {}", e)))?
        .to_bytes();

    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(config.secret.expose_secret().as_bytes(), &bytes, signature) {
        tracing::warn!(
            has_signature = !signature.is_empty(),
            body_len = bytes.len(),
            "Rejected request with invalid signature"
        );
        return Err(AppError::Forbidden(INVALID_SIGNATURE_MESSAGE.to_string()));
    }

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}
