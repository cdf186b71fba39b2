#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use gateway_core::middleware::{SignatureConfig, SIGNATURE_HEADER};
use gateway_core::utils::signature::generate_signature;
use http_body_util::BodyExt;
use query_gateway::services::providers::mock::MockRagProvider;
use query_gateway::services::GenerationAdapter;
use query_gateway::{build_router, AppState};
use secrecy::SecretString;
use std::sync::Arc;

pub const SECRET: &str = "test-shared-secret";
pub const MODEL: &str = "gemini-1.5-pro";
pub const CORPUS: &str = "projects/acme/locations/us-central1/ragCorpora/123";

pub struct TestApp {
    pub router: Router,
    pub provider: Arc<MockRagProvider>,
}

pub fn spawn_app(provider: MockRagProvider) -> TestApp {
    spawn_app_with_limit(provider, 1024 * 1024)
}

pub fn spawn_app_with_limit(provider: MockRagProvider, max_body_bytes: usize) -> TestApp {
    let provider = Arc::new(provider);
    let state = AppState {
        generator: GenerationAdapter::new(provider.clone(), MODEL, CORPUS),
        signature: Arc::new(SignatureConfig {
            secret: SecretString::new(SECRET.to_string()),
            max_body_bytes,
        }),
    };

    TestApp {
        router: build_router(state),
        provider,
    }
}

pub fn sign(body: &str) -> String {
    generate_signature(SECRET.as_bytes(), body.as_bytes()).expect("Failed to sign body")
}

pub fn signed_post(body: &str) -> Request<Body> {
    post_with_signature(body, Some(&sign(body)))
}

pub fn post_with_signature(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header("Content-Type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header(SIGNATURE_HEADER, sig);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Response body is not UTF-8")
}

pub fn assert_cors_headers(response: &Response<Body>) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    let allowed = headers["access-control-allow-headers"].to_str().unwrap();
    assert!(allowed.contains("Content-Type"));
    assert!(allowed.contains("X-Signature"));
}
