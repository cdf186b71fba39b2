//! query-gateway: signed HTTP front door for retrieval-augmented generation.
//!
//! A `POST /` carrying `{"contents": ...}` and an `X-Signature` header
//! (hex HMAC-SHA256 of the raw body) is authenticated, validated, and answered
//! with `{"response": ...}` generated against the configured RAG corpus.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod services;
pub mod startup;

pub use startup::{build_router, AppState, Application};
