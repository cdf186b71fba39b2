pub mod cors;
pub mod metrics;
pub mod signature;
pub mod tracing;

pub use self::cors::cors_middleware;
pub use self::metrics::metrics_middleware;
pub use self::signature::{signature_validation_middleware, SignatureConfig, SIGNATURE_HEADER};
pub use self::tracing::{request_id_middleware, REQUEST_ID_HEADER};
