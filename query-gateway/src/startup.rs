//! Application startup and lifecycle management.
//!
//! Wires configuration into the provider, the generation adapter and the
//! router, and runs the HTTP server.

use crate::config::{BackendKind, GatewayConfig};
use crate::handlers::handle_query;
use crate::services::providers::mock::MockRagProvider;
use crate::services::providers::vertex::{VertexConfig, VertexRagProvider};
use crate::services::providers::RagProvider;
use crate::services::GenerationAdapter;
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::post,
    Router,
};
use gateway_core::error::AppError;
use gateway_core::middleware::{
    cors_middleware, metrics_middleware, request_id_middleware, signature_validation_middleware,
    SignatureConfig,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub generator: GenerationAdapter,
    pub signature: Arc<SignatureConfig>,
}

impl AsRef<SignatureConfig> for AppState {
    fn as_ref(&self) -> &SignatureConfig {
        &self.signature
    }
}

/// Build the gateway router.
///
/// Layer order, outermost first: CORS (answers preflight), request id, trace,
/// metrics, then signature verification on the query route only.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handle_query))
        .route_layer(from_fn_with_state(
            state.clone(),
            signature_validation_middleware::<AppState>,
        ))
        // The signature middleware enforces its own body cap.
        .layer(DefaultBodyLimit::disable())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(cors_middleware))
        .with_state(state)
}

fn build_provider(config: &mut GatewayConfig) -> Result<Arc<dyn RagProvider>, AppError> {
    match config.backend {
        BackendKind::Mock => {
            tracing::warn!("Using mock generation backend");
            Ok(Arc::new(MockRagProvider::echo()))
        }
        BackendKind::Vertex => {
            let provider = VertexRagProvider::new(VertexConfig {
                project: config.project.clone(),
                location: config.region.clone(),
                api_endpoint: config.vertex.api_endpoint.take(),
                access_token: config.vertex.access_token.take(),
                metadata_token_url: config.vertex.metadata_token_url.clone(),
                request_timeout: config.vertex.request_timeout_secs.map(Duration::from_secs),
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

            if config.vertex.request_timeout_secs.is_none() {
                tracing::warn!("No backend request timeout configured; calls are bounded only by the caller");
            }
            Ok(Arc::new(provider))
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(mut config: GatewayConfig) -> Result<Self, AppError> {
        let provider = build_provider(&mut config)?;

        tracing::info!(
            provider = provider.name(),
            model = %config.model_name,
            project = %config.project,
            region = %config.region,
            "Initialized generation backend"
        );

        let missing = config.missing_settings();
        if !missing.is_empty() {
            tracing::warn!(
                ?missing,
                "Required settings are empty; requests depending on them will fail"
            );
        }

        let generator = GenerationAdapter::new(provider, config.model_name, config.rag_corpus);
        let signature = Arc::new(SignatureConfig {
            secret: config.signing_secret,
            max_body_bytes: config.max_body_bytes,
        });

        let router = build_router(AppState {
            generator,
            signature,
        });

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Query gateway listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
