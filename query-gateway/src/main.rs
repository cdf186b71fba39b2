use dotenvy::dotenv;
use gateway_core::observability::{init_metrics, init_tracing};
use query_gateway::config::GatewayConfig;
use query_gateway::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = GatewayConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "query-gateway",
        &config.common.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    if let Some(port) = config.metrics_port {
        init_metrics(port)?;
    }

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;

    app.run_until_stopped().await?;

    Ok(())
}
