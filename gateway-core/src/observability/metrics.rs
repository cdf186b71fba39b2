use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Serve Prometheus metrics on their own listener.
///
/// Without a call to this, the `metrics` macros are no-ops.
pub fn init_metrics(port: u16) -> Result<(), anyhow::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter on {}: {}", addr, e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
