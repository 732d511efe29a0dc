// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{sync::Arc, time::Duration};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::chart_service::EnergyChartService;
use crate::domain::chart_options::build_options;
use crate::infrastructure::config::load_config;
use crate::infrastructure::rest_device::RestDevice;
use crate::infrastructure::tracing_renderer::TracingRenderer;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{energy_chart, health_check, list_devices};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "energy_chart=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = load_config()?;
    let options = build_options(&config.chart.unit_label).with_y_max(config.chart.y_max);
    tracing::info!("Energy charts use Y axis unit {}", options.y_label());

    // Connect devices (infrastructure layer)
    let mut chart_service =
        EnergyChartService::new(Duration::from_secs(config.chart.render_timeout_secs));
    let mut renderers = Vec::new();
    for settings in &config.devices {
        match RestDevice::connect(settings).await {
            Ok(device) => {
                let renderer = Arc::new(TracingRenderer::new(settings.id.clone()));
                renderers.push(renderer.clone());
                chart_service.add_device(Arc::new(device), options.clone(), renderer);
            }
            Err(e) => {
                tracing::error!("Skipping device {}: {:#}", settings.id, e);
            }
        }
    }
    if chart_service.device_ids().is_empty() {
        tracing::warn!("No devices available, every chart request will return 404");
    }

    let state = Arc::new(AppState { chart_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/devices", get(list_devices))
        .route("/devices/:id/energychart", get(energy_chart))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str()).await?;
    tracing::info!("Starting energy-chart service on {}", config.server.bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.chart_service.shutdown().await;
    for renderer in &renderers {
        tracing::info!(
            "Chart of device {} was refreshed {} times",
            renderer.device_id(),
            renderer.refreshes()
        );
    }
    tracing::info!("Server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down gracefully");
}
