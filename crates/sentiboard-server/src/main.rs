mod aggregate;
mod api;
mod collector;
mod middleware;
mod publisher;
mod settings;

use std::sync::Arc;

use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use crate::{
    aggregate::Aggregator,
    api::{build_app, default_rate_limit_state, AppState},
    collector::{Collector, CollectorOptions, Pipeline},
    publisher::Publisher,
    settings::SharedSettings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = sentiboard_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let pipeline = Pipeline::from_config(&config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to initialize collection pipeline, running degraded");
        Pipeline::Degraded {
            reason: e.to_string(),
        }
    });
    let mode = pipeline.mode();
    let init_error: Option<Arc<str>> = pipeline.init_error().map(Arc::from);

    let settings = Arc::new(SharedSettings::new(
        config.search_terms.clone(),
        config.max_items,
        config.max_items_ceiling(),
    ));
    let aggregator = Arc::new(Aggregator::new(config.max_stored));
    let publisher = Publisher::new();
    let wake = Arc::new(Notify::new());

    let collector = Collector::new(
        pipeline,
        CollectorOptions::from_config(&config),
        Arc::clone(&settings),
        Arc::clone(&aggregator),
        publisher.clone(),
        Arc::clone(&wake),
    );
    tokio::spawn(collector.run());

    let state = AppState {
        settings,
        aggregator,
        publisher,
        wake,
        mode,
        init_error,
    };
    let app = build_app(state, &config.cors_origins, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        mode = %mode,
        low_memory = config.low_memory,
        "sentiboard listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
