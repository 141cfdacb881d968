//! HTTP API for the assistant.

pub mod middleware;
pub mod routes;

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::config::Settings;
use crate::metrics::MetricsCollector;
use crate::pipeline::Assistant;

/// Shared application state for the HTTP server.
pub struct AppState {
    pub assistant: Assistant,
    pub metrics: RwLock<MetricsCollector>,
}

impl AppState {
    pub fn new(assistant: Assistant) -> Self {
        Self {
            assistant,
            metrics: RwLock::new(MetricsCollector::new()),
        }
    }
}

/// Build the assistant from `settings` and serve it on `addr`.
pub async fn start(addr: &str, settings: &Settings) -> anyhow::Result<()> {
    let assistant = Assistant::from_settings(settings)?;

    assistant.check_upstream().await;
    if assistant.index().is_empty() {
        tracing::warn!("index is empty; run `hr-assistant seed` first");
    }

    let app = routes::create_router(Arc::new(AppState::new(assistant)));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
