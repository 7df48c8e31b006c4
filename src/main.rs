use anyhow::{Context, Result};
use tracing::{info, warn};

mod handlers;
mod models;
mod services;
mod utils;

use handlers::{create_app, AppState};
use models::config::AppConfig;
use utils::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config.logging)?;

    info!("Starting Faculty RMS dashboard v{}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = load_error {
        warn!("Configuration unreadable, using defaults: {:#}", e);
    }
    info!(api = %config.api.base_url, "Configuration loaded");

    let bind = config.server.bind;
    let state = AppState::new(config).context("building backend client")?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!("Web server listening on http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}
