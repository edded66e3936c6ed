//! Student Registry - Main Entry Point

use api::{init_logging, init_metrics, run_server, ApiConfig, AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load()?;
    init_logging(&config)?;

    info!("=== Student Registry v{} ===", env!("CARGO_PKG_VERSION"));

    let mut state = AppState::from_config(&config);
    if let Some(handle) = init_metrics() {
        state = state.with_metrics(handle);
    }

    run_server(config, Arc::new(state)).await
}
