use std::sync::Arc;

use finedrop_api::{routes, server, state::AppState};
use finedrop_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration; refuses to start on an unreceivable size policy.
    let config = Config::from_env()?;

    let state = Arc::new(AppState::new(config.clone()));
    state.store.ensure_dir().await?;

    let router = routes::build_router(state);
    server::start_server(&config, router).await
}
