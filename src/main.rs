use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use repo_catalog::api;
use repo_catalog::config::Config;
use repo_catalog::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Supported repositories: {}", config.supported_repos_path.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);

    let state = AppState::new(config.clone())?;
    let shutdown = state.shutdown.clone();

    let app = Router::new()
        .route("/api/refresh", post(api::repos::refresh))
        .route("/api/repos", get(api::repos::list_repos))
        .route("/api/ask", post(api::ask::ask))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
                return;
            }
            tracing::info!("Shutting down, cancelling in-flight refreshes");
            shutdown.cancel();
        })
        .await?;
    Ok(())
}
