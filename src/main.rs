use anyhow::Result;
use curious_mind::config::Config;
use curious_mind::http::{build_router, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    curious_mind::load_env();

    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(config.runtime.log_level.clone())
        .init();

    info!("Starting curious-mind question engine");

    let state = AppState::from_config(&config)?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.runtime.http_bind).await?;
    info!("Listening on {}", config.runtime.http_bind);

    axum::serve(listener, router).await?;

    Ok(())
}
