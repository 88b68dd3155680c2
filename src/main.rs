use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod error;
mod game;
mod protocol;
mod rate_limit;
mod transport;

use app::AppState;
use config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env()?;
    let address = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(config));

    tokio::spawn(app::maintenance_loop(Arc::clone(&state)));

    let app = app::router(state);
    tracing::info!("listening on {address}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
