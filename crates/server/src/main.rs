use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server::config::ServerConfig;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config);
    let app = server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("dossier engine listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
