use anyhow::Context;
use gravity_relay::{AppState, Config, app};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gravity_relay=info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let app = app(AppState::new(&config));

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("failed to bind {}", config.addr()))?;
    info!(
        "realtime relay listening on {} (clients connect to {}/ws)",
        listener.local_addr()?,
        config.public_url
    );

    axum::serve(listener, app).await?;
    Ok(())
}
