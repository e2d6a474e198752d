use anyhow::Context;
use medchat_server::{AppConfig, AppState, build_engine, run_server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let engine = build_engine(&config).await?;
    let state = AppState::new(engine, config.locale);

    run_server(config.server, state).await
}
