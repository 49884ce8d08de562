use axum::serve;
use sql_orbiter::config::AppConfig;
use sql_orbiter::{build_dispatcher, create_router};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env() // RUST_LOG still wins
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{}, model={}",
        config.server.host,
        config.server.port,
        config.translator.model
    );

    let dispatcher = build_dispatcher(&config).await?;

    run_server(create_router(Arc::new(dispatcher)), &config).await?;

    Ok(())
}

async fn run_server(app: axum::Router, config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Serving HTMX on http://{} with HTTP/1.1", listener.local_addr()?);

    serve(listener, app).await?;

    Ok(())
}
