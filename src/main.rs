// src/main.rs

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use branchdesk::{
    app::build_router,
    config::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // RUST_LOG tem prioridade sobre LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET não definido, usando o segredo de desenvolvimento");
    }

    let server_addr = config.server_addr.clone();
    let app_state = AppState::new(config).await?;
    let app = build_router(app_state);

    let listener = TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Falha ao abrir {server_addr}"))?;
    tracing::info!("🚀 Servidor escutando em {}", server_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Servidor encerrou com erro")?;

    Ok(())
}
