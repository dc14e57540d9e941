use anyhow::{Context, Result};
use chat_workspace_service::build_router;
use chat_workspace_service::config::{Config, LogFormat};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("load chat workspace config")?;
    init_tracing(&config);

    let bind_addr = config.bind_addr;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("bind {bind_addr}"))?;
    tracing::info!(
        %bind_addr,
        deployment = config.deployment.as_str(),
        session_backend = config.session_backend.url(),
        "chat workspace service listening"
    );

    axum::serve(listener, build_router(config).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve chat workspace")?;
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
