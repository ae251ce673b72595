use anyhow::Result;
use axum::{routing::get, Router};
use compliance_api::{AppState, AuthGate, FieldEncryption};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::load()?;

    init_tracing(&config);
    tracing::info!("Starting compliance server");

    // Both fail fast: a missing salt or verifier secret must stop the boot
    let encryption = FieldEncryption::initialize(&config.encryption)?;
    let gate = AuthGate::from_config(&config.auth)?;
    config.file_urls.clone().install();
    tracing::info!(auth_mode = ?config.auth.mode, encryption_enabled = encryption.is_enabled(), "Security layer initialized");

    let api_state = AppState::new(gate, encryption);

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", compliance_api::routes(api_state))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &config::Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "compliance_server={level},compliance_api={level},tower_http=debug",
            level = config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn health_check() -> &'static str {
    "OK"
}
