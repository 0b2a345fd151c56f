//! Claim Lifecycle API Server Binary
//!
//! # Usage
//!
//! ```bash
//! API_DATABASE_URL=postgres://localhost/rcm API_JWT_SECRET=... cargo run --bin rcm-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_ISSUER` - Expected token issuer (default: rcm-api)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `API_LOG_LEVEL` - Filter used when `RUST_LOG` is unset (default: info)
//! * `API_LOG_FORMAT` - `text` or `json` (default: text)
//! * `API_RATE_LIMIT_REQUESTS` / `API_RATE_LIMIT_WINDOW_SECS` - per-user limit (default: 100 per 60s)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresActivityLogger, PostgresClaimStore};
use interface_api::{
    auth::JwtAuthorizationGate,
    config::{ApiConfig, LogFormat},
    create_router,
    rate_limit::InMemoryRateLimitStore,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading API_* configuration")?;

    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting claim lifecycle API server"
    );

    if config.jwt_secret == ApiConfig::default().jwt_secret {
        tracing::warn!("API_JWT_SECRET is not set; using the built-in development secret");
    }

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone()).max_connections(config.db_max_connections),
    )
    .await
    .context("connecting to database")?;

    run_migrations(&pool).await.context("running migrations")?;

    let state = AppState::new(
        Arc::new(PostgresClaimStore::new(pool.clone())),
        Arc::new(PostgresActivityLogger::new(pool)),
        Arc::new(JwtAuthorizationGate::new(config.jwt_secret.clone(), config.jwt_issuer.clone())),
        Arc::new(InMemoryRateLimitStore::new()),
        config.clone(),
    );

    let app = create_router(state);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
