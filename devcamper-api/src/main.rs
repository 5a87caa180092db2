//! # DevCamper API Server
//!
//! Serves the bootcamp directory API on the configured address.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/devcamper JWT_SECRET=... cargo run -p devcamper-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines.

use std::net::SocketAddr;

use devcamper_api::{
    app::{build_router, AppState},
    config::Config,
};
use devcamper_shared::{
    auth::password,
    db::{migrations::run_migrations, pool},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "DevCamper API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = pool::connect(&config.database).await?;

    run_migrations(&pool).await?;

    tokio::task::spawn_blocking(password::warm_up);

    tokio::fs::create_dir_all(&config.uploads.path).await?;

    let address = config.bind_address();
    let environment = config.api.environment;
    let state = AppState::new(pool.clone(), config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, ?environment, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "devcamper_api=debug,devcamper_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
