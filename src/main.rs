use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use scholaris::logging::{init_tracing, shutdown_tracer};
use scholaris::metrics::{init_metrics, metrics_app};
use scholaris::router::init_router;
use scholaris::state::init_app_state;
use scholaris_config::ServerConfig;
use scholaris_db::{DatabaseConfig, init_db_pool};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    init_tracing().context("failed to initialise logging")?;
    let metrics_handle = init_metrics();

    let db_config = DatabaseConfig::from_env()?;
    let db = init_db_pool(&db_config)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("failed to run migrations")?;

    let state = init_app_state(db).await?;
    let mut app = init_router(state);
    if let Some(handle) = metrics_handle {
        app = app.merge(metrics_app(handle));
    }

    let server = ServerConfig::from_env();
    let listener = tokio::net::TcpListener::bind(server.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", server.bind_addr()))?;

    info!(addr = %server.bind_addr(), "Server running");
    info!("Swagger UI available at /swagger-ui, Scalar at /scalar");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    shutdown_tracer();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
