use std::net::SocketAddr;
use std::sync::Arc;

use etl_core::engine::EtlEngine;
use etl_core::store::JobStore;
use etl_db::{InMemoryJobStore, PgJobStore};
use etl_engine::EtlEngineApi;
use etl_pipeline::EtlOrchestrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use etl_api::config::ServerConfig;
use etl_api::router::build_app_router;
use etl_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "etl_api=debug,etl_pipeline=debug,etl_db=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    config.validate().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        etl_service_url = %config.etl_service_url,
        "Loaded server configuration"
    );

    // --- Job store ---
    let pool = match &config.database_url {
        Some(database_url) => {
            let pool = etl_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            etl_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            etl_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory job store (jobs are lost on restart)");
            None
        }
    };

    let store: Arc<dyn JobStore> = match &pool {
        Some(pool) => Arc::new(PgJobStore::new(pool.clone())),
        None => Arc::new(InMemoryJobStore::new()),
    };

    // --- ETL engine client ---
    let engine: Arc<dyn EtlEngine> = Arc::new(
        EtlEngineApi::new(config.etl_service_url.clone(), config.etl_engine_timeout())
        .expect("Failed to build ETL engine HTTP client"),
    );

    // --- App state ---
    let state = AppState {
        orchestrator: Arc::new(EtlOrchestrator::new(store, engine)),
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connection pool closed");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
