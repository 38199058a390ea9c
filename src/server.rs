//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, service wiring, and Axum server lifecycle.

use crate::application::services::{LinkService, TagService};
use crate::config::Config;
use crate::domain::repositories::{LinkRepository, TagRepository};
use crate::infrastructure::cache::{CacheService, RedisCache};
use crate::infrastructure::persistence::{PgLinkRepository, PgTagRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (optional; the service runs uncached if it is unavailable)
/// - Axum HTTP server with graceful shutdown on Ctrl+C / SIGTERM
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Migrations applied");

    let cache = connect_cache(&config).await;

    let pool = Arc::new(pool);
    let link_repository: Arc<dyn LinkRepository> =
        Arc::new(PgLinkRepository::new(pool.clone()));
    let tag_repository: Arc<dyn TagRepository> = Arc::new(PgTagRepository::new(pool));

    let link_service = LinkService::new(link_repository, cache, config.link_service_config());
    let tag_service = TagService::new(tag_repository);

    let state = AppState::new(
        Arc::new(link_service),
        Arc::new(tag_service),
        config.owner_header_name()?,
    );

    let app = app_router(state, Duration::from_secs(config.request_timeout_seconds));

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn connect_database(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Connects to Redis if configured.
///
/// A failed connection is logged and the service runs without a cache.
async fn connect_cache(config: &Config) -> Option<Arc<dyn CacheService>> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled");
        return None;
    };

    match RedisCache::connect(redis_url).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Some(Arc::new(redis))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis, running without cache");
            None
        }
    }
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
