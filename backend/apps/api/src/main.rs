//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors go through
//! `kernel::error::AppError` inside the library crates.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::{AuthServices, PgRateLimitStore, PgUserRepository, auth_router};
use auth::presentation::rate_limit::{RateLimitGate, rate_limit_gate};
use axum::{
    Json, Router, http,
    http::{Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use chrono::Utc;
use platform::rate_limit::{
    InMemoryRateLimitStore, LimiterClass, RateLimitStore, RateLimiterBank,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{RateLimitBackend, ServerConfig};

/// How often expired rate-limit counters are dropped
const RATE_LIMIT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        development = config.development,
        rate_limit_backend = ?config.rate_limit_backend,
        hash_cost = ?config.auth.hash_cost,
        trusted_proxy_hops = config.rate_limits.trusted_proxy_hops,
        "Configuration loaded"
    );

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    match config.rate_limit_backend {
        RateLimitBackend::Memory => serve(config, pool, InMemoryRateLimitStore::new()).await,
        RateLimitBackend::Postgres => {
            let store = PgRateLimitStore::new(pool.clone());
            serve(config, pool, store).await
        }
    }
}

async fn serve<S>(config: ServerConfig, pool: PgPool, store: S) -> anyhow::Result<()>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    let services = Arc::new(AuthServices::from_config(&config.auth)?);
    let limiter = Arc::new(RateLimiterBank::new(store, config.rate_limits.clone()));
    spawn_rate_limit_purge(limiter.clone());

    let repo = Arc::new(PgUserRepository::new(pool));
    let port = config.port;

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let api = Router::new()
        .route("/health", get(move || health(port)))
        .nest("/auth", auth_router(repo, services, limiter.clone()))
        .layer(from_fn_with_state(
            RateLimitGate::new(limiter, LimiterClass::General),
            rate_limit_gate::<S>,
        ));

    let app = Router::new().nest("/api", api).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// GET /api/health
async fn health(port: u16) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Campus SNS API is running",
        "timestamp": Utc::now(),
        "port": port,
    }))
}

fn spawn_rate_limit_purge<S>(limiter: Arc<RateLimiterBank<S>>)
where
    S: RateLimitStore + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match limiter.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => {
                    tracing::debug!(counters_removed = removed, "Purged expired rate limit counters");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Rate limit purge failed, continuing anyway");
                }
            }
        }
    });
}
