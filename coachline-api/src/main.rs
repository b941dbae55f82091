use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use coachline_api::{
    app,
    state::{AppState, AuthConfig, RateLimit},
};
use coachline_booking::{BookingService, RetryPolicy};
use coachline_core::repository::BookingStore;
use coachline_store::{Config, DbClient, InMemoryStore, PostgresStore, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coachline_api=debug,coachline_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Coachline API on port {}", config.server.port);

    let store: Arc<dyn BookingStore> = match &config.database {
        Some(db) => {
            let client = DbClient::new(&db.url, db.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            client.migrate().await.context("Failed to run migrations")?;
            Arc::new(PostgresStore::new(client.pool))
        }
        None => {
            tracing::warn!("No database configured, bookings are kept in process memory");
            Arc::new(InMemoryStore::new())
        }
    };

    let redis = match &config.redis {
        Some(redis) => {
            let client = RedisClient::new(&redis.url).await.context("Invalid Redis URL")?;
            if let Err(e) = client.ping().await {
                tracing::warn!("Redis not reachable yet, rate limiter will fail open: {}", e);
            }
            Some(Arc::new(client))
        }
        None => None,
    };

    let retry = RetryPolicy::new(
        config.reservation.max_attempts,
        Duration::from_millis(config.reservation.initial_backoff_ms),
        Duration::from_millis(config.reservation.max_backoff_ms),
    );

    let app_state = AppState {
        bookings: Arc::new(BookingService::new(store, retry)),
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        rate_limit: RateLimit {
            requests: config.rate_limit.requests,
            window_seconds: config.rate_limit.window_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
