use anyhow::Context;
use std::net::SocketAddr;
use std::time::Duration;
use tourly_api::{app, state::{AppState, AuthConfig}};
use tourly_store::{app_config::Config, RedisClient, Repositories};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tourly_api=debug,tourly_booking=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Tourly API on port {}", config.server.port);

    let repos = Repositories::connect(config.storage.backend, &config.database)
        .await
        .context("Failed to initialise storage")?;

    let mut app_state = AppState::new(
        repos,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        config.auth.bcrypt_cost,
    )
    .with_request_timeout(Duration::from_secs(config.server.request_timeout_seconds));

    // Redis Connection (rate limiting only)
    if let Some(url) = &config.redis.url {
        match RedisClient::new(url).await {
            Ok(redis) => {
                app_state = app_state.with_rate_limit(redis, config.redis.rate_limit_per_minute);
            }
            Err(e) => tracing::warn!(error = %e, "Redis unavailable, rate limiting disabled"),
        }
    }

    if let Some((email, password)) = config.auth.bootstrap_admin() {
        app_state
            .identity
            .ensure_admin(&config.auth.admin_name, email, password)
            .await
            .context("Failed to bootstrap admin account")?;
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
