//! Notify Relay Server
//!
//! Loads configuration and provider credentials, then serves the relay
//! endpoint and the health/metrics listener until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpListener;
use tracing::{error, info};

use notify_core::{MessageRelay, ProviderCredentials, TwilioClient};
use notify_relay::config::RelayConfig;
use notify_relay::handler::{create_relay_router, RelayState};
use notify_relay::http::{create_router, HttpState};
use notify_relay::metrics::RelayMetrics;
use notify_relay::rate_limit::RateLimiter;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("notify_relay=info".parse().unwrap())
                .add_directive("notify_core=info".parse().unwrap()),
        )
        .init();

    // Configuration and credentials must be complete before binding anything
    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let credentials = match ProviderCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("Cannot start without provider credentials: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting Notify Relay Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Relay endpoint: {}", config.listen_addr);
    info!("HTTP (health/metrics): {}", config.http_addr);
    info!("Provider: {}", config.provider_base_url);

    let relay_options = config.relay_options();
    let sender = credentials.sender_address();
    let provider = match TwilioClient::new(&config.provider_config(), credentials.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create provider client: {}", e);
            std::process::exit(1);
        }
    };
    let relay = Arc::new(MessageRelay::new(
        Arc::new(provider),
        &credentials,
        relay_options,
    ));
    info!("Sending as {}", sender);

    let metrics = RelayMetrics::new();
    let rate_limiter = Arc::new(
        RateLimiter::new(config.rate_limit_per_min).with_max_clients(config.rate_limit_max_clients),
    );
    if config.trust_forwarded_for {
        info!("Rate limiting keyed on X-Forwarded-For");
    }
    let start_time = Instant::now();

    // Start HTTP server for health/metrics
    let http_router = create_router(HttpState {
        metrics: metrics.clone(),
        start_time,
        metrics_token: config.metrics_token.clone(),
    });
    let http_listener = TcpListener::bind(config.http_addr)
        .await
        .expect("Failed to bind HTTP listener");
    let http_addr = config.http_addr;
    tokio::spawn(async move {
        info!("HTTP server listening on {}", http_addr);
        if let Err(e) = axum::serve(http_listener, http_router).await {
            error!("HTTP server failed: {}", e);
        }
    });

    // Start cleanup task for rate limiter (remove stale client buckets)
    if rate_limiter.is_enabled() {
        let cleanup_rate_limiter = rate_limiter.clone();
        tokio::spawn(async move {
            loop {
                // Clean up every 10 minutes, removing clients idle for 30 minutes
                tokio::time::sleep(Duration::from_secs(600)).await;
                let removed = cleanup_rate_limiter.cleanup_inactive(Duration::from_secs(1800));
                if removed > 0 {
                    info!("Cleaned up {} stale rate limiter entries", removed);
                }
            }
        });
    }

    let relay_router = create_relay_router(RelayState {
        relay,
        metrics,
        rate_limiter,
        max_body_bytes: config.max_body_bytes,
        trust_forwarded_for: config.trust_forwarded_for,
    });

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .expect("Failed to bind relay listener");
    info!("Relay listening on {}", config.listen_addr);

    let served = axum::serve(
        listener,
        relay_router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    match served {
        Ok(()) => info!("Relay stopped"),
        Err(e) => error!("Relay server failed: {}", e),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
