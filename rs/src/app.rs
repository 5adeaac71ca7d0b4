/*
 * Responsibility
 * - Load config -> build the verifier -> assemble the Router
 * - Periodic key refresh from the key directory
 * - Serve with axum::serve() until ctrl-c
 */
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{Router, routing::get};
use ssd_jwt_auth::{Verifier, VerifierConfig, build_verifier, reload_keys};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,ssd_jwt_auth=debug,tower_http=debug cargo run -p resource-server
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    tracing::info!(
        "starting resource server in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    if config.app_env.is_production() && config.key_refresh.is_none() {
        tracing::warn!("key refresh is disabled; rotated keys need a restart");
    }

    let verifier = build_verifier(&config.verifier)?;
    let refresh = config
        .key_refresh
        .map(|every| spawn_key_refresh(Arc::clone(&verifier), config.verifier.clone(), every));

    let app = build_router(AppState::new(verifier), &config);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(refresh) = refresh {
        refresh.abort();
    }
    Ok(())
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(api::v1::handlers::health::health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    middleware::http::apply(router, config.request_timeout)
}

/// Reload the key directory every `every`. A failed reload keeps the
/// previously installed keys.
fn spawn_key_refresh(
    verifier: Arc<Verifier>,
    config: VerifierConfig,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; keys were just loaded.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let verifier = Arc::clone(&verifier);
            let config = config.clone();
            // File reads + PEM parsing stay off the async workers.
            let outcome =
                tokio::task::spawn_blocking(move || reload_keys(&verifier, &config)).await;

            match outcome {
                Ok(Ok(count)) => tracing::info!(keys = count, "verification keys refreshed"),
                Ok(Err(err)) => {
                    tracing::error!(error = %err, "key refresh failed; keeping current keys")
                }
                Err(err) => tracing::error!(error = %err, "key refresh task failed"),
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
