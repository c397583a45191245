/*
 * Responsibility
 * - Config読み込み → 依存生成 (PgPool / migration / AuthorizationGate) → Router 組み立て
 * - Middleware の適用 (HTTP / CORS / security headers)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware::{cors, http, security_headers};
use crate::services::auth::{AuthorizationGate, build_authorization_gate};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG=info,casting_agency=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: fail fast
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!()
        .run(&db)
        .await
        .context("failed to run migrations")?;

    let gate = build_authorization_gate(&config.auth)?;
    warm_up(&gate).await;

    Ok(AppState::new(db, gate, config.permissions.clone()))
}

/// Fetch the signing keys once at start-up. A failure is not fatal: the
/// first request retries and answers 503 until the key source recovers.
async fn warm_up(gate: &Arc<AuthorizationGate>) {
    match gate.key_set_provider().get_key_set().await {
        Ok(keys) => tracing::info!(keys = keys.len(), "signing keys loaded"),
        Err(err) => tracing::warn!(code = err.code(), "signing keys unavailable at start-up"),
    }
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .merge(api::routes(&state))
        .fallback(|| async { AppError::NotFound })
        .method_not_allowed_fallback(|| async { AppError::MethodNotAllowed })
        .with_state(state);

    let router = security_headers::apply(router);
    let router = cors::apply(router, config);
    http::apply(router)
}
