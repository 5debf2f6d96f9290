// src/server/mod.rs
// =============================================================================
// The HTTP API.
//
// Routes:
//   GET    /health                     liveness check
//   GET    /api/seo-tracker/backlinks  list            (admin)
//   POST   /api/seo-tracker/backlinks  create          (admin)
//   PUT    /api/seo-tracker/backlinks  update          (admin)
//   DELETE /api/seo-tracker/backlinks  delete ?id=     (admin)
//   POST   /api/seo-tracker/check      check one       (admin)
//   GET    /api/seo-tracker/cron       batch re-check  (CRON_SECRET)
//   POST   /api/seo-tracker/cron       same, for manual triggers
//   POST   /api/contact                contact form    (rate limited)
//
// Everything a handler needs lives in `AppState`, built once at startup and
// shared through an Arc. Nothing is global.
// =============================================================================

pub mod auth;
mod contact;
mod handlers;

use crate::checker::LinkChecker;
use crate::config::Config;
use crate::error::Result;
use crate::ratelimit::RateLimiter;
use crate::storage::BacklinkStore;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub store: Arc<dyn BacklinkStore>,
    pub checker: Arc<dyn LinkChecker>,
    pub limiter: RateLimiter,
    pub config: Config,
}

impl AppState {
    /// State with a limiter built from `config.rate_limit`.
    pub fn new(
        config: Config,
        store: Arc<dyn BacklinkStore>,
        checker: Arc<dyn LinkChecker>,
    ) -> Self {
        Self {
            store,
            checker,
            limiter: RateLimiter::new(config.rate_limit.clone()),
            config,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/seo-tracker/backlinks",
            get(handlers::list_backlinks)
                .post(handlers::create_backlink)
                .put(handlers::update_backlink)
                .delete(handlers::delete_backlink),
        )
        .route("/api/seo-tracker/check", post(handlers::check_backlink))
        .route(
            "/api/seo-tracker/cron",
            get(handlers::run_cron).post(handlers::run_cron),
        )
        .route("/api/contact", post(contact::submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
