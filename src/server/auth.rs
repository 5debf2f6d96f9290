// src/server/auth.rs
// =============================================================================
// Shared-secret checks for the admin and cron endpoints.
//
// Both expect `Authorization: Bearer <secret>` and compare it exactly.
// - cron: no CRON_SECRET configured -> everyone may trigger a run
// - admin: no ADMIN_PASSWORD configured -> allowed in development only
// =============================================================================

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use axum::http::{header, HeaderMap};
use tracing::warn;

/// The token from an `Authorization: Bearer ...` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub fn authorize_cron(auth: &AuthConfig, headers: &HeaderMap) -> Result<()> {
    let Some(secret) = auth.cron_secret.as_deref() else {
        return Ok(());
    };

    if bearer_token(headers) == Some(secret) {
        Ok(())
    } else {
        Err(Error::Unauthorized(
            "Unauthorized. Missing or invalid CRON_SECRET.".to_string(),
        ))
    }
}

pub fn authorize_admin(auth: &AuthConfig, headers: &HeaderMap) -> Result<()> {
    let unauthorized =
        || Error::Unauthorized("Unauthorized. Invalid or missing admin password.".to_string());

    match auth.admin_password.as_deref() {
        Some(password) if bearer_token(headers) == Some(password) => Ok(()),
        Some(_) => Err(unauthorized()),
        None if auth.development => {
            warn!("ADMIN_PASSWORD not set, allowing access in development mode only");
            Ok(())
        }
        None => Err(unauthorized()),
    }
}
