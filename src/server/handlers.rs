// src/server/handlers.rs
// =============================================================================
// Handlers for the backlink tracker API.
//
// Errors are returned as `crate::error::Error`, which renders as
// `{ "error": "..." }` with the matching status code.
//
// Bodies and query strings are extracted as `Result<_, Rejection>`: the admin
// check runs first, and a malformed request still gets the JSON error shape.
// =============================================================================

use super::auth::{authorize_admin, authorize_cron};
use super::AppState;
use crate::cron;
use crate::error::{Error, Result};
use crate::storage::{BacklinkPatch, NewBacklink};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Body of POST /api/seo-tracker/backlinks. Fields are optional here so a
/// missing one becomes a 400 with our own message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub external_url: Option<String>,
    pub target_url: Option<String>,
    pub language: Option<String>,
    pub notes: Option<String>,
}

/// Body of PUT /api/seo-tracker/backlinks: the id plus any patch fields.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub id: Option<String>,
    #[serde(flatten)]
    pub patch: BacklinkPatch,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

/// Body of POST /api/seo-tracker/check: either a stored id, or a URL pair.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub id: Option<String>,
    pub external_url: Option<String>,
    pub target_url: Option<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "backlink-tracker",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn list_backlinks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    authorize_admin(&state.config.auth, &headers)?;

    let backlinks = state.store.list().await?;
    Ok(Json(json!({ "backlinks": backlinks })))
}

pub async fn create_backlink(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: std::result::Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    authorize_admin(&state.config.auth, &headers)?;
    let Json(req) = body?;

    let (Some(external_url), Some(target_url), Some(language)) = (
        non_empty(req.external_url),
        non_empty(req.target_url),
        non_empty(req.language),
    ) else {
        return Err(Error::Validation(
            "Missing required fields: externalUrl, targetUrl, language".to_string(),
        ));
    };

    let backlink = state
        .store
        .create(NewBacklink {
            external_url,
            target_url,
            language,
            notes: req.notes,
        })
        .await?;

    info!(id = %backlink.id, url = %backlink.external_url, "Backlink created");
    Ok((StatusCode::CREATED, Json(json!({ "backlink": backlink }))))
}

pub async fn update_backlink(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: std::result::Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>> {
    authorize_admin(&state.config.auth, &headers)?;
    let Json(req) = body?;

    let id = non_empty(req.id)
        .ok_or_else(|| Error::Validation("Missing required field: id".to_string()))?;

    let backlink = state
        .store
        .update(&id, req.patch)
        .await?
        .ok_or_else(|| Error::NotFound("Backlink not found".to_string()))?;

    Ok(Json(json!({ "backlink": backlink })))
}

pub async fn delete_backlink(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: std::result::Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<serde_json::Value>> {
    authorize_admin(&state.config.auth, &headers)?;
    let Query(params) = query?;

    let id = non_empty(params.id)
        .ok_or_else(|| Error::Validation("Missing required parameter: id".to_string()))?;

    if !state.store.delete(&id).await? {
        return Err(Error::NotFound("Backlink not found".to_string()));
    }

    info!(id = %id, "Backlink deleted");
    Ok(Json(json!({ "success": true })))
}

pub async fn check_backlink(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: std::result::Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>> {
    authorize_admin(&state.config.auth, &headers)?;
    let Json(req) = body?;

    // A stored record: check it and persist the outcome
    if let Some(id) = non_empty(req.id) {
        let backlink = state
            .store
            .get(&id)
            .await?
            .ok_or_else(|| Error::NotFound("Backlink not found".to_string()))?;

        let result = state
            .checker
            .check(&backlink.external_url, &backlink.target_url)
            .await?;
        let updated = state.store.update(&id, result.to_patch()).await?;

        info!(id = %id, status = ?result.status, "Backlink checked");
        return Ok(Json(json!({ "backlink": updated, "checkResult": result })));
    }

    // An ad-hoc pair: check only, nothing is stored
    let (Some(external_url), Some(target_url)) =
        (non_empty(req.external_url), non_empty(req.target_url))
    else {
        return Err(Error::Validation(
            "Missing required fields: id or (externalUrl and targetUrl)".to_string(),
        ));
    };

    let result = state.checker.check(&external_url, &target_url).await?;
    Ok(Json(json!({ "checkResult": result })))
}

pub async fn run_cron(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Err(e) = authorize_cron(&state.config.auth, &headers) {
        return e.into_response();
    }

    match cron::run_batch(state.store.as_ref(), state.checker.as_ref()).await {
        Ok(report) => Json(json!({
            "success": true,
            "message": "Weekly backlink check completed",
            "results": report.results,
            "timestamp": report.timestamp,
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "Cron job error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Cron job failed", "details": e.to_string() })),
            )
                .into_response()
        }
    }
}

// Treats "" and whitespace-only like a missing field
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
