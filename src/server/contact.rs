// src/server/contact.rs
// =============================================================================
// The public contact form endpoint.
//
// This is the only rate-limited route. Every response carries
// X-RateLimit-Limit / X-RateLimit-Remaining / X-RateLimit-Reset (epoch ms);
// an exhausted window answers 429 with Retry-After in seconds.
//
// Delivering the message by email is handled elsewhere; here the submission
// is validated and logged.
// =============================================================================

use super::AppState;
use crate::ratelimit::{client_identifier, RateLimitDecision};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub company: Option<String>,
    pub message: Option<String>,
}

impl ContactRequest {
    fn has_required_fields(&self) -> bool {
        [&self.name, &self.email, &self.company, &self.message]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ContactRequest>, JsonRejection>,
) -> Response {
    let client = client_identifier(&headers);
    let decision = state.limiter.check(&client).await;
    let limit_headers = rate_limit_headers(state.limiter.config().max_requests, &decision);

    if !decision.allowed {
        let retry_after = state.limiter.retry_after_secs(&decision);
        warn!(client = %client, retry_after, "Contact form rate limited");

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            limit_headers,
            Json(json!({ "error": "Too many requests. Please try again later." })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    // Counted against the quota even when the body is unreadable
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(
                client = %client,
                error = %rejection.body_text(),
                "Unreadable contact form body"
            );
            return (
                StatusCode::BAD_REQUEST,
                limit_headers,
                Json(json!({ "error": "Invalid request body" })),
            )
                .into_response();
        }
    };

    if !req.has_required_fields() {
        return (
            StatusCode::BAD_REQUEST,
            limit_headers,
            Json(json!({ "error": "Missing required fields" })),
        )
            .into_response();
    }

    log_submission(&req);

    (
        StatusCode::OK,
        limit_headers,
        Json(json!({ "message": "Thank you! We'll get back to you soon." })),
    )
        .into_response()
}

// Nothing is sent anywhere; the submission only goes to the log
fn log_submission(req: &ContactRequest) {
    let message = req.message.as_deref().unwrap_or_default();
    let head: String = message.chars().take(50).collect();
    info!(
        name = req.name.as_deref().unwrap_or_default(),
        email = req.email.as_deref().unwrap_or_default(),
        company = req.company.as_deref().unwrap_or_default(),
        phone = req.phone.as_deref().unwrap_or("Not provided"),
        country = req.country.as_deref().unwrap_or("Not provided"),
        preview = %format!("{}...", head),
        "Contact form submission"
    );
}

fn rate_limit_headers(limit: u32, decision: &RateLimitDecision) -> [(HeaderName, HeaderValue); 3] {
    [
        (
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderValue::from(limit),
        ),
        (
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderValue::from(decision.remaining),
        ),
        (
            HeaderName::from_static("x-ratelimit-reset"),
            HeaderValue::from(decision.reset_time),
        ),
    ]
}
