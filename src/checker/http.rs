// src/checker/http.rs
// =============================================================================
// This module fetches an external page and decides whether it links to us.
//
// Key functionality:
// - Adds https:// to bare hosts ("blog.example.com/post")
// - One GET request with a browser-like user agent and a hard timeout
// - Non-2xx answers, timeouts and network errors all become status = Lost
//   with a diagnostic message; this module never returns an error
// - On a 2xx answer the HTML is scanned by html::find_backlink
// =============================================================================

use super::html::{self, BacklinkMatch};
use crate::config::CheckerConfig;
use crate::error::Result;
use crate::storage::{BacklinkPatch, BacklinkStatus, LinkType};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of checking one external page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub status: BacklinkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_text: Option<String>,
    /// Why the page could not be checked ("HTTP 404", "Request timeout", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl CheckResult {
    /// A Lost result caused by a failure, not by a missing link.
    pub fn failed(error: impl Into<String>, http_status: Option<u16>) -> Self {
        Self {
            status: BacklinkStatus::Lost,
            link_type: None,
            anchor_text: None,
            error: Some(error.into()),
            http_status,
        }
    }

    /// The storage update for this result.
    ///
    /// Always sets status, linkType and anchorText, so a page that lost its
    /// link also loses the stale link type and anchor text.
    pub fn to_patch(&self) -> BacklinkPatch {
        BacklinkPatch {
            status: Some(self.status),
            link_type: Some(self.link_type),
            anchor_text: Some(self.anchor_text.clone()),
            ..Default::default()
        }
    }
}

/// Fetches pages and looks for links to one fixed target domain.
///
/// Holds a single reqwest client, so connections are pooled across checks.
#[derive(Debug, Clone)]
pub struct BacklinkChecker {
    client: Client,
    target_domain: String,
}

impl BacklinkChecker {
    pub fn new(config: &CheckerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            target_domain: config.target_domain.clone(),
        })
    }

    pub fn target_domain(&self) -> &str {
        &self.target_domain
    }

    /// Checks whether `external_url` currently links to the target domain.
    ///
    /// `target_url` is the page we expect to be linked. Matching is done on
    /// the domain, so any link to the site counts.
    pub async fn check_backlink(&self, external_url: &str, target_url: &str) -> CheckResult {
        let url = normalize_url(external_url);
        debug!(url = %url, target = %target_url, "Checking backlink");

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return categorize_error(e),
        };

        let status_code = response.status();
        if !status_code.is_success() {
            return CheckResult::failed(
                format!("HTTP {}", status_code.as_u16()),
                Some(status_code.as_u16()),
            );
        }

        // The timeout also covers reading the body
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return categorize_error(e),
        };

        let http_status = Some(status_code.as_u16());
        match html::find_backlink(&body, &url, &self.target_domain) {
            Some(BacklinkMatch::Anchor { text, nofollow }) => CheckResult {
                status: if nofollow {
                    BacklinkStatus::NoFollow
                } else {
                    BacklinkStatus::Active
                },
                link_type: Some(if nofollow {
                    LinkType::Nofollow
                } else {
                    LinkType::Dofollow
                }),
                anchor_text: Some(text),
                error: None,
                http_status,
            },
            Some(BacklinkMatch::Meta) => CheckResult {
                status: BacklinkStatus::Active,
                link_type: Some(LinkType::Meta),
                anchor_text: Some("Meta/Link tag".to_string()),
                error: None,
                http_status,
            },
            None => CheckResult {
                status: BacklinkStatus::Lost,
                link_type: None,
                anchor_text: None,
                error: None,
                http_status,
            },
        }
    }
}

/// Trims the input and prefixes `https://` when no http(s) scheme is given.
pub fn normalize_url(external_url: &str) -> String {
    let url = external_url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

// Timeouts get a fixed message, everything else keeps reqwest's own text
fn categorize_error(error: reqwest::Error) -> CheckResult {
    if error.is_timeout() {
        CheckResult::failed("Request timeout", None)
    } else {
        CheckResult::failed(error.to_string(), None)
    }
}
