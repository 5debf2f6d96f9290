// src/checker/mod.rs
// =============================================================================
// This module contains all backlink checking logic.
//
// Submodules:
// - http: Fetches the external page and classifies the outcome
// - html: Finds links to the target domain inside the page
//
// The `LinkChecker` trait is the seam the batch runner and the HTTP handlers
// depend on. `BacklinkChecker` is the real implementation; tests plug in
// their own.
// =============================================================================

mod html;
mod http;

pub use html::{
    extract_anchors, extract_meta_values, find_backlink, resolve_href, Anchor, BacklinkMatch,
};
pub use http::{normalize_url, BacklinkChecker, CheckResult};

use crate::error::Result;
use futures::future::BoxFuture;

/// Something that can tell whether an external page links to us.
pub trait LinkChecker: Send + Sync {
    /// Checks one page. An `Err` means the check itself could not run;
    /// an unreachable page is still `Ok` with status Lost.
    fn check<'a>(
        &'a self,
        external_url: &'a str,
        target_url: &'a str,
    ) -> BoxFuture<'a, Result<CheckResult>>;
}

impl LinkChecker for BacklinkChecker {
    fn check<'a>(
        &'a self,
        external_url: &'a str,
        target_url: &'a str,
    ) -> BoxFuture<'a, Result<CheckResult>> {
        Box::pin(async move { Ok(self.check_backlink(external_url, target_url).await) })
    }
}
