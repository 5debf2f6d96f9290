// src/lib.rs
// =============================================================================
// backlink-tracker: verifies that external pages still link to our site and
// keeps track of them.
//
// Modules:
// - checker: fetch a page, find a link to the target domain, classify it
// - storage: the backlink records and the JSON file they live in
// - cron: re-check every stored backlink in one pass
// - ratelimit: fixed-window limiter for the public contact form
// - server: the HTTP API tying it all together
// - config / error: settings and the shared error type
// =============================================================================

pub mod checker;
pub mod config;
pub mod cron;
pub mod error;
pub mod ratelimit;
pub mod server;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
