// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The binary can either run the HTTP service (`serve`) or do the same work
// from a terminal: check one page, run the batch, and manage stored records.
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "backlink-tracker",
    version,
    about = "Verify and track backlinks pointing to your website",
    long_about = "backlink-tracker checks whether external pages still link to your site, \
                  stores the results in a JSON file and serves a small HTTP API for an admin \
                  dashboard and a scheduled re-check."
)]
pub struct Cli {
    /// Path of the JSON storage file (overrides STORAGE_FILE)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    ///
    /// Example: backlink-tracker serve --bind 127.0.0.1:8080
    Serve {
        /// Address to listen on (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Check a single page for a link to the target domain
    ///
    /// Example: backlink-tracker check blog.example.com/review https://mying.vercel.app/products/a
    Check {
        /// Page that should contain the link (https:// is added if missing)
        external_url: String,

        /// Our page the link is expected to point to
        target_url: String,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-check every stored backlink once and update the storage file
    Cron {
        /// Output the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored backlinks
    List {
        /// Output records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Start tracking a backlink (status starts as Pending)
    Add {
        external_url: String,

        target_url: String,

        /// Language code of the target page (en, zh, ...)
        #[arg(long, default_value = "en")]
        language: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Stop tracking a backlink
    Remove {
        /// Id of the record, as shown by `list`
        id: String,
    },

    /// Print a random secret to use as CRON_SECRET
    GenSecret,
}
