// src/main.rs
// =============================================================================
// This is the entry point of the backlink-tracker binary.
//
// What happens here:
// 1. Load .env and configuration, parse command-line arguments
// 2. Set up logging (to stderr, so --json output on stdout stays clean)
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = lost/missing backlinks, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use backlink_tracker::checker::{BacklinkChecker, CheckResult};
use backlink_tracker::config::Config;
use backlink_tracker::cron::{self, BatchReport};
use backlink_tracker::server::{self, AppState};
use backlink_tracker::storage::{
    Backlink, BacklinkStatus, BacklinkStore, JsonFileStore, NewBacklink,
};
use clap::Parser;
use cli::{Cli, Commands};
use rand::RngCore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = all good
//   Ok(1) = a checked backlink is lost, or a record was not found
//   Err   = unexpected error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(path) = cli.storage {
        config.storage.file = path;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            handle_serve(config).await
        }
        Commands::Check {
            external_url,
            target_url,
            json,
        } => handle_check(&config, &external_url, &target_url, json).await,
        Commands::Cron { json } => handle_cron(&config, json).await,
        Commands::List { json } => handle_list(&config, json).await,
        Commands::Add {
            external_url,
            target_url,
            language,
            notes,
        } => {
            let new = NewBacklink {
                external_url,
                target_url,
                language,
                notes,
            };
            handle_add(&config, new).await
        }
        Commands::Remove { id } => handle_remove(&config, &id).await,
        Commands::GenSecret => {
            println!("{}", generate_secret());
            Ok(0)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn handle_serve(config: Config) -> Result<i32> {
    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.bind_addr))?;

    info!(
        bind_addr = %addr,
        storage = %config.storage.file.display(),
        target_domain = %config.checker.target_domain,
        cron_secret = config.auth.cron_secret.is_some(),
        "Starting backlink tracker"
    );

    let store = Arc::new(JsonFileStore::new(config.storage.file.clone()));
    let checker = Arc::new(BacklinkChecker::new(&config.checker)?);
    let state = Arc::new(AppState::new(config, store, checker));

    server::serve(state, addr).await?;
    Ok(0)
}

async fn handle_check(
    config: &Config,
    external_url: &str,
    target_url: &str,
    json: bool,
) -> Result<i32> {
    let checker = BacklinkChecker::new(&config.checker)?;

    if !json {
        println!(
            "🔍 Checking {} for a link to {}",
            external_url,
            checker.target_domain()
        );
    }

    let result = checker.check_backlink(external_url, target_url).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_check_result(&result);
    }

    Ok(if result.status == BacklinkStatus::Lost { 1 } else { 0 })
}

async fn handle_cron(config: &Config, json: bool) -> Result<i32> {
    let store = JsonFileStore::new(config.storage.file.clone());
    let checker = BacklinkChecker::new(&config.checker)?;

    let report = cron::run_batch(&store, &checker).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(if report.results.lost > 0 { 1 } else { 0 })
}

async fn handle_list(config: &Config, json: bool) -> Result<i32> {
    let store = JsonFileStore::new(config.storage.file.clone());
    let backlinks = store.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&backlinks)?);
    } else if backlinks.is_empty() {
        println!("No backlinks tracked yet");
    } else {
        print_table(&backlinks);
    }

    Ok(0)
}

async fn handle_add(config: &Config, new: NewBacklink) -> Result<i32> {
    let store = JsonFileStore::new(config.storage.file.clone());
    let backlink = store.create(new).await?;

    println!("✅ Added {} ({})", backlink.id, backlink.external_url);
    Ok(0)
}

async fn handle_remove(config: &Config, id: &str) -> Result<i32> {
    let store = JsonFileStore::new(config.storage.file.clone());

    if store.delete(id).await? {
        println!("🗑️  Removed {}", id);
        Ok(0)
    } else {
        println!("⚠️  No backlink with id {}", id);
        Ok(1)
    }
}

// 32 random bytes, hex encoded
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn print_check_result(result: &CheckResult) {
    println!("   Status:      {}", format_status(&result.status));
    if let Some(link_type) = result.link_type {
        println!("   Link type:   {:?}", link_type);
    }
    if let Some(text) = &result.anchor_text {
        println!("   Anchor text: {}", text);
    }
    if let Some(code) = result.http_status {
        println!("   HTTP status: {}", code);
    }
    if let Some(error) = &result.error {
        println!("   Error:       {}", error);
    }
}

fn print_summary(report: &BatchReport) {
    let results = &report.results;
    println!("📊 Batch finished at {}", report.timestamp.to_rfc3339());
    println!("   📋 Total:     {}", results.total);
    println!("   🔎 Checked:   {}", results.checked);
    println!("   ✅ Active:    {}", results.active);
    println!("   🚫 No-Follow: {}", results.no_follow);
    println!("   ❌ Lost:      {}", results.lost);
    println!("   ⚠️  Errors:    {}", results.errors);
}

// Prints stored backlinks as a human-readable table
fn print_table(backlinks: &[Backlink]) {
    println!(
        "{:<28} {:<50} {:<14} {:<6} {:<20}",
        "ID", "EXTERNAL URL", "STATUS", "LANG", "LAST CHECKED"
    );
    println!("{}", "=".repeat(122));

    for backlink in backlinks {
        // Truncate URL if too long for display
        let url_display = if backlink.external_url.chars().count() > 47 {
            let head: String = backlink.external_url.chars().take(47).collect();
            format!("{}...", head)
        } else {
            backlink.external_url.clone()
        };
        let last_checked = backlink
            .last_checked
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "{:<28} {:<50} {:<14} {:<6} {:<20}",
            backlink.id,
            url_display,
            format_status(&backlink.status),
            backlink.language,
            last_checked
        );
    }

    println!();
    println!("📋 Total: {}", backlinks.len());
}

fn format_status(status: &BacklinkStatus) -> &'static str {
    match status {
        BacklinkStatus::Active => "✅ Active",
        BacklinkStatus::NoFollow => "🚫 No-Follow",
        BacklinkStatus::Lost => "❌ Lost",
        BacklinkStatus::Pending => "⏳ Pending",
    }
}
