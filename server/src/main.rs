//! coinfeed Binary
//!
//! Runs one currency operation and prints its response envelope as JSON.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coinfeed_common::ApiResponse;
use coinfeed_feed::{NameStrategy, ReqwestHttpClient};
use coinfeed_server::{open_catalog_store, CurrencyService, ServerConfig};

/// coinfeed CLI
#[derive(Parser, Debug)]
#[command(name = "coinfeed")]
#[command(about = "Bitcoin prices with localized currency names")]
struct Args {
    /// Locale for display names (overrides COINFEED_LOCALE)
    #[arg(short, long, global = true)]
    locale: Option<String>,

    /// Name strategy: resource or catalog (overrides COINFEED_NAME_STRATEGY)
    #[arg(short, long, global = true)]
    strategy: Option<NameStrategy>,

    /// Print service metrics in Prometheus text format to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch current prices with display names
    Prices,
    /// Resolve the display name of a currency
    Name { code: String },
    /// List every localized rendering of a currency
    Rows { code: String },
    /// Show the rendering of a currency for the locale
    Info { code: String },
    /// Add a rendering of a currency for the locale
    Add {
        code: String,
        name: String,
        short_name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Change the short name of a rendering
    UpdateShortName { code: String, short_name: String },
    /// Change the display name of a rendering
    UpdateName { code: String, name: String },
    /// Remove the rendering of a currency for the locale
    Delete { code: String },
}

fn print<T: Serialize>(response: &ApiResponse<T>) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(response.is_ok)
}

fn outcome(ok: bool, done: &str, failed: &str) -> ApiResponse<()> {
    let message = if ok { done } else { failed };
    ApiResponse::with_outcome(ok, message, None)
}

async fn run(
    service: &CurrencyService,
    command: Command,
    locale: &str,
    strategy: NameStrategy,
) -> anyhow::Result<bool> {
    match command {
        Command::Prices => print(&service.fetch_and_enrich_prices_with(locale, strategy).await),
        Command::Name { code } => {
            let name = service.resolve_currency_name_with(&code, locale, strategy).await;
            print(&ApiResponse::ok(name))
        }
        Command::Rows { code } => {
            let rows = service.list_currency_rows(&code).await;
            print(&ApiResponse::ok(rows))
        }
        Command::Info { code } => match service.query_currency_info(&code, locale).await {
            Some(row) => print(&ApiResponse::ok(row)),
            None => print(&outcome(false, "", "Currency info not found")),
        },
        Command::Add {
            code,
            name,
            short_name,
            description,
        } => {
            let ok = service
                .add_currency(&code, locale, &name, &short_name, &description)
                .await;
            print(&outcome(ok, "Currency added", "Failed to add currency"))
        }
        Command::UpdateShortName { code, short_name } => {
            let ok = service.update_short_name(&code, locale, &short_name).await;
            print(&outcome(ok, "Short name updated", "Failed to update short name"))
        }
        Command::UpdateName { code, name } => {
            let ok = service.update_currency_name(&code, locale, &name).await;
            print(&outcome(ok, "Currency name updated", "Failed to update currency name"))
        }
        Command::Delete { code } => {
            let ok = service.delete_currency(&code, locale).await;
            print(&outcome(ok, "Currency deleted", "Failed to delete currency"))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = ServerConfig::from_env();
    if let Some(locale) = args.locale {
        config.locale = locale;
    }
    if let Some(strategy) = args.strategy {
        config.name_strategy = strategy;
    }

    // Initialize logging; stdout carries the response envelope
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(
        locale = %config.locale,
        strategy = %config.name_strategy,
        database_url = %config.database_url,
        "Starting coinfeed"
    );

    let store = open_catalog_store(&config).await?;
    let http = Arc::new(ReqwestHttpClient::new());
    let service = CurrencyService::from_config(&config, store, http)?;

    let ok = run(&service, args.command, &config.locale, config.name_strategy).await?;

    let metrics = service.metrics().snapshot();
    info!(metrics = %serde_json::to_string(&metrics)?, "Service metrics");
    if args.metrics {
        eprint!("{}", service.metrics().to_prometheus());
    }

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
