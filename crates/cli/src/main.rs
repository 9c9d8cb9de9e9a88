//! Order Tracker CLI - Keeps a tracker workbook in sync with the order API.
//!
//! # Usage
//!
//! ```bash
//! # Update the workbook named in tracker.yaml
//! order-tracker run
//!
//! # Update another workbook without saving
//! order-tracker run --config tracker.yaml --workbook orders.xlsx --dry-run
//!
//! # Print the normalized fields of one order
//! order-tracker show 98765432 --kind sales_order
//!
//! # Validate configuration only
//! order-tracker check-config
//! ```
//!
//! # Commands
//!
//! - `run` - Update the tracker workbook
//! - `show` - Fetch (or read) one order and print it as JSON
//! - `check-config` - Validate the tracker file and API environment
//!
//! # Logging
//!
//! `RUST_LOG` controls verbosity (default `order_tracker=info`). Set
//! `ORDER_TRACKER_LOG_JSON=1` for JSON log lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use order_tracker_core::OrderNumberKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "order-tracker")]
#[command(author, version, about = "Order status tracker for xlsx workbooks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the tracker workbook from the order API
    Run {
        /// Tracker file
        #[arg(short, long, default_value = "tracker.yaml")]
        config: PathBuf,

        /// Workbook to update instead of the configured one
        #[arg(short, long)]
        workbook: Option<PathBuf>,

        /// Process everything but do not save the workbook
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the normalized fields and line items of one order
    Show {
        /// Order number
        #[arg(required_unless_present = "file")]
        order: Option<String>,

        /// Tracker file (used for the default order kind)
        #[arg(short, long, default_value = "tracker.yaml")]
        config: PathBuf,

        /// Order number kind (`sales_order`, `web_order`, `purchase_order`)
        #[arg(short, long)]
        kind: Option<OrderNumberKind>,

        /// Parse a saved API response instead of calling the API
        #[arg(short, long, conflicts_with = "order")]
        file: Option<PathBuf>,
    },
    /// Validate the tracker file and API environment
    CheckConfig {
        /// Tracker file
        #[arg(short, long, default_value = "tracker.yaml")]
        config: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // .env may set RUST_LOG
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "order_tracker=info,order_tracker_cli=info".into());

    // Logs go to stderr so `show` output can be piped
    let json = std::env::var("ORDER_TRACKER_LOG_JSON").is_ok_and(|v| !v.is_empty() && v != "0");
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run {
            config,
            workbook,
            dry_run,
        } => {
            commands::run::execute(&config, workbook, dry_run).await?;
        }
        Commands::Show {
            order,
            config,
            kind,
            file,
        } => match file {
            Some(file) => commands::show::from_file(&file)?,
            None => commands::show::from_api(order.as_deref().unwrap_or_default(), &config, kind).await?,
        },
        Commands::CheckConfig { config } => commands::check::execute(&config)?,
    }
    Ok(())
}
