//! Cruzy Cart CLI - drive a storefront cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the mini cart
//! cart show
//!
//! # Add two units of product 12
//! cart add 12 -q 2
//!
//! # Set a line's quantity (0 removes it)
//! cart update 12 3
//!
//! # Precache storefront pages for offline use
//! cart precache
//!
//! # Run a background-sync tag
//! cart sync sync-cart
//! ```
//!
//! Configuration is read from the environment (see `cruzy_cart::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use cruzy_cart::CartConfig;
use cruzy_core::ProductId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cart")]
#[command(author, version, about = "Cruzy Coffee cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the mini cart
    Show {
        /// Print the rendered panel HTML instead of a summary
        #[arg(long)]
        html: bool,
    },
    /// Show the item count
    Count,
    /// Add a product to the cart
    Add {
        product_id: ProductId,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a line (0 removes it)
    Update { line_key: String, quantity: u32 },
    /// Remove a line
    Remove { line_key: String },
    /// Empty the cart
    Clear,
    /// Check the precache list by installing an in-memory offline cache
    Precache,
    /// Run a background-sync tag
    Sync { tag: String },
    /// Print the notification a push message produces
    Push { payload: Option<String> },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cruzy_cart=info,cruzy_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Push payloads need no storefront
    if let Commands::Push { payload } = &cli.command {
        init_tracing();
        commands::offline::push(payload.as_deref());
        return;
    }

    let config = CartConfig::from_env();

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let result: Result<(), Box<dyn std::error::Error>> = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show { html } => commands::cart::show(config, html).await?,
        Commands::Count => commands::cart::count(config).await?,
        Commands::Add {
            product_id,
            quantity,
        } => commands::cart::add(config, product_id, quantity).await?,
        Commands::Update { line_key, quantity } => {
            commands::cart::update(config, &line_key, quantity).await?;
        }
        Commands::Remove { line_key } => commands::cart::remove(config, &line_key).await?,
        Commands::Clear => commands::cart::clear(config).await?,
        Commands::Precache => commands::offline::precache(config).await?,
        Commands::Sync { tag } => commands::offline::sync(config, &tag).await?,
        Commands::Push { payload } => commands::offline::push(payload.as_deref()),
    }
    Ok(())
}
