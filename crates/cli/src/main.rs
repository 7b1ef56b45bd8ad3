//! Campus Market CLI - browse listings and manage the cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List available listings, optionally filtered
//! cm-cli products --search lamp --category dorm-items
//!
//! # Work with the cart
//! cm-cli cart show
//! cm-cli cart add 64f1c2
//! cm-cli cart remove 64f1c2
//! cm-cli cart clear
//!
//! # How to reach a seller
//! cm-cli contact 64f1c2
//!
//! # Show the anonymous session and active configuration
//! cm-cli session
//! ```
//!
//! Configuration comes from `CAMPUS_MARKET_*` environment variables (or a
//! `.env` file). `--mode` overrides `CAMPUS_MARKET_CART_MODE`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use campus_market_storefront::config::{CartMode, StorefrontConfig};
use campus_market_storefront::error::AppError;
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cm-cli")]
#[command(author, version, about = "Campus Market command-line client")]
struct Cli {
    /// Cart backend to use (`local`, `session`, `authenticated`)
    #[arg(long, global = true)]
    mode: Option<CartMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List marketplace listings
    Products {
        /// Case-insensitive text matched against title and description
        #[arg(short, long)]
        search: Option<String>,

        /// Category value (see `--category all`)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Show how to contact the seller of a listing
    Contact {
        /// Listing id
        id: String,
    },
    /// Show the anonymous session id and active configuration
    Session,
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart and its total
    Show,
    /// Add a listing by id
    Add {
        /// Listing id
        id: String,
    },
    /// Remove a listing by id
    Remove {
        /// Listing id
        id: String,
    },
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
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
    // Command output goes to stdout, logs to stderr
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campus_market_storefront=info,cm_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration first: the Sentry client must exist before the subscriber
    let config = match StorefrontConfig::from_env() {
        Ok(mut config) => {
            if let Some(mode) = cli.mode {
                config.cart_mode = mode;
            }
            config
        }
        Err(e) => {
            init_tracing();
            let e = AppError::from(e);
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let _sentry_guard = init_sentry(&config);
    init_tracing();

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_reportable() {
                let event_id = sentry::capture_error(&e);
                tracing::error!(sentry_event_id = %event_id, "Command failed: {e}");
            } else {
                tracing::error!("Command failed: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(command: Commands, config: StorefrontConfig) -> Result<(), AppError> {
    let storefront = commands::open(config)?;

    match command {
        Commands::Products { search, category } => {
            commands::products::list(&storefront, search, category).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront).await,
            CartAction::Add { id } => commands::cart::add(&storefront, id).await?,
            CartAction::Remove { id } => commands::cart::remove(&storefront, id).await,
            CartAction::Clear => commands::cart::clear(&storefront).await,
        },
        Commands::Contact { id } => commands::contact::show(&storefront, id).await?,
        Commands::Session => commands::session::show(&storefront),
    }
    Ok(())
}
