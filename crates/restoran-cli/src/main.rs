//! restoran - order food from the terminal.
//!
//! Each subcommand opens the app with the persisted session, enters the
//! matching view through the route guard, and performs one action.

mod commands;
mod views;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use restoran_core::models::PaymentMethod;
use restoran_core::{App, Config};

/// Directory for an optional rolling log file
const LOG_DIR_ENV: &str = "RESTORAN_LOG_DIR";

#[derive(Debug, Parser)]
#[command(name = "restoran", version, about = "Order food from the restoran backend")]
struct Cli {
    /// Backend base URL (overrides RESTORAN_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and store the session token
    Login {
        #[arg(long, env = "RESTORAN_EMAIL")]
        email: Option<String>,
        /// Keep the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },
    /// Forget the session token
    Logout {
        /// Also delete the remembered password
        #[arg(long)]
        forget: bool,
    },
    /// Show whether a session is stored
    Status,
    /// Show where navigating to PATH would land
    Open { path: String },
    /// List the menu of a restaurant
    Menu {
        #[arg(long, default_value = "1")]
        restaurant: String,
    },
    /// Add a menu item to the cart
    Add {
        menu_id: i64,
        #[arg(long, default_value = "1")]
        restaurant: String,
    },
    /// Show the cart
    Cart,
    /// Set the quantity of a cart line
    Qty { menu_id: i64, quantity: i64 },
    /// Remove a line from the cart
    Remove { menu_id: i64 },
    /// Place an order for everything in the cart
    Checkout {
        /// e-wallet, transfer or cod
        #[arg(long)]
        payment: Option<PaymentMethod>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Show order history
    Orders,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "restoran.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing();
    info!(command = ?cli.command, "restoran starting");

    let mut config = Config::load_or_default();
    config.apply_env();
    if let Some(url) = cli.api_url {
        config.api_base_url = Some(url);
    }

    let mut app = App::open(config)?;

    let ok = match cli.command {
        Command::Login { email, remember } => commands::login(&mut app, email, remember).await?,
        Command::Logout { forget } => commands::logout(&mut app, forget),
        Command::Status => commands::status(&app),
        Command::Open { path } => commands::open(&mut app, &path),
        Command::Menu { restaurant } => commands::menu(&mut app, restaurant).await,
        Command::Add { menu_id, restaurant } => commands::add(&mut app, restaurant, menu_id).await,
        Command::Cart => commands::cart(&mut app).await,
        Command::Qty { menu_id, quantity } => commands::quantity(&mut app, menu_id, quantity).await,
        Command::Remove { menu_id } => commands::remove(&mut app, menu_id).await,
        Command::Checkout { payment, address } => {
            commands::checkout(&mut app, payment, address.unwrap_or_default()).await
        }
        Command::Orders => commands::orders(&mut app).await,
    };

    views::print_notices(&app.take_notices());

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
