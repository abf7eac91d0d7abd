//! Zella CLI - cart operations against a configured Cart API.
//!
//! # Usage
//!
//! ```bash
//! # Show the current cart
//! zella show
//!
//! # Add two units of a product in size M
//! zella add prod-123 M -q 2
//!
//! # Replace a line's quantity
//! zella update prod-123 M 5
//!
//! # Remove a line
//! zella remove prod-123 M
//!
//! # Replay the local guest cart into the server cart (requires a token)
//! zella sync
//! ```
//!
//! Without `CART_API_TOKEN` the CLI works against the locally persisted
//! guest cart; with a token it works against the server cart.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "zella")]
#[command(author, version, about = "Zella cart CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current cart
    Show,
    /// Add an item to the cart
    Add {
        /// Product reference
        product: String,

        /// Size (variant selector)
        size: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Replace a line's quantity
    Update {
        product: String,
        size: String,
        quantity: u32,
    },
    /// Remove a line from the cart
    Remove { product: String, size: String },
    /// Empty the local cart snapshot (server cart untouched)
    Clear,
    /// Replay the local guest cart into the server cart
    Sync,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show => commands::cart::show().await?,
        Commands::Add {
            product,
            size,
            quantity,
        } => commands::cart::add(&product, &size, quantity).await?,
        Commands::Update {
            product,
            size,
            quantity,
        } => commands::cart::update(&product, &size, quantity).await?,
        Commands::Remove { product, size } => commands::cart::remove(&product, &size).await?,
        Commands::Clear => commands::cart::clear().await?,
        Commands::Sync => commands::cart::sync().await?,
    }
    Ok(())
}
