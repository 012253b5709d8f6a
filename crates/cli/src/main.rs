//! Cacao CLI - drive the cart engine from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted cart
//! cacao show
//!
//! # Add one unit of a product
//! cacao add C1 --name "Dark 70%" --price 25.00 --stock 5
//!
//! # Take one unit off a line, or remove it entirely
//! cacao remove C1
//! cacao remove C1 --all
//!
//! # Adjust a line by a signed delta
//! cacao qty C1 -- -2
//!
//! # Push the cart to the server, or prepare a checkout
//! cacao sync
//! cacao checkout
//! ```
//!
//! # Commands
//!
//! - `show` - Print the cart
//! - `add` / `remove` / `qty` - Mutate the cart
//! - `clear` - Empty the cart locally and (best-effort) on the server
//! - `sync` - Push the cart to the server cart endpoints
//! - `checkout` - Clear-then-sync pass in preparation for checkout
//! - `complete` - Record a completed purchase (normally the payment
//!   return page does this), so the next run starts empty

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use cacao_cart::config::CartConfig;
use cacao_cart::notify::{Notifier, TracingNotifier};
use cacao_cart::persist::{CartArchive, JsonFileStore};
use cacao_cart::store::CartStore;
use cacao_cart::sync::{HttpCartTransport, SyncClient};
use cacao_cart::token::{CookieTokenSource, TokenSource};
use cacao_core::{Price, ProductId};

#[derive(Parser)]
#[command(name = "cacao")]
#[command(author, version, about = "Cacao cart CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product id
        id: String,

        /// Product name
        #[arg(short, long)]
        name: String,

        /// Unit price in ringgit
        #[arg(short, long)]
        price: Decimal,

        /// Available stock reported by the listing
        #[arg(short, long)]
        stock: u32,
    },
    /// Take one unit off a line, or remove it entirely
    Remove {
        /// Product id
        id: String,

        /// Remove the whole line
        #[arg(long)]
        all: bool,
    },
    /// Adjust a line's quantity by a signed delta
    Qty {
        /// Product id
        id: String,

        /// Signed quantity change
        #[arg(allow_hyphen_values = true)]
        delta: i32,
    },
    /// Empty the cart locally and (best-effort) on the server
    Clear,
    /// Push the cart to the server cart endpoints
    Sync,
    /// Clear-then-sync pass in preparation for checkout
    Checkout,
    /// Record a completed purchase so the next run starts empty
    Complete,
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
    let config = CartConfig::from_env()?;

    let slot = JsonFileStore::new(&config.storage_dir);
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let archive = CartArchive::new(Box::new(slot.clone()));
    let mut store = CartStore::open(archive, notifier.clone());

    let tokens: Arc<dyn TokenSource> = Arc::new(CookieTokenSource::new(
        config.cookies.clone().unwrap_or_default(),
        config.token_cookie.clone(),
    ));
    let sync = SyncClient::new(HttpCartTransport::new(&config)?, tokens, notifier);

    match cli.command {
        Commands::Show => show(&store),
        Commands::Add {
            id,
            name,
            price,
            stock,
        } => {
            if store
                .add_item(ProductId::new(id), &name, Price::ringgit(price), stock)
                .is_ok()
            {
                show(&store);
            }
        }
        Commands::Remove { id, all } => {
            let id = ProductId::new(id);
            if store.remove_item(&id, all) {
                // mirror the removal to the server right away
                sync.resync(store.items()).await;
            }
            show(&store);
        }
        Commands::Qty { id, delta } => {
            if store.set_quantity(&ProductId::new(id), delta).is_ok() {
                show(&store);
            }
        }
        Commands::Clear => {
            store.clear();
            sync.clear_remote().await;
        }
        Commands::Sync => {
            let report = sync.sync_all(store.items()).await?;
            println!(
                "synced {} line(s), {} failed",
                report.success_count, report.fail_count
            );
        }
        Commands::Checkout => {
            let report = sync.prepare_checkout(store.items()).await?;
            if report.is_complete() {
                println!("cart synced, ready for checkout");
            } else {
                println!(
                    "sync incomplete ({} line(s) failed), checkout not started",
                    report.fail_count
                );
            }
        }
        Commands::Complete => {
            CartArchive::new(Box::new(slot)).mark_checkout_completed();
            println!("checkout completion recorded");
        }
    }
    Ok(())
}

fn show(store: &CartStore) {
    if store.is_empty() {
        println!("cart is empty");
        return;
    }
    for item in store.items() {
        println!(
            "{:<10} {:<28} x{:<3} {}",
            item.id.as_str(),
            item.name,
            item.quantity,
            item.line_total().display()
        );
    }
    println!(
        "{} item(s), total {}",
        store.item_count(),
        Price::ringgit(store.total()).display()
    );
}
