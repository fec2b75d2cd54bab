//! # Seed Data Generator
//!
//! Populates the configured backend with sample catalog products.
//!
//! ## Usage
//! ```bash
//! # 20 products into the default SQLite file
//! DB_TYPE=sqlite cargo run -p cartwheel-store --bin seed
//!
//! # Custom amount into Redis
//! DB_TYPE=redis REDIS_URL=redis://localhost:6379 cargo run -p cartwheel-store --bin seed -- --count 200
//! ```
//!
//! Products get ids `1..=count`, so re-running the seed replaces the same
//! records instead of adding duplicates. Inventory is not seeded; the
//! ledger materializes each product's initial stock on first use.

use std::env;

use anyhow::{bail, Context};
use cartwheel_core::validation::validate_product;
use cartwheel_core::Product;
use cartwheel_store::{Backend, StoreConfig, Stores};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Manufacturers and the SKU prefix used for their products.
const MANUFACTURERS: &[(&str, &str)] = &[
    ("Acme Corporation", "ACME"),
    ("Globex", "GLBX"),
    ("Initech", "INTC"),
    ("Umbrella Supplies", "UMBR"),
    ("Stark Hardware", "STRK"),
    ("Wayne Outfitters", "WAYN"),
];

/// Number of catalog categories products are spread over.
const CATEGORY_COUNT: i64 = 8;

const DEFAULT_COUNT: i64 = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let count = match parse_args(env::args().skip(1))? {
        Some(count) => count,
        None => return Ok(()),
    };

    let config = StoreConfig::from_env().context("loading store configuration")?;
    if config.backend == Backend::Memory {
        warn!("DB_TYPE=memory: seeded products vanish when this process exits");
    }

    let stores = Stores::connect(&config)
        .await
        .with_context(|| format!("opening {} backend", config.backend))?;

    info!(backend = %config.backend, count, "Seeding products");

    for seed in 1..=count {
        let product = generate_product(seed);
        validate_product(&product).with_context(|| format!("generated product {seed}"))?;
        stores
            .products
            .upsert(&product)
            .await
            .with_context(|| format!("upserting product {seed}"))?;
    }

    info!(count, "Seed complete");
    Ok(())
}

/// Returns the product count, or `None` when only help was requested.
fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<Option<i64>> {
    let mut args = args;
    let mut count = DEFAULT_COUNT;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--count" => {
                let raw = args.next().context("--count needs a value")?;
                count = raw
                    .parse()
                    .with_context(|| format!("invalid --count '{raw}'"))?;
                if count < 1 {
                    bail!("--count must be positive");
                }
            }
            "-h" | "--help" => {
                println!("Cartwheel Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to upsert (default: {DEFAULT_COUNT})");
                println!("  -h, --help         Show this help message");
                println!();
                println!("The backend comes from DB_TYPE, SQLITE_PATH and REDIS_URL.");
                return Ok(None);
            }
            other => bail!("unknown argument '{other}'"),
        }
    }

    Ok(Some(count))
}

/// Generates a deterministic product for `seed`.
fn generate_product(seed: i64) -> Product {
    let index = (seed - 1) as usize % MANUFACTURERS.len();
    let (manufacturer, prefix) = MANUFACTURERS[index];

    Product {
        product_id: seed,
        sku: format!("{prefix}-{seed:05}"),
        manufacturer: manufacturer.to_string(),
        category_id: (seed - 1) % CATEGORY_COUNT + 1,
        weight: 100 + (seed * 37) % 4900,
        some_other_id: seed % 3 + 1,
    }
}
