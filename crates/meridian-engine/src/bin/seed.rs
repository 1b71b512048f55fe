//! # Seed Data Generator
//!
//! Populates a database with what a local session needs: one operator,
//! a small catalog, payment types and payment documents.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database
//! cargo run -p meridian-engine --bin seed
//!
//! # Specify database path and operator password
//! cargo run -p meridian-engine --bin seed -- --db ./meridian_dev.db --password s3cret
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use meridian_core::{Money, PaymentSchedule, TenderKind};
use meridian_db::{
    commit, Database, PaymentDocumentRepository, PaymentTypeRepository, ProductRepository,
    UserRepository,
};
use meridian_engine::{hash_password, telemetry, EngineConfig};

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";

/// (name, price, stock)
const PRODUCTS: &[(&str, &str, i64)] = &[
    ("Coffee beans 500g", "18.90", 40),
    ("Whole milk 1L", "4.49", 120),
    ("Sourdough loaf", "7.25", 25),
    ("Sparkling water 6-pack", "9.99", 60),
    ("Olive oil 500ml", "24.50", 30),
    ("Basmati rice 1kg", "8.75", 80),
    ("Dark chocolate 100g", "5.60", 90),
    ("Orange juice 1L", "6.20", 45),
];

/// (description, schedule definition)
const PAYMENT_TYPES: &[(&str, &str)] = &[
    ("Cash", "00"),
    ("Down payment + 30 days", "00/30"),
    ("30/60 days", "30/60"),
    ("30/60/90 days", "30/60/90"),
];

const PAYMENT_DOCUMENTS: &[(&str, TenderKind)] = &[
    ("Cash", TenderKind::Cash),
    ("Debit card", TenderKind::DebitCard),
    ("Credit card", TenderKind::CreditCard),
    ("Store credit", TenderKind::Deferred),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut password = DEFAULT_PASSWORD.to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                config_path = args.get(i).map(PathBuf::from);
            }
            "--db" | "-d" => {
                i += 1;
                db_path = args.get(i).map(PathBuf::from);
            }
            "--password" | "-p" => {
                i += 1;
                match args.get(i) {
                    Some(value) => password = value.clone(),
                    None => bail!("--password needs a value"),
                }
            }
            "--help" | "-h" => {
                println!("Meridian POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>    Engine config file (default: platform config dir)");
                println!("  -d, --db <PATH>        Database file path (overrides config)");
                println!("  -p, --password <PASS>  Password for the '{}' operator", DEFAULT_USERNAME);
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            other => bail!("Unknown argument: {}", other),
        }
        i += 1;
    }

    let mut config = EngineConfig::load(config_path).context("loading engine config")?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    telemetry::init_tracing(&config.logging);

    println!("Meridian POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", config.database.path.display());
    println!();

    let db = Database::new(config.database.to_db_config())
        .await
        .context("opening database")?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let mut tx = db.begin().await?;

    if UserRepository::get_by_username(&mut tx, DEFAULT_USERNAME)
        .await?
        .is_some()
    {
        println!("⚠ Operator '{}' already exists", DEFAULT_USERNAME);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let hash = hash_password(&password)?;
    let user = UserRepository::insert(&mut tx, DEFAULT_USERNAME, &hash).await?;
    println!("✓ Operator '{}' ({})", user.username, user.id);

    for (name, price, stock) in PRODUCTS {
        let price = Money::parse_decimal(price).with_context(|| format!("price of {}", name))?;
        ProductRepository::insert(&mut tx, name, price, *stock).await?;
    }
    println!("✓ {} products", PRODUCTS.len());

    for (description, definition) in PAYMENT_TYPES {
        let schedule = PaymentSchedule::parse(definition)
            .with_context(|| format!("schedule of {}", description))?;
        PaymentTypeRepository::insert(&mut tx, description, &schedule).await?;
    }
    println!("✓ {} payment types", PAYMENT_TYPES.len());

    for (description, tender) in PAYMENT_DOCUMENTS {
        PaymentDocumentRepository::insert(&mut tx, description, *tender).await?;
    }
    println!("✓ {} payment documents", PAYMENT_DOCUMENTS.len());

    commit(tx).await?;
    db.close().await;

    println!();
    println!("Done. Log in as '{}'.", DEFAULT_USERNAME);

    Ok(())
}
