//! # Seed Data Generator
//!
//! Populates the database with reference data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./drumtrack.db (or $DRUMTRACK_DB_PATH)
//! cargo run -p drumtrack-db --bin seed
//!
//! # Specify database path
//! cargo run -p drumtrack-db --bin seed -- --db ./data/drumtrack.db
//!
//! # More log output
//! RUST_LOG=debug cargo run -p drumtrack-db --bin seed
//! ```
//!
//! ## Seeded Data
//! - The four drum categories: Love White, Mango White, King White, SOS White
//! - Shops
//! - One admin, one store manager and a handful of salespeople
//!
//! Rows are keyed by fixed ids, so running the seed twice adds nothing.

use std::env;

use drumtrack_core::{DrumCategory, Profile, Role, Shop};
use drumtrack_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CATEGORIES: &[(&str, &str)] = &[
    ("cat-love-white", "Love White"),
    ("cat-mango-white", "Mango White"),
    ("cat-king-white", "King White"),
    ("cat-sos-white", "SOS White"),
];

const SHOPS: &[(&str, &str)] = &[
    ("shop-westlands", "Westlands"),
    ("shop-industrial-area", "Industrial Area"),
    ("shop-mombasa-road", "Mombasa Road"),
];

const PROFILES: &[(&str, &str, Role)] = &[
    ("user-admin", "Admin", Role::Admin),
    ("user-manager", "Wanjiru Kamau", Role::StoreManager),
    ("user-amani", "Amani Otieno", Role::Salesperson),
    ("user-baraka", "Baraka Mwangi", Role::Salesperson),
    ("user-neema", "Neema Achieng", Role::Salesperson),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,drumtrack=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config = DbConfig::from_env()?;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("drumtrack Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path");
                println!("                     (default: $DRUMTRACK_DB_PATH or ./drumtrack.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {other}");
            }
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding database");
    let db = Database::new(config).await?;
    let catalog = db.catalog();

    let mut added = 0;

    for (id, name) in CATEGORIES {
        let category = DrumCategory {
            id: id.to_string(),
            name: name.to_string(),
        };
        if catalog.insert_category(&category).await? {
            added += 1;
        }
    }

    for (id, name) in SHOPS {
        let shop = Shop {
            id: id.to_string(),
            name: name.to_string(),
        };
        if catalog.insert_shop(&shop).await? {
            added += 1;
        }
    }

    for (id, name, role) in PROFILES {
        let slug = id.trim_start_matches("user-");
        let profile = Profile {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{slug}@drumtrack.local"),
            role: *role,
        };
        if catalog.insert_profile(&profile).await? {
            added += 1;
        }
    }

    info!(
        added,
        categories = catalog.list_categories().await?.len(),
        shops = catalog.list_shops().await?.len(),
        profiles = catalog.list_profiles().await?.len(),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
