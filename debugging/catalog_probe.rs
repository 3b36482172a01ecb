//! Run one catalog operation against live TMDB and print the result as JSON.
//! Usage:
//!   cargo run --bin catalog_probe -- home
//!   cargo run --bin catalog_probe -- search <query> [page]
//!   cargo run --bin catalog_probe -- movie <tmdb_id>
//!   cargo run --bin catalog_probe -- tv <tmdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use globocatalog::catalog::Catalog;
use globocatalog::favorites::{FavoriteStore, MemoryPreferences};
use globocatalog::models::MediaType;
use globocatalog::tmdb::TmdbClient;
use serde::Serialize;
use std::env;
use std::sync::Arc;

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin catalog_probe -- home");
    eprintln!("       cargo run --bin catalog_probe -- search <query> [page]");
    eprintln!("       cargo run --bin catalog_probe -- movie|tv <tmdb_id>");
    std::process::exit(1);
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let tmdb = Arc::new(TmdbClient::from_env()?);
    let favorites = Arc::new(FavoriteStore::load(Arc::new(MemoryPreferences::new())).await);
    let catalog = Catalog::new(tmdb, favorites);

    match args[1].as_str() {
        "home" => {
            let sections = catalog.home_sections().await?;
            print_json(&sections)?;
            eprintln!("cached ids: {:?}", catalog.caches().snapshot());
        }
        "search" => {
            let query = args.get(2).unwrap_or_else(|| usage());
            let page: u32 = match args.get(3) {
                Some(raw) => raw.parse().context("page must be a positive integer")?,
                None => 1,
            };
            print_json(&catalog.search_content(query, page).await?)?;
        }
        kind @ ("movie" | "tv") => {
            let media_type: MediaType = kind.parse()?;
            let tmdb_id: i32 = args
                .get(2)
                .unwrap_or_else(|| usage())
                .parse()
                .context("tmdb_id must be an integer")?;
            print_json(&catalog.content_details(tmdb_id, media_type).await?)?;
        }
        _ => usage(),
    }
    Ok(())
}
