//! Show how a query fans out into variants and what the ranked search returns.
//! Usage:
//!   cargo run --bin search_probe -- "<query>"
//!   cargo run --bin search_probe -- --variants-only "<query>"
//! Ranked results need TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cineseek::config::Config;
use cineseek::search;
use cineseek::tmdb::{poster_url, TmdbClient};
use dotenvy::dotenv;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_target(false)
        .compact()
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let variants_only = args.first().map(|a| a == "--variants-only") == Some(true);
    if variants_only {
        args.remove(0);
    }
    let query = args.join(" ");
    if query.trim().is_empty() {
        anyhow::bail!("Usage: search_probe [--variants-only] <query>");
    }

    let variants = search::generate(&query);
    println!("{} variants for {:?}:", variants.len(), query);
    for (i, v) in variants.iter().enumerate() {
        println!("  {:>3}  {}", i, v);
    }

    if variants_only {
        return Ok(());
    }

    let config = Config::from_env().context("ranked search needs TMDB configuration")?;
    let client = TmdbClient::from_config(&config);
    let results = search::rank(&client, &query).await?;

    println!("\n{} ranked results:", results.len());
    for item in results {
        println!(
            "  {:<6} {:>8} {:>9.2}  {}  {}",
            item.kind.as_str(),
            item.id,
            item.popularity,
            item.title,
            item.poster_path.as_deref().map(poster_url).unwrap_or_default()
        );
    }
    Ok(())
}
