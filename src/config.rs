use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_ADDR: &str = "0.0.0.0:3146";
const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub tmdb_language: String,
    pub bind_addr: SocketAddr,
    pub search_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let tmdb_api_key = env::var("TMDB_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("TMDB_API_KEY not set")?;
        let tmdb_language = optional("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.into());

        let bind_addr = optional("CINESEEK_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("CINESEEK_ADDR is not a valid socket address")?;

        let search_timeout = match optional("SEARCH_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().with_context(|| {
                format!("SEARCH_TIMEOUT_SECS must be whole seconds, got '{raw}'")
            })?,
            None => DEFAULT_SEARCH_TIMEOUT_SECS,
        };
        if search_timeout == 0 {
            anyhow::bail!("SEARCH_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            tmdb_api_key,
            tmdb_language,
            bind_addr,
            search_timeout: Duration::from_secs(search_timeout),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}
