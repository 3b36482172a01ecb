use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_BIND: &str = "0.0.0.0:3146";
const DEFAULT_FAVORITES_PATH: &str = "favorites.json";

#[derive(Debug, Clone)]
pub struct Settings {
    /// May be blank: the server still starts and catalog calls report a
    /// configuration error.
    pub tmdb_api_key: String,
    pub tmdb_base_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub favorites_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tmdb_api_key = lookup("TMDB_API_KEY").unwrap_or_default().trim().to_string();
        if tmdb_api_key.is_empty() {
            warn!("TMDB_API_KEY is not set; catalog requests will fail until it is configured");
        }

        let bind = non_blank("CATALOG_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .trim()
            .parse()
            .with_context(|| format!("CATALOG_BIND is not a socket address: '{}'", bind))?;

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url: non_blank("TMDB_BASE_URL").map(|v| v.trim().to_string()),
            bind_addr,
            favorites_path: non_blank("FAVORITES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FAVORITES_PATH)),
        })
    }
}
