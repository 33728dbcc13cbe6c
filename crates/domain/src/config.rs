//! Environment-driven configuration structures shared by all binaries.

use std::{env, time::Duration};

use thiserror::Error;

pub const DEFAULT_PRICE_API_URL: &str = "https://price.jup.ag/v6/price";
pub const DEFAULT_NATIVE_ASSET_ID: &str = "SOL";
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_SIGNATURE_CACHE_TTL_SECS: u64 = 600;

pub const DEFAULT_BUYER_URL_BASE: &str = "https://solscan.io/account/";
pub const DEFAULT_TXN_URL_BASE: &str = "https://solscan.io/tx/";
pub const DEFAULT_SCREENER_URL_BASE: &str = "https://dexscreener.com/solana/";
pub const DEFAULT_SWAP_URL_BASE: &str = "https://jup.ag/swap/USDC-";

/// HTTP listener settings for the ingestion/internal surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    api_bind_address: String,
    api_unix_socket: Option<String>,
    internal_bind_address: Option<String>,
    internal_unix_socket: Option<String>,
}

impl ApiConfig {
    /// Loads only the environment variables required by the HTTP surface.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        Ok(Self {
            api_bind_address: get_required_var("API_BIND_ADDRESS")?,
            api_unix_socket: get_optional_var("API_UNIX_SOCKET"),
            internal_bind_address: get_optional_var("API_INTERNAL_BIND_ADDRESS"),
            internal_unix_socket: get_optional_var("API_INTERNAL_UNIX_SOCKET"),
        })
    }

    pub fn api_bind_address(&self) -> &str {
        &self.api_bind_address
    }

    pub fn api_unix_socket(&self) -> Option<&str> {
        self.api_unix_socket.as_deref()
    }

    pub fn internal_bind_address(&self) -> Option<&str> {
        self.internal_bind_address.as_deref()
    }

    pub fn internal_unix_socket(&self) -> Option<&str> {
        self.internal_unix_socket.as_deref()
    }

    pub fn has_internal_listener(&self) -> bool {
        self.internal_bind_address.is_some() || self.internal_unix_socket.is_some()
    }
}

/// Link bases interpolated into every caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionLinks {
    pub buyer_url_base: String,
    pub txn_url_base: String,
    pub screener_url_base: String,
    pub swap_url_base: String,
}

impl Default for CaptionLinks {
    fn default() -> Self {
        Self {
            buyer_url_base: DEFAULT_BUYER_URL_BASE.to_string(),
            txn_url_base: DEFAULT_TXN_URL_BASE.to_string(),
            screener_url_base: DEFAULT_SCREENER_URL_BASE.to_string(),
            swap_url_base: DEFAULT_SWAP_URL_BASE.to_string(),
        }
    }
}

/// Configuration for the monitoring pipeline: store, market data providers,
/// I/O deadlines and caption links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    database_url: String,
    solana_rpc_url: String,
    price_api_url: String,
    native_asset_id: String,
    io_timeout: Duration,
    signature_cache_ttl: Duration,
    links: CaptionLinks,
}

impl MonitorConfig {
    /// Loads configuration by hydrating `.env` (if present) and reading the
    /// process variables. Missing or malformed entries surface as
    /// `ConfigError` so binaries can respond gracefully.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let io_timeout_ms =
            get_positive_number_or("MONITOR_IO_TIMEOUT_MS", DEFAULT_IO_TIMEOUT_MS)?;
        let cache_ttl_secs = get_number_or(
            "SIGNATURE_CACHE_TTL_SECS",
            DEFAULT_SIGNATURE_CACHE_TTL_SECS,
        )?;

        Ok(Self {
            database_url: get_required_var("DATABASE_URL")?,
            solana_rpc_url: get_required_var("SOLANA_RPC_URL")?,
            price_api_url: get_optional_var("PRICE_API_URL")
                .unwrap_or_else(|| DEFAULT_PRICE_API_URL.to_string()),
            native_asset_id: get_optional_var("NATIVE_ASSET_ID")
                .unwrap_or_else(|| DEFAULT_NATIVE_ASSET_ID.to_string()),
            io_timeout: Duration::from_millis(io_timeout_ms),
            signature_cache_ttl: Duration::from_secs(cache_ttl_secs),
            links: CaptionLinks {
                buyer_url_base: get_optional_var("BUYER_URL_BASE")
                    .unwrap_or_else(|| DEFAULT_BUYER_URL_BASE.to_string()),
                txn_url_base: get_optional_var("TXN_URL_BASE")
                    .unwrap_or_else(|| DEFAULT_TXN_URL_BASE.to_string()),
                screener_url_base: get_optional_var("SCREENER_URL_BASE")
                    .unwrap_or_else(|| DEFAULT_SCREENER_URL_BASE.to_string()),
                swap_url_base: get_optional_var("SWAP_URL_BASE")
                    .unwrap_or_else(|| DEFAULT_SWAP_URL_BASE.to_string()),
            },
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn solana_rpc_url(&self) -> &str {
        &self.solana_rpc_url
    }

    pub fn price_api_url(&self) -> &str {
        &self.price_api_url
    }

    pub fn native_asset_id(&self) -> &str {
        &self.native_asset_id
    }

    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    pub fn signature_cache_ttl(&self) -> Duration {
        self.signature_cache_ttl
    }

    pub fn links(&self) -> &CaptionLinks {
        &self.links
    }
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    get_optional_var(key).ok_or(ConfigError::MissingVar { key })
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn get_number_or(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match get_optional_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|source| ConfigError::InvalidNumber { key, source }),
        None => Ok(default),
    }
}

fn get_positive_number_or(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match get_number_or(key, default)? {
        0 => Err(ConfigError::NotPositive { key }),
        value => Ok(value),
    }
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("BUY_ALERT_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("`{key}` must be greater than zero")]
    NotPositive { key: &'static str },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}
