//! API Configuration Module
//!
//! Server, CORS, pricing-source, cache and storage settings. Configuration is
//! loaded from environment variables with sensible defaults for development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_PRICING_BASE_URL: &str = "https://numbeo.p.rapidapi.com";
pub const DEFAULT_RAPIDAPI_HOST: &str = "numbeo.p.rapidapi.com";

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parse from a string; anything but `production`/`prod` is development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

// ============================================================================
// STORAGE / LOGGING SELECTION
// ============================================================================

/// Which store backs the cache and the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Lmdb { path: PathBuf, map_size_mb: usize },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "pretty" | "text" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

// ============================================================================
// PRICING SOURCE CONFIGURATION
// ============================================================================

/// Settings for the external pricing source client.
#[derive(Clone)]
pub struct PricingConfig {
    /// Base URL; `/city_cost` is appended.
    pub base_url: String,

    /// Value of the `X-RapidAPI-Key` header.
    pub api_key: String,

    /// Value of the `X-RapidAPI-Host` header.
    pub api_host: String,

    /// Per-attempt timeout.
    pub timeout: Duration,

    /// Extra attempts after a transport error or 5xx.
    pub max_retries: u32,
}

impl std::fmt::Debug for PricingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("api_host", &self.api_host)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PRICING_BASE_URL.to_string(),
            api_key: String::new(),
            api_host: DEFAULT_RAPIDAPI_HOST.to_string(),
            timeout: Duration::from_millis(10_000),
            max_retries: 1,
        }
    }
}

impl PricingConfig {
    /// Environment variables:
    /// - `COSTWISE_PRICING_BASE_URL`
    /// - `COSTWISE_RAPIDAPI_KEY` (or `RAPIDAPI_KEY`)
    /// - `COSTWISE_RAPIDAPI_HOST`
    /// - `COSTWISE_PRICING_TIMEOUT_MS` (default: 10000)
    /// - `COSTWISE_PRICING_MAX_RETRIES` (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("COSTWISE_PRICING_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.base_url),
            api_key: std::env::var("COSTWISE_RAPIDAPI_KEY")
                .or_else(|_| std::env::var("RAPIDAPI_KEY"))
                .unwrap_or_default(),
            api_host: std::env::var("COSTWISE_RAPIDAPI_HOST")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.api_host),
            timeout: std::env::var("COSTWISE_PRICING_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            max_retries: std::env::var("COSTWISE_PRICING_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub environment: Environment,

    pub bind_addr: SocketAddr,

    /// Allowed CORS origins. Empty means allow all (development only).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    pub pricing: PricingConfig,

    /// Maximum age of a cached city record.
    pub freshness_window: chrono::Duration,

    pub storage: StorageBackend,

    /// JSON array of city records upserted at startup.
    pub seed_file: Option<PathBuf>,

    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            cors_origins: Vec::new(),
            cors_max_age_secs: 86_400,
            pricing: PricingConfig::default(),
            freshness_window: chrono::Duration::days(
                costwise_storage::DEFAULT_FRESHNESS_WINDOW_DAYS,
            ),
            storage: StorageBackend::Memory,
            seed_file: None,
            log_format: LogFormat::Json,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Fails only on values that are present but unusable (bad bind address,
    /// unknown storage backend).
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let environment = std::env::var("COSTWISE_ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or_default();

        let cors_origins = std::env::var("COSTWISE_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let freshness_window = std::env::var("COSTWISE_FRESHNESS_WINDOW_DAYS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|days| *days >= 0)
            .map(chrono::Duration::days)
            .unwrap_or(defaults.freshness_window);

        Ok(Self {
            environment,
            bind_addr: resolve_bind_addr(
                std::env::var("COSTWISE_BIND_ADDR").ok(),
                std::env::var("PORT").ok(),
            )?,
            cors_origins,
            cors_max_age_secs: defaults.cors_max_age_secs,
            pricing: PricingConfig::from_env(),
            freshness_window,
            storage: storage_from_env()?,
            seed_file: std::env::var("COSTWISE_SEED_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            log_format: std::env::var("COSTWISE_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}

/// `COSTWISE_BIND_ADDR` wins; otherwise `PORT` replaces the default port.
pub fn resolve_bind_addr(bind: Option<String>, port: Option<String>) -> ApiResult<SocketAddr> {
    if let Some(addr) = bind.filter(|s| !s.trim().is_empty()) {
        return addr.trim().parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        });
    }

    let mut addr: SocketAddr = DEFAULT_BIND_ADDR
        .parse()
        .map_err(|e| ApiError::internal_error(format!("Invalid default bind address: {}", e)))?;
    if let Some(port_str) = port.filter(|s| !s.trim().is_empty()) {
        let port = port_str.trim().parse::<u16>().map_err(|_| {
            ApiError::invalid_input(format!("Invalid port value: {}", port_str))
        })?;
        addr.set_port(port);
    }
    Ok(addr)
}

fn storage_from_env() -> ApiResult<StorageBackend> {
    let backend = std::env::var("COSTWISE_STORAGE_BACKEND").unwrap_or_else(|_| "memory".into());
    match backend.trim().to_lowercase().as_str() {
        "memory" | "" => Ok(StorageBackend::Memory),
        "lmdb" => Ok(StorageBackend::Lmdb {
            path: std::env::var("COSTWISE_LMDB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/costwise")),
            map_size_mb: std::env::var("COSTWISE_LMDB_MAP_SIZE_MB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(256),
        }),
        other => Err(ApiError::invalid_input(format!(
            "Unknown storage backend '{}', expected 'memory' or 'lmdb'",
            other
        ))),
    }
}
