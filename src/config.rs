use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";
const DEFAULT_EXPLORER_URL: &str = "https://testnet.explorer.perawallet.app";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Explicit opt-in via `ALLOWED_ORIGINS=*`
    AnyOrigin,
    AllowList(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub per_minute: u32,
    pub burst: u32,
}

/// Presence of the Algorand integration settings. Secrets are never kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerConfig {
    pub network: String,
    pub algod_configured: bool,
    pub indexer_configured: bool,
    pub explorer_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub cors: CorsPolicy,
    pub rate_limit: Option<RateLimit>,
    pub db_max_connections: u32,
    pub db_connect_timeout: Duration,
    pub run_migrations: bool,
    pub reconcile_interval: Duration,
    pub log_level: Level,
    pub explorer: ExplorerConfig,
}

impl Default for AppConfig {
    /// Local defaults: no database, no rate limiting.
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            cors: parse_cors(DEFAULT_ALLOWED_ORIGINS),
            rate_limit: None,
            db_max_connections: 10,
            db_connect_timeout: Duration::from_secs(30),
            run_migrations: false,
            reconcile_interval: Duration::from_secs(15 * 60),
            log_level: Level::INFO,
            explorer: ExplorerConfig {
                network: "testnet".to_string(),
                algod_configured: false,
                indexer_configured: false,
                explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a local `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = AppConfig::default();

        let bind_addr = match var("BIND_ADDR") {
            Some(addr) => addr
                .parse()
                .with_context(|| format!("BIND_ADDR is not a socket address: {addr}"))?,
            None => defaults.bind_addr,
        };

        let per_minute: u32 = parse_or(var("RATE_LIMIT_PER_MINUTE"), "RATE_LIMIT_PER_MINUTE", 60)?;
        let burst: u32 = parse_or(var("RATE_LIMIT_BURST"), "RATE_LIMIT_BURST", 20)?;
        let rate_limit = (per_minute > 0).then(|| RateLimit {
            per_minute,
            burst: burst.max(1),
        });

        let log_level = match var("LOG_LEVEL") {
            Some(level) => level
                .parse::<Level>()
                .map_err(|_| anyhow::anyhow!("LOG_LEVEL is not a tracing level: {level}"))?,
            None => defaults.log_level,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            bind_addr,
            cors: var("ALLOWED_ORIGINS")
                .map(|v| parse_cors(&v))
                .unwrap_or(defaults.cors),
            rate_limit,
            db_max_connections: parse_or(var("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_connect_timeout: Duration::from_secs(parse_or(
                var("DB_CONNECT_TIMEOUT_SECS"),
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.db_connect_timeout.as_secs(),
            )?),
            run_migrations: parse_or(var("RUN_MIGRATIONS"), "RUN_MIGRATIONS", false)?,
            reconcile_interval: Duration::from_secs(parse_or(
                var("RECONCILE_INTERVAL_SECS"),
                "RECONCILE_INTERVAL_SECS",
                defaults.reconcile_interval.as_secs(),
            )?),
            log_level,
            explorer: ExplorerConfig {
                network: var("ALGORAND_NETWORK").unwrap_or(defaults.explorer.network),
                algod_configured: var("ALGOD_SERVER").is_some(),
                indexer_configured: var("ALGOD_INDEXER_SERVER").is_some(),
                explorer_url: var("ALGORAND_EXPLORER_URL").unwrap_or(defaults.explorer.explorer_url),
            },
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has invalid value {value:?}: {e}")),
        None => Ok(default),
    }
}

/// `*` means any origin; otherwise a comma separated allow-list.
pub fn parse_cors(raw: &str) -> CorsPolicy {
    if raw.trim() == "*" {
        return CorsPolicy::AnyOrigin;
    }
    let origins = raw
        .split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect();
    CorsPolicy::AllowList(origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3001");
        assert_eq!(config.rate_limit, Some(RateLimit { per_minute: 60, burst: 20 }));
        assert_eq!(config.reconcile_interval, Duration::from_secs(900));
        assert_eq!(config.explorer.network, "testnet");
        assert!(!config.explorer.algod_configured);
        assert_eq!(
            config.cors,
            CorsPolicy::AllowList(vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string()
            ])
        );
    }

    #[test]
    fn allow_list_is_trimmed_and_star_means_any() {
        assert_eq!(
            parse_cors(" https://medfi.net/ , ,https://app.medfi.net"),
            CorsPolicy::AllowList(vec![
                "https://medfi.net".to_string(),
                "https://app.medfi.net".to_string()
            ])
        );
        assert_eq!(parse_cors("*"), CorsPolicy::AnyOrigin);
    }

    #[test]
    fn zero_rate_limit_disables_governor() {
        let config = config_from(&[("RATE_LIMIT_PER_MINUTE", "0")]).unwrap();
        assert!(config.rate_limit.is_none());
    }

    #[test]
    fn explorer_flags_follow_presence_only() {
        let config = config_from(&[
            ("ALGOD_SERVER", "https://testnet-api.algonode.cloud"),
            ("ALGOD_INDEXER_SERVER", "   "),
        ])
        .unwrap();
        assert!(config.explorer.algod_configured);
        assert!(!config.explorer.indexer_configured);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = config_from(&[("DB_MAX_CONNECTIONS", "lots")]).unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
        assert!(config_from(&[("BIND_ADDR", "nowhere")]).is_err());
        assert!(config_from(&[("LOG_LEVEL", "chatty")]).is_err());
    }
}
