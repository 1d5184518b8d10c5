use std::time::Duration;

use reqwest::Url;
use sdtd_shared::ClaimType;
use thiserror::Error;

pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:8082";
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

pub const DASHBOARD_URL_ENV: &str = "SDTD_DASHBOARD_URL";
pub const HTTP_TIMEOUT_ENV: &str = "CLAIMS_HTTP_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_ENV: &str = "CLAIMS_CONNECT_TIMEOUT_SECS";
pub const FETCH_CONCURRENCY_ENV: &str = "CLAIMS_FETCH_CONCURRENCY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid dashboard URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Where the map tile server listens, relative to the dashboard.
///
/// The tile server sits on the same host one port below the web API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocsMap {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl AllocsMap {
    pub fn from_dashboard_url(url: &Url) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port"))?
            .checked_sub(1)
            .filter(|port| *port > 0)
            .ok_or_else(|| invalid("port leaves no room for the map server"))?;

        Ok(Self {
            protocol: url.scheme().to_string(),
            host: host.to_string(),
            port,
        })
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Settings resolved once at startup and handed to whatever needs them.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub dashboard_url: Url,
    pub allocs_map: AllocsMap,
    pub claim_types: Vec<ClaimType>,
    pub http_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub fetch_concurrency: usize,
}

impl DashboardConfig {
    pub fn new(dashboard_url: &str) -> Result<Self, ConfigError> {
        let dashboard_url = parse_dashboard_url(dashboard_url)?;
        let allocs_map = AllocsMap::from_dashboard_url(&dashboard_url)?;
        Ok(Self {
            dashboard_url,
            allocs_map,
            claim_types: ClaimType::ALL.to_vec(),
            http_timeout: None,
            connect_timeout: None,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        })
    }

    /// Reads the environment; an explicit `url` wins over `SDTD_DASHBOARD_URL`.
    pub fn from_env(url: Option<&str>) -> Result<Self, ConfigError> {
        let url = match url {
            Some(url) => url.to_string(),
            None => dashboard_url(),
        };
        let mut config = Self::new(&url)?;
        config.http_timeout = http_timeout();
        config.connect_timeout = connect_timeout();
        config.fetch_concurrency = fetch_concurrency();
        Ok(config)
    }
}

fn parse_dashboard_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }
    Ok(url)
}

pub fn dashboard_url() -> String {
    std::env::var(DASHBOARD_URL_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_DASHBOARD_URL.to_string())
}

pub fn http_timeout() -> Option<Duration> {
    positive_secs(HTTP_TIMEOUT_ENV)
}

pub fn connect_timeout() -> Option<Duration> {
    positive_secs(CONNECT_TIMEOUT_ENV)
}

pub fn fetch_concurrency() -> usize {
    std::env::var(FETCH_CONCURRENCY_ENV)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_FETCH_CONCURRENCY)
}

fn positive_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
}
