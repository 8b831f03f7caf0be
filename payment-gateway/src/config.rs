use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};

const MIN_PROCESSOR_TIMEOUT_MS: u64 = 100;
const DEFAULT_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:5173",
];

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Prefix the payment routes are mounted under; empty or `/` mounts them at the root.
    pub api_base_path: String,
    pub processor_timeout: Duration,
    pub merchant_header: String,
    pub cors_allowed_origins: Vec<String>,
    pub log_filter: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8086,
            api_base_path: "/v2".to_string(),
            processor_timeout: Duration::from_millis(30_000),
            merchant_header: "X-Merchant-ID".to_string(),
            cors_allowed_origins: DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
            log_filter: "info".to_string(),
        }
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let host = match env::var("HOST") {
            Ok(value) => value
                .parse::<IpAddr>()
                .with_context(|| format!("HOST is not an IP address: {value}"))?,
            Err(_) => defaults.host,
        };
        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {value}"))?,
            Err(_) => defaults.port,
        };
        let api_base_path = env::var("API_BASE_PATH")
            .map(|v| normalize_base_path(&v))
            .unwrap_or(defaults.api_base_path);
        let processor_timeout_ms = env::var("PROCESSOR_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(30_000);
        let merchant_header = env::var("MERCHANT_HEADER")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.merchant_header);
        axum::http::HeaderName::try_from(merchant_header.as_str()).with_context(|| {
            format!("MERCHANT_HEADER is not a valid header name: {merchant_header}")
        })?;
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.cors_allowed_origins);
        let log_filter = env::var("LOG_FILTER").unwrap_or(defaults.log_filter);

        let processor_timeout =
            Duration::from_millis(processor_timeout_ms.max(MIN_PROCESSOR_TIMEOUT_MS));

        Ok(Self {
            host,
            port,
            api_base_path,
            processor_timeout,
            merchant_header,
            cors_allowed_origins,
            log_filter,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}
