//! Configuration module for the check-in dashboard.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream check-in API
    pub upstream_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Quiet period before a search query is applied
    pub search_debounce: Duration,
    /// Table row height in pixels
    pub row_height: f64,
    /// Rows rendered beyond each edge of the viewport
    pub overscan: usize,
    /// Upstream request timeout
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let upstream_url = env::var("CHECKIN_UPSTREAM_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/api".to_string());

        let bind_addr = parse_var("CHECKIN_BIND_ADDR", "127.0.0.1:8080")?;

        let log_level = env::var("CHECKIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let search_debounce = Duration::from_millis(parse_var("CHECKIN_SEARCH_DEBOUNCE_MS", "300")?);

        let row_height: f64 = parse_var("CHECKIN_ROW_HEIGHT", "48")?;
        if !(row_height.is_finite() && row_height > 0.0) {
            return Err(AppError::Validation(
                "CHECKIN_ROW_HEIGHT must be a positive number".to_string(),
            ));
        }

        let overscan = parse_var("CHECKIN_OVERSCAN", "5")?;

        let request_timeout =
            Duration::from_secs(parse_var("CHECKIN_REQUEST_TIMEOUT_SECS", "10")?);

        Ok(Self {
            upstream_url,
            bind_addr,
            log_level,
            search_debounce,
            row_height,
            overscan,
            request_timeout,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid {} value: {}", name, raw)))
}
