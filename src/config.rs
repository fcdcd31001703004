//! Runtime configuration
//!
//! Values are read from `COIN_DASHBOARD_*` environment variables and fall back
//! to the defaults in [`crate::constants`]. The CLI applies its flags on top.

use crate::constants::{
    COINGECKO_API_URL, DEFAULT_CHART_DAYS, DEFAULT_PER_PAGE, DEFAULT_STORAGE_FILE,
    DEFAULT_VS_CURRENCY, FAVORITES_TTL_MS, INITIAL_BACKOFF_MS, LISTING_TTL_MS, MAX_RETRIES,
    REQUEST_TIMEOUT_SECS, SEARCH_DEBOUNCE_MS,
};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Dashboard configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the market data API
    pub api_base_url: String,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// Quote currency for prices
    pub vs_currency: String,
    /// Coins per dashboard page
    pub per_page: u32,
    /// Window of the coin detail chart in days
    pub chart_days: u32,
    /// Freshness tolerance for listings, detail and charts
    pub listing_ttl: Duration,
    /// Freshness tolerance for the favorites view
    pub favorites_ttl: Duration,
    /// Extra attempts for listing requests
    pub max_retries: u32,
    /// First retry delay, doubled per attempt
    pub initial_backoff: Duration,
    /// Quiet period for search input
    pub search_debounce: Duration,
    /// File backing the favorites storage
    pub storage_path: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `COIN_DASHBOARD_API_URL` - API base URL
    /// - `COIN_DASHBOARD_REQUEST_TIMEOUT` - request timeout in seconds (default: 10)
    /// - `COIN_DASHBOARD_CURRENCY` - quote currency (default: usd)
    /// - `COIN_DASHBOARD_PER_PAGE` - coins per page (default: 25)
    /// - `COIN_DASHBOARD_CHART_DAYS` - chart window in days (default: 30)
    /// - `COIN_DASHBOARD_LISTING_TTL_MS` - listing freshness (default: 60000)
    /// - `COIN_DASHBOARD_FAVORITES_TTL_MS` - favorites freshness (default: 30000)
    /// - `COIN_DASHBOARD_MAX_RETRIES` - listing retries (default: 1)
    /// - `COIN_DASHBOARD_STORAGE` - storage file (default: coin-dashboard.json)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env::var("COIN_DASHBOARD_API_URL").unwrap_or(defaults.api_base_url),
            request_timeout: env_parse("COIN_DASHBOARD_REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            vs_currency: env::var("COIN_DASHBOARD_CURRENCY").unwrap_or(defaults.vs_currency),
            per_page: env_parse("COIN_DASHBOARD_PER_PAGE").unwrap_or(defaults.per_page),
            chart_days: env_parse("COIN_DASHBOARD_CHART_DAYS").unwrap_or(defaults.chart_days),
            listing_ttl: env_parse("COIN_DASHBOARD_LISTING_TTL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.listing_ttl),
            favorites_ttl: env_parse("COIN_DASHBOARD_FAVORITES_TTL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.favorites_ttl),
            max_retries: env_parse("COIN_DASHBOARD_MAX_RETRIES").unwrap_or(defaults.max_retries),
            initial_backoff: defaults.initial_backoff,
            search_debounce: defaults.search_debounce,
            storage_path: env::var("COIN_DASHBOARD_STORAGE")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: COINGECKO_API_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            per_page: DEFAULT_PER_PAGE,
            chart_days: DEFAULT_CHART_DAYS,
            listing_ttl: Duration::from_millis(LISTING_TTL_MS),
            favorites_ttl: Duration::from_millis(FAVORITES_TTL_MS),
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            search_debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            storage_path: PathBuf::from(DEFAULT_STORAGE_FILE),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
