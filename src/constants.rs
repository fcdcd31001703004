//! Constants for the coin dashboard
//!
//! Compile-time defaults. Every value that a deployment may want to change is
//! also exposed through [`crate::config::Config`], which falls back to these.

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Endpoint for paginated market listings
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// Endpoint prefix for single-coin detail and market chart requests
pub const COINGECKO_COINS_ENDPOINT: &str = "/coins";

/// Sort order for market listings (fixed)
pub const MARKETS_ORDER: &str = "market_cap_desc";

/// HTTP request timeout (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "coin-dashboard/0.1.0";

/// Quote currency used when none is configured
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// Coins per dashboard page
pub const DEFAULT_PER_PAGE: u32 = 25;

/// Window of the coin detail price chart (in days)
pub const DEFAULT_CHART_DAYS: u32 = 30;

/// How long dashboard listings, coin detail and charts stay fresh (in milliseconds)
pub const LISTING_TTL_MS: u64 = 60_000;

/// How long the favorites view's market batch stays fresh (in milliseconds)
pub const FAVORITES_TTL_MS: u64 = 30_000;

/// Extra attempts for listing requests after the first failure
pub const MAX_RETRIES: u32 = 1;

/// Initial backoff delay for retries (in milliseconds)
pub const INITIAL_BACKOFF_MS: u64 = 500;

/// Maximum backoff delay for retries (in milliseconds)
pub const MAX_BACKOFF_MS: u64 = 8_000;

/// Quiet period before a typed search query is applied (in milliseconds)
pub const SEARCH_DEBOUNCE_MS: u64 = 400;

/// Storage key holding the JSON array of favorite coin ids
pub const FAVORITES_STORAGE_KEY: &str = "cd:favorites";

/// Default file backing the key-value storage
pub const DEFAULT_STORAGE_FILE: &str = "coin-dashboard.json";
