//! # Coin Dashboard
//!
//! Cryptocurrency market listings, per-coin detail with a price series, and a
//! persisted set of favorite coins, backed by the CoinGecko public API.
//!
//! Responses are memoized in a [`TtlCache`] whose freshness tolerance is
//! chosen by each reader. Favorites live in a [`FavoritesStore`] that treats
//! its storage as the only source of truth and notifies observers on every
//! change.
//!
//! ## Usage
//!
//! ```no_run
//! use coin_dashboard::{Config, Services};
//! use coin_dashboard::views::DashboardController;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let services = Services::from_config(Config::from_env())?;
//!
//! let mut dashboard = DashboardController::new(services.clone());
//! dashboard.load().await;
//! for (coin, favorite) in dashboard.rows() {
//!     println!("{}{} {:?}", if favorite { "* " } else { "" }, coin.name, coin.current_price);
//! }
//!
//! services.favorites.toggle("bitcoin")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! View controllers (dashboard, coin detail, favorites)
//!     ↓                      ↓
//! TtlCache (read-through)   FavoritesStore → KeyValueStorage (JSON file)
//!     ↓
//! MarketDataClient (normalizes detail/chart failures)
//!     ↓
//! MarketDataProvider (CoinGecko)
//! ```

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod constants;
pub mod debounce;
pub mod error;
pub mod favorites;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod services;
pub mod storage;
pub mod types;
pub mod views;

// Re-export commonly used types
pub use cache::TtlCache;
pub use client::MarketDataClient;
pub use config::Config;
pub use error::{ProviderError, StorageError};
pub use favorites::{FavoritesStore, Subscription};
pub use services::Services;
pub use types::{CoinDetail, CoinMarket, MarketChart, PricePoint};
