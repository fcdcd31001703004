//! Single-coin screen: detail plus price chart

use crate::{
    cache::keys,
    error::StorageError,
    services::Services,
    types::{CoinDetail, MarketChart},
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const LOAD_ERROR: &str = "Failed to load coin data.";

/// What the coin screen shows
#[derive(Debug, Clone)]
pub struct CoinDetailView {
    pub id: String,
    pub coin: Option<Arc<CoinDetail>>,
    pub chart: Arc<MarketChart>,
    pub error: Option<String>,
}

/// Loads and holds the coin currently on screen
///
/// Navigating to another coin while a fetch is in flight supersedes it: each
/// fetch takes a generation number and only the latest generation's result
/// is applied.
pub struct CoinDetailController {
    services: Services,
    generation: AtomicU64,
    current: Mutex<Option<CoinDetailView>>,
}

impl CoinDetailController {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// Fetches detail and chart for `id`
    ///
    /// Returns `None` if another fetch started while this one was in flight.
    pub async fn fetch(&self, id: &str) -> Option<CoinDetailView> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let days = self.services.config.chart_days;

        let (coin, chart) = tokio::join!(self.detail(id), self.chart(id, days));

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(coin = id, generation, "Discarding superseded coin response");
            return None;
        }

        let error = coin.is_none().then(|| LOAD_ERROR.to_string());
        let view = CoinDetailView {
            id: id.to_string(),
            coin,
            chart,
            error,
        };
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(view.clone());
        Some(view)
    }

    async fn detail(&self, id: &str) -> Option<Arc<CoinDetail>> {
        let key = keys::coin(id);
        let ttl = self.services.config.listing_ttl;
        if let Some(detail) = self.services.cache.get::<CoinDetail>(&key, ttl) {
            return Some(detail);
        }

        // Absent detail is not cached so the next visit asks again
        let detail = Arc::new(self.services.client.get_coin_detail(id).await?);
        self.services.cache.set_shared(key, detail.clone());
        Some(detail)
    }

    async fn chart(&self, id: &str, days: u32) -> Arc<MarketChart> {
        let key = keys::chart(id, days);
        let ttl = self.services.config.listing_ttl;
        if let Some(chart) = self.services.cache.get::<MarketChart>(&key, ttl) {
            return chart;
        }

        let currency = &self.services.config.vs_currency;
        let chart = Arc::new(self.services.client.get_market_chart(id, currency, days).await);
        // An empty series may stand in for a failed request; keep asking
        if !chart.is_empty() {
            self.services.cache.set_shared(key, chart.clone());
        }
        chart
    }

    /// The coin currently on screen
    pub fn current(&self) -> Option<CoinDetailView> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether the coin on screen is a favorite
    pub fn is_fav(&self) -> bool {
        self.current()
            .and_then(|view| view.coin)
            .is_some_and(|coin| self.services.favorites.is_fav(&coin.id))
    }

    /// Flips the favorite flag of the coin on screen
    ///
    /// Returns the new flag, or `None` when no coin is loaded.
    pub fn toggle_fav(&self) -> Result<Option<bool>, StorageError> {
        let Some(coin) = self.current().and_then(|view| view.coin) else {
            return Ok(None);
        };
        let favorites = self.services.favorites.toggle(&coin.id)?;
        Ok(Some(favorites.contains(&coin.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provider::mock::{Call, MockProvider};
    use crate::storage::MemoryStorage;
    use std::time::Duration;

    fn setup() -> (CoinDetailController, Arc<MockProvider>) {
        let provider = Arc::new(MockProvider::new());
        provider.set_detail("bitcoin", "Bitcoin");
        provider.set_chart("bitcoin", &[60000.0, 61000.0, 59000.0]);
        provider.set_detail("ethereum", "Ethereum");
        provider.set_chart("ethereum", &[3000.0]);
        let services = Services::new(
            Config::default(),
            provider.clone(),
            Arc::new(MemoryStorage::new()),
        );
        (CoinDetailController::new(services), provider)
    }

    #[tokio::test]
    async fn test_fetch_populates_view_and_cache() {
        let (controller, provider) = setup();

        let view = controller.fetch("bitcoin").await.unwrap();
        assert_eq!(view.coin.as_ref().unwrap().name, "Bitcoin");
        assert_eq!(view.chart.prices.len(), 3);
        assert!(view.error.is_none());

        controller.fetch("bitcoin").await.unwrap();
        assert_eq!(provider.calls().len(), 2);
        assert!(provider
            .calls()
            .contains(&Call::Chart("bitcoin".to_string(), "usd".to_string(), 30)));
    }

    #[tokio::test]
    async fn test_unknown_coin_degrades_to_error_state() {
        let (controller, provider) = setup();

        let view = controller.fetch("nope").await.unwrap();
        assert!(view.coin.is_none());
        assert!(view.chart.is_empty());
        assert_eq!(view.error.as_deref(), Some(LOAD_ERROR));

        // Nothing was cached for the failed coin
        controller.fetch("nope").await.unwrap();
        assert_eq!(provider.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_is_discarded() {
        let (controller, provider) = setup();
        provider.set_delay("bitcoin", Duration::from_millis(500));

        let (slow, fast) = tokio::join!(controller.fetch("bitcoin"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.fetch("ethereum").await
        });

        assert!(slow.is_none());
        assert_eq!(fast.unwrap().id, "ethereum");
        assert_eq!(controller.current().unwrap().id, "ethereum");
    }

    #[tokio::test]
    async fn test_toggle_fav_on_loaded_coin() {
        let (controller, _) = setup();
        assert_eq!(controller.toggle_fav().unwrap(), None);

        controller.fetch("bitcoin").await;
        assert!(!controller.is_fav());
        assert_eq!(controller.toggle_fav().unwrap(), Some(true));
        assert!(controller.is_fav());
        assert_eq!(controller.toggle_fav().unwrap(), Some(false));
    }
}
