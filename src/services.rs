//! Shared services injected into the view controllers

use crate::{
    cache::TtlCache,
    client::MarketDataClient,
    config::Config,
    error::ProviderError,
    favorites::FavoritesStore,
    provider::MarketDataProvider,
    providers::CoinGeckoProvider,
    retry::RetryPolicy,
    storage::{FileStorage, KeyValueStorage},
};
use std::sync::Arc;

/// Process-wide services
///
/// Built once at startup and cloned into every controller; each clone shares
/// the same cache, favorites store and client.
#[derive(Clone)]
pub struct Services {
    pub config: Arc<Config>,
    pub cache: Arc<TtlCache>,
    pub favorites: Arc<FavoritesStore>,
    pub client: Arc<MarketDataClient>,
}

impl Services {
    pub fn new(
        config: Config,
        provider: Arc<dyn MarketDataProvider>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        Self::with_cache(config, provider, storage, Arc::new(TtlCache::new()))
    }

    /// Like [`Services::new`] with a caller-supplied cache (e.g. one on a manual clock)
    pub fn with_cache(
        config: Config,
        provider: Arc<dyn MarketDataProvider>,
        storage: Arc<dyn KeyValueStorage>,
        cache: Arc<TtlCache>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            cache,
            favorites: Arc::new(FavoritesStore::new(storage)),
            client: Arc::new(MarketDataClient::new(provider)),
        }
    }

    /// Production wiring: CoinGecko over HTTP, favorites in a JSON file
    pub fn from_config(config: Config) -> Result<Self, ProviderError> {
        let provider = CoinGeckoProvider::with_base_url(&config.api_base_url, config.request_timeout)?;
        let storage = FileStorage::new(config.storage_path.clone());
        tracing::info!(
            provider = provider.provider_name(),
            storage = %storage.path().display(),
            "Services initialized"
        );
        Ok(Self::new(config, Arc::new(provider), Arc::new(storage)))
    }

    /// Retry policy for listing requests
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.max_retries, self.config.initial_backoff)
    }
}
