//! Headless view controllers
//!
//! Each controller owns the state one screen renders and combines the shared
//! [`Services`] with user input. Drawing that state is up to the caller.

pub mod coin_detail;
pub mod dashboard;
pub mod favorites;

pub use coin_detail::{CoinDetailController, CoinDetailView};
pub use dashboard::DashboardController;
pub use favorites::FavoritesController;

use crate::{
    cache::keys,
    error::ProviderError,
    favorites::{FavoritesStore, Subscription},
    retry::retry_with_backoff,
    services::Services,
    types::CoinMarket,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct WatchState {
    ids: Mutex<Vec<String>>,
    changed: AtomicBool,
}

/// Latest favorites pushed by the store, held by one controller
///
/// Toggles made anywhere on the same store land here synchronously. The
/// change flag tells the owner its favorite market rows need reloading.
struct FavoritesWatch {
    state: Arc<WatchState>,
    _subscription: Subscription,
}

impl FavoritesWatch {
    fn new(store: &FavoritesStore) -> Self {
        let state = Arc::new(WatchState::default());
        let observed = state.clone();
        let subscription = store.subscribe(move |ids| {
            *observed.ids.lock().unwrap_or_else(|e| e.into_inner()) = ids.to_vec();
            observed.changed.store(true, Ordering::Release);
        });

        Self {
            state,
            _subscription: subscription,
        }
    }

    fn ids(&self) -> Vec<String> {
        self.state
            .ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn contains(&self, id: &str) -> bool {
        self.state
            .ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|fav| fav == id)
    }

    fn changed(&self) -> bool {
        self.state.changed.load(Ordering::Acquire)
    }

    /// Current set, clearing the change flag
    fn take(&self) -> Vec<String> {
        self.state.changed.store(false, Ordering::Release);
        self.ids()
    }
}

/// Market rows for exactly the given favorite ids, read through the cache
async fn favorite_markets(
    services: &Services,
    ids: &[String],
    ttl: Duration,
) -> Result<Arc<Vec<CoinMarket>>, ProviderError> {
    let key = keys::fav_coins(ids);
    let currency = services.config.vs_currency.as_str();

    services
        .cache
        .get_or_insert_with(&key, ttl, move || {
            retry_with_backoff(services.retry_policy(), "favorite markets", move || {
                services
                    .client
                    .list_markets(currency, 1, ids.len() as u32, Some(ids))
            })
        })
        .await
}

/// Market listing page, read through the cache
async fn market_page(
    services: &Services,
    page: u32,
    per_page: u32,
) -> Result<Arc<Vec<CoinMarket>>, ProviderError> {
    let key = keys::markets(page, per_page, None);
    let currency = services.config.vs_currency.as_str();

    services
        .cache
        .get_or_insert_with(&key, services.config.listing_ttl, move || {
            retry_with_backoff(services.retry_policy(), "markets", move || {
                services.client.list_markets(currency, page, per_page, None)
            })
        })
        .await
}
