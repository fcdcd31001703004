//! Favorites screen: market rows for every favorite coin

use super::{favorite_markets, FavoritesWatch};
use crate::{services::Services, types::CoinMarket};
use std::sync::Arc;

/// Favorites screen state, subscribed to the favorites store
pub struct FavoritesController {
    services: Services,
    favorites: FavoritesWatch,
    coins: Arc<Vec<CoinMarket>>,
}

impl FavoritesController {
    pub fn new(services: Services) -> Self {
        let favorites = FavoritesWatch::new(&services.favorites);
        Self {
            services,
            favorites,
            coins: Arc::default(),
        }
    }

    /// Reloads market rows for the current favorites
    ///
    /// A failed request leaves the screen empty rather than showing an error.
    pub async fn load(&mut self) {
        let ids = self.favorites.take();
        if ids.is_empty() {
            self.coins = Arc::default();
            return;
        }

        let ttl = self.services.config.favorites_ttl;
        self.coins = match favorite_markets(&self.services, &ids, ttl).await {
            Ok(coins) => coins,
            Err(e) => {
                tracing::error!(count = ids.len(), error = %e, "Failed to load favorites");
                Arc::default()
            }
        };
    }

    /// Reloads only if the favorites changed since the last load
    pub async fn sync(&mut self) {
        if self.favorites.changed() {
            self.load().await;
        }
    }

    pub fn coins(&self) -> &[CoinMarket] {
        &self.coins
    }
}
