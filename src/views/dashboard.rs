//! Market overview: a paginated listing with search and a favorites strip

use super::{favorite_markets, market_page, FavoritesWatch};
use crate::{error::StorageError, services::Services, types::CoinMarket};
use std::sync::Arc;

const LOAD_ERROR: &str = "Failed to load market data. Please try again later.";

/// Dashboard screen state
///
/// Listings are cached per page; the search query filters the cached page
/// locally and never triggers a request. The favorite flags follow the store
/// as soon as any controller toggles; the favorites strip catches up on the
/// next [`load_favorites`](Self::load_favorites) or
/// [`sync_favorites`](Self::sync_favorites).
pub struct DashboardController {
    services: Services,
    page: u32,
    per_page: u32,
    query: String,
    latest_markets: Arc<Vec<CoinMarket>>,
    coins: Vec<CoinMarket>,
    favorites: FavoritesWatch,
    fav_coins: Arc<Vec<CoinMarket>>,
    error: Option<String>,
}

impl DashboardController {
    pub fn new(services: Services) -> Self {
        let per_page = services.config.per_page;
        let favorites = FavoritesWatch::new(&services.favorites);
        Self {
            services,
            page: 1,
            per_page,
            query: String::new(),
            latest_markets: Arc::default(),
            coins: Vec::new(),
            favorites,
            fav_coins: Arc::default(),
            error: None,
        }
    }

    /// Loads the current page, then the favorites strip
    pub async fn load(&mut self) {
        self.error = None;

        match market_page(&self.services, self.page, self.per_page).await {
            Ok(markets) => {
                self.latest_markets = markets;
                self.apply_filter();
            }
            Err(e) => {
                tracing::error!(page = self.page, error = %e, "Failed to load market data");
                self.error = Some(LOAD_ERROR.to_string());
                self.coins.clear();
            }
        }

        self.load_favorites().await;
    }

    /// Recomputes the visible rows from the last loaded page and the query
    pub fn apply_filter(&mut self) {
        let query = self.query.trim();
        self.coins = self
            .latest_markets
            .iter()
            .filter(|coin| coin.matches(query))
            .cloned()
            .collect();
    }

    /// Sets the search query and refilters
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.apply_filter();
    }

    /// Refreshes the favorite ids and their market rows
    pub async fn load_favorites(&mut self) {
        let ids = self.favorites.take();
        if ids.is_empty() {
            self.fav_coins = Arc::default();
            return;
        }

        let ttl = self.services.config.listing_ttl;
        self.fav_coins = match favorite_markets(&self.services, &ids, ttl).await {
            Ok(coins) => coins,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load favorite coins");
                Arc::default()
            }
        };
    }

    /// Reloads the favorites strip only if the set changed since the last load
    pub async fn sync_favorites(&mut self) {
        if self.favorites.changed() {
            self.load_favorites().await;
        }
    }

    /// Flips a coin's favorite flag and refreshes the favorites strip
    pub async fn toggle_fav(&mut self, id: &str) -> Result<(), StorageError> {
        self.services.favorites.toggle(id)?;
        self.load_favorites().await;
        Ok(())
    }

    pub async fn prev(&mut self) {
        if self.page > 1 {
            self.page -= 1;
            self.load().await;
        }
    }

    pub async fn next(&mut self) {
        self.page += 1;
        self.load().await;
    }

    /// Jumps to `page` (1-based) and loads it
    pub async fn go_to(&mut self, page: u32) {
        self.page = page.max(1);
        self.load().await;
    }

    /// Drops every cached response and reloads
    pub async fn refresh(&mut self) {
        self.services.cache.clear(None);
        self.load().await;
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn set_per_page(&mut self, per_page: u32) {
        self.per_page = per_page.max(1);
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Visible rows with their favorite flag
    pub fn rows(&self) -> impl Iterator<Item = (&CoinMarket, bool)> {
        self.coins
            .iter()
            .map(|coin| (coin, self.favorites.contains(&coin.id)))
    }

    pub fn coins(&self) -> &[CoinMarket] {
        &self.coins
    }

    pub fn favorites(&self) -> Vec<String> {
        self.favorites.ids()
    }

    pub fn fav_coins(&self) -> &[CoinMarket] {
        &self.fav_coins
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
