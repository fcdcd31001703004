//! Provider abstraction for fetching market data from external APIs

use crate::{
    error::ProviderError,
    types::{CoinDetail, CoinMarket, MarketChart},
};
use async_trait::async_trait;

/// Parameters of a market listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketsQuery {
    /// Quote currency (e.g. "usd")
    pub vs_currency: String,
    /// 1-based page number
    pub page: u32,
    /// Rows per page
    pub per_page: u32,
    /// Restrict the listing to these coin ids
    pub ids: Option<Vec<String>>,
}

impl MarketsQuery {
    pub fn page(vs_currency: impl Into<String>, page: u32, per_page: u32) -> Self {
        Self {
            vs_currency: vs_currency.into(),
            page,
            per_page,
            ids: None,
        }
    }

    /// A single page holding exactly the given coins
    pub fn for_ids(vs_currency: impl Into<String>, ids: &[String]) -> Self {
        Self {
            vs_currency: vs_currency.into(),
            page: 1,
            per_page: ids.len().max(1) as u32,
            ids: Some(ids.to_vec()),
        }
    }
}

/// Trait for market data providers
///
/// Implementations issue raw requests and report every failure. Turning
/// failures into empty results is left to [`crate::client::MarketDataClient`].
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches one page of coins sorted by market cap, descending
    async fn fetch_markets(&self, query: &MarketsQuery) -> Result<Vec<CoinMarket>, ProviderError>;

    /// Fetches detail for a single coin
    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, ProviderError>;

    /// Fetches the price history of a coin over the last `days` days
    async fn fetch_market_chart(
        &self,
        id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<MarketChart, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::types::PricePoint;
    use chrono::Utc;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Which request a recorded call was
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Markets(MarketsQuery),
        Detail(String),
        Chart(String, String, u32),
    }

    /// Mock provider for testing
    #[derive(Default)]
    pub struct MockProvider {
        markets: Mutex<Vec<CoinMarket>>,
        details: Mutex<HashMap<String, CoinDetail>>,
        charts: Mutex<HashMap<String, MarketChart>>,
        market_failures: Mutex<VecDeque<ProviderError>>,
        delays: Mutex<HashMap<String, Duration>>,
        calls: Mutex<Vec<Call>>,
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn coin(id: &str, symbol: &str, name: &str, price: f64) -> CoinMarket {
            CoinMarket {
                id: id.to_string(),
                symbol: symbol.to_string(),
                name: name.to_string(),
                image: None,
                current_price: Some(price),
                market_cap: None,
                market_cap_rank: None,
                total_volume: None,
                high_24h: None,
                low_24h: None,
                price_change_percentage_24h: None,
                last_updated: None,
            }
        }

        pub fn set_markets(&self, coins: Vec<CoinMarket>) {
            *self.markets.lock().unwrap() = coins;
        }

        /// Queues an error for the next listing request
        pub fn fail_next_markets(&self, error: ProviderError) {
            self.market_failures.lock().unwrap().push_back(error);
        }

        pub fn set_detail(&self, id: &str, name: &str) {
            let detail = CoinDetail {
                id: id.to_string(),
                symbol: id.chars().take(3).collect(),
                name: name.to_string(),
                description: Default::default(),
                links: Default::default(),
                market_data: None,
            };
            self.details.lock().unwrap().insert(id.to_string(), detail);
        }

        pub fn set_chart(&self, id: &str, prices: &[f64]) {
            let start = Utc::now();
            let prices = prices
                .iter()
                .enumerate()
                .map(|(i, price)| PricePoint {
                    timestamp: start + chrono::Duration::days(i as i64),
                    price: *price,
                })
                .collect();
            self.charts
                .lock()
                .unwrap()
                .insert(id.to_string(), MarketChart { prices });
        }

        /// Makes detail/chart requests for `id` take `delay`
        pub fn set_delay(&self, id: &str, delay: Duration) {
            self.delays.lock().unwrap().insert(id.to_string(), delay);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn markets_calls(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Markets(_)))
                .count()
        }

        async fn maybe_delay(&self, id: &str) {
            let delay = self.delays.lock().unwrap().get(id).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        async fn fetch_markets(
            &self,
            query: &MarketsQuery,
        ) -> Result<Vec<CoinMarket>, ProviderError> {
            self.calls.lock().unwrap().push(Call::Markets(query.clone()));
            if let Some(error) = self.market_failures.lock().unwrap().pop_front() {
                return Err(error);
            }

            let markets = self.markets.lock().unwrap().clone();
            let rows = match &query.ids {
                Some(ids) => markets
                    .into_iter()
                    .filter(|c| ids.contains(&c.id))
                    .collect(),
                None => markets
                    .into_iter()
                    .skip(((query.page.max(1) - 1) * query.per_page) as usize)
                    .take(query.per_page as usize)
                    .collect(),
            };
            Ok(rows)
        }

        async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, ProviderError> {
            self.calls.lock().unwrap().push(Call::Detail(id.to_string()));
            self.maybe_delay(id).await;
            self.details
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ProviderError::api(format!("HTTP 404: coin {id} not found")))
        }

        async fn fetch_market_chart(
            &self,
            id: &str,
            vs_currency: &str,
            days: u32,
        ) -> Result<MarketChart, ProviderError> {
            self.calls.lock().unwrap().push(Call::Chart(
                id.to_string(),
                vs_currency.to_string(),
                days,
            ));
            self.maybe_delay(id).await;
            self.charts
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ProviderError::api(format!("HTTP 404: chart {id} not found")))
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
