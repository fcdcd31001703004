//! Market data client used by the view controllers
//!
//! Wraps a [`MarketDataProvider`]. Listing failures are returned to the
//! caller. Detail and chart failures are absorbed here: a missing coin comes
//! back as `None` and a missing chart as an empty series, both of which are
//! ordinary successful outcomes for the caller.

use crate::{
    error::ProviderError,
    metrics::{Endpoint, EndpointMetrics, MetricsCollector},
    provider::{MarketDataProvider, MarketsQuery},
    types::{CoinDetail, CoinMarket, MarketChart},
};
use std::sync::Arc;

pub struct MarketDataClient {
    provider: Arc<dyn MarketDataProvider>,
    metrics: MetricsCollector,
}

impl MarketDataClient {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            metrics: MetricsCollector::new(),
        }
    }

    /// Lists coins by market cap, optionally restricted to `ids`
    ///
    /// Retrying is the caller's decision.
    pub async fn list_markets(
        &self,
        vs_currency: &str,
        page: u32,
        per_page: u32,
        ids: Option<&[String]>,
    ) -> Result<Vec<CoinMarket>, ProviderError> {
        let query = match ids {
            Some(ids) => MarketsQuery {
                page,
                per_page,
                ..MarketsQuery::for_ids(vs_currency, ids)
            },
            None => MarketsQuery::page(vs_currency, page, per_page),
        };

        let timer = self.metrics.start(Endpoint::Markets);
        let result = self.provider.fetch_markets(&query).await;
        let elapsed = timer.finish(result.is_ok());

        match &result {
            Ok(coins) => tracing::debug!(
                provider = self.provider.provider_name(),
                count = coins.len(),
                latency_ms = elapsed.as_millis() as u64,
                "Fetched market listing"
            ),
            Err(e) => tracing::warn!(
                provider = self.provider.provider_name(),
                page,
                error = %e,
                "Market listing request failed"
            ),
        }
        result
    }

    /// Detail for one coin, `None` if it could not be fetched
    pub async fn get_coin_detail(&self, id: &str) -> Option<CoinDetail> {
        let timer = self.metrics.start(Endpoint::CoinDetail);
        let result = self.provider.fetch_coin_detail(id).await;
        timer.finish(result.is_ok());

        result
            .inspect_err(|e| tracing::error!(coin = id, error = %e, "Coin detail API error"))
            .ok()
    }

    /// Price history for one coin, empty if it could not be fetched
    pub async fn get_market_chart(&self, id: &str, vs_currency: &str, days: u32) -> MarketChart {
        let timer = self.metrics.start(Endpoint::MarketChart);
        let result = self
            .provider
            .fetch_market_chart(id, vs_currency, days)
            .await;
        timer.finish(result.is_ok());

        result.unwrap_or_else(|e| {
            tracing::error!(coin = id, days, error = %e, "Market chart API error");
            MarketChart::default()
        })
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Latency and success rate per endpoint
    pub fn metrics(&self) -> Vec<EndpointMetrics> {
        self.metrics.all()
    }
}
