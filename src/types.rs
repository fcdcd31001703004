//! Types for market data payloads

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of a market listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMarket {
    /// Provider coin id (e.g. "bitcoin")
    pub id: String,

    /// Ticker symbol, lowercase as returned by the provider
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Logo URL
    #[serde(default)]
    pub image: Option<String>,

    /// Price in the requested quote currency
    #[serde(default)]
    pub current_price: Option<f64>,

    #[serde(default)]
    pub market_cap: Option<f64>,

    #[serde(default)]
    pub market_cap_rank: Option<u32>,

    #[serde(default)]
    pub total_volume: Option<f64>,

    #[serde(default)]
    pub high_24h: Option<f64>,

    #[serde(default)]
    pub low_24h: Option<f64>,

    /// 24h price change percentage
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,

    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl CoinMarket {
    /// Case-insensitive match of `query` against name or symbol
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.symbol.to_lowercase().contains(&query)
    }
}

/// Localized text block; only English is requested
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub en: Option<String>,
}

/// External links for a coin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinLinks {
    #[serde(default)]
    pub homepage: Vec<String>,
}

/// Market figures in the detail payload, keyed by quote currency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailMarketData {
    #[serde(default)]
    pub current_price: HashMap<String, f64>,

    #[serde(default)]
    pub market_cap: HashMap<String, f64>,

    #[serde(default)]
    pub total_volume: HashMap<String, f64>,

    #[serde(default)]
    pub ath: HashMap<String, f64>,

    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,

    #[serde(default)]
    pub circulating_supply: Option<f64>,

    #[serde(default)]
    pub total_supply: Option<f64>,
}

/// Single-coin detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,

    #[serde(default)]
    pub description: Description,

    #[serde(default)]
    pub links: CoinLinks,

    #[serde(default)]
    pub market_data: Option<DetailMarketData>,
}

impl CoinDetail {
    /// Price in `currency`, if the provider returned one
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        self.market_data
            .as_ref()
            .and_then(|m| m.current_price.get(&currency.to_lowercase()).copied())
    }
}

/// A single price observation
///
/// The provider encodes each point as a `[timestamp_ms, price]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl From<(f64, f64)> for PricePoint {
    fn from((timestamp_ms, price): (f64, f64)) -> Self {
        let timestamp = Utc
            .timestamp_millis_opt(timestamp_ms as i64)
            .single()
            .unwrap_or_default();
        Self { timestamp, price }
    }
}

impl From<PricePoint> for (f64, f64) {
    fn from(point: PricePoint) -> Self {
        (point.timestamp.timestamp_millis() as f64, point.price)
    }
}

/// Historical price series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<PricePoint>,
}

impl MarketChart {
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Labels and values ready for a line chart
    pub fn series(&self) -> ChartSeries {
        ChartSeries {
            labels: self
                .prices
                .iter()
                .map(|p| p.timestamp.format("%-m/%-d").to_string())
                .collect(),
            values: self.prices.iter().map(|p| p.price).collect(),
        }
    }

    /// Lowest and highest price in the series
    pub fn range(&self) -> Option<(f64, f64)> {
        self.prices.iter().map(|p| p.price).fold(None, |acc, price| {
            Some(match acc {
                None => (price, price),
                Some((lo, hi)) => (lo.min(price), hi.max(price)),
            })
        })
    }
}

/// Chart-ready projection of a price series: `M/D` labels and prices
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}
