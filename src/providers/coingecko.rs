//! CoinGecko market data provider implementation

use crate::{
    constants::{COINGECKO_COINS_ENDPOINT, COINGECKO_MARKETS_ENDPOINT, MARKETS_ORDER, USER_AGENT},
    error::ProviderError,
    provider::{MarketDataProvider, MarketsQuery},
    types::{CoinDetail, CoinMarket, MarketChart},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Query parameters for a market listing request
fn markets_params(query: &MarketsQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("vs_currency", query.vs_currency.clone()),
        ("order", MARKETS_ORDER.to_string()),
        ("per_page", query.per_page.to_string()),
        ("page", query.page.to_string()),
        ("sparkline", "false".to_string()),
    ];
    if let Some(ids) = query.ids.as_ref().filter(|ids| !ids.is_empty()) {
        params.push(("ids", ids.join(",")));
    }
    params
}

/// Query parameters for a coin detail request; only market data is wanted
fn detail_params() -> [(&'static str, &'static str); 6] {
    [
        ("localization", "false"),
        ("tickers", "false"),
        ("market_data", "true"),
        ("community_data", "false"),
        ("developer_data", "false"),
        ("sparkline", "false"),
    ]
}

/// Query parameters for a market chart request
fn chart_params(vs_currency: &str, days: u32) -> [(&'static str, String); 2] {
    [
        ("vs_currency", vs_currency.to_string()),
        ("days", days.to_string()),
    ]
}

/// CoinGecko market data provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    /// Creates a provider against `base_url` (the public API, a proxy or the pro API)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn markets_url(&self) -> String {
        format!("{}{}", self.base_url, COINGECKO_MARKETS_ENDPOINT)
    }

    fn detail_url(&self, id: &str) -> String {
        format!("{}{}/{}", self.base_url, COINGECKO_COINS_ENDPOINT, id)
    }

    fn chart_url(&self, id: &str) -> String {
        format!(
            "{}{}/{}/market_chart",
            self.base_url, COINGECKO_COINS_ENDPOINT, id
        )
    }

    /// Sends a GET request and decodes the JSON body
    async fn get_json<T, Q>(&self, url: &str, params: &Q) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        tracing::debug!(url, "Requesting CoinGecko");

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::NetworkError(e)
                }
            })?;

        // Check for rate limiting
        if response.status().as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }

        // Check for other errors
        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let response_text = response.text().await.map_err(ProviderError::NetworkError)?;

        parse_body(&response_text)
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| {
        ProviderError::InvalidResponse(format!(
            "Failed to parse CoinGecko response: {}. Response: {}",
            e,
            body.chars().take(256).collect::<String>()
        ))
    })
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn fetch_markets(&self, query: &MarketsQuery) -> Result<Vec<CoinMarket>, ProviderError> {
        let coins: Vec<CoinMarket> = self
            .get_json(&self.markets_url(), &markets_params(query))
            .await?;

        tracing::debug!(
            count = coins.len(),
            page = query.page,
            "Fetched market listing from CoinGecko"
        );

        Ok(coins)
    }

    async fn fetch_coin_detail(&self, id: &str) -> Result<CoinDetail, ProviderError> {
        self.get_json(&self.detail_url(id), &detail_params()).await
    }

    async fn fetch_market_chart(
        &self,
        id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<MarketChart, ProviderError> {
        self.get_json(&self.chart_url(id), &chart_params(vs_currency, days))
            .await
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markets_params_without_ids() {
        let params = markets_params(&MarketsQuery::page("usd", 3, 25));
        assert_eq!(
            params,
            vec![
                ("vs_currency", "usd".to_string()),
                ("order", "market_cap_desc".to_string()),
                ("per_page", "25".to_string()),
                ("page", "3".to_string()),
                ("sparkline", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_markets_params_with_ids() {
        let ids = vec!["bitcoin".to_string(), "ethereum".to_string()];
        let params = markets_params(&MarketsQuery::for_ids("eur", &ids));
        assert!(params.contains(&("ids", "bitcoin,ethereum".to_string())));
        assert!(params.contains(&("per_page", "2".to_string())));
        assert!(params.contains(&("page", "1".to_string())));
    }

    #[test]
    fn test_detail_params_disable_extras() {
        let params = detail_params();
        for key in [
            "localization",
            "tickers",
            "community_data",
            "developer_data",
            "sparkline",
        ] {
            assert!(params.contains(&(key, "false")), "{key} should be disabled");
        }
        assert!(params.contains(&("market_data", "true")));
    }

    #[test]
    fn test_urls() {
        let provider =
            CoinGeckoProvider::with_base_url("http://localhost:9000/api/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.markets_url(), "http://localhost:9000/api/coins/markets");
        assert_eq!(provider.detail_url("bitcoin"), "http://localhost:9000/api/coins/bitcoin");
        assert_eq!(
            provider.chart_url("bitcoin"),
            "http://localhost:9000/api/coins/bitcoin/market_chart"
        );
        assert_eq!(
            chart_params("usd", 30),
            [("vs_currency", "usd".to_string()), ("days", "30".to_string())]
        );
    }

    #[test]
    fn test_parse_body_reports_invalid_json() {
        let result: Result<Vec<CoinMarket>, _> = parse_body("<html>gateway error</html>");
        assert!(matches!(result, Err(ProviderError::InvalidResponse(msg)) if msg.contains("gateway")));
    }

    #[test]
    fn test_parse_markets_body() {
        let body = r#"[{"id":"bitcoin","symbol":"btc","name":"Bitcoin","current_price":1.0}]"#;
        let coins: Vec<CoinMarket> = parse_body(body).unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].current_price, Some(1.0));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_error() {
        let provider =
            CoinGeckoProvider::with_base_url("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = provider.fetch_coin_detail("bitcoin").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().is_transient());
    }
}
