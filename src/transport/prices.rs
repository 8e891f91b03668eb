// Market price source
// Fetches fiat prices from a CoinGecko-compatible `simple/price` endpoint,
// translating token symbols to the provider's coin ids
//
// Numan Thabit 2025 Nov

use crate::chain::PriceSource;
use crate::errors::RouterError;
use crate::metrics::{RPC_ERRORS, RPC_LATENCY};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct PriceSettings {
    pub api_url: Url,
    /// Symbol to provider coin id, e.g. `ETH -> ethereum`.
    #[serde(default = "default_coin_ids")]
    pub coin_ids: HashMap<String, String>,
}

fn default_coin_ids() -> HashMap<String, String> {
    [
        ("ETH", "ethereum"),
        ("USDC", "usd-coin"),
        ("USDT", "tether"),
        ("DAI", "dai"),
        ("WETH", "weth"),
        ("SNT", "status"),
    ]
    .into_iter()
    .map(|(symbol, id)| (symbol.to_string(), id.to_string()))
    .collect()
}

impl PriceSettings {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            coin_ids: default_coin_ids(),
        }
    }
}

pub struct CoinGeckoPrices {
    http: Client,
    settings: PriceSettings,
}

impl CoinGeckoPrices {
    pub fn new(settings: PriceSettings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    fn coin_id(&self, symbol: &str) -> String {
        self.settings
            .coin_ids
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| symbol.to_lowercase())
    }

    fn request_url(&self, ids: &[String], currency: &str) -> Result<Url, RouterError> {
        let mut url = self
            .settings
            .api_url
            .join("simple/price")
            .map_err(|e| RouterError::Provider(format!("price url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("ids", &ids.join(","))
            .append_pair("vs_currencies", currency);
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<HashMap<String, HashMap<String, f64>>, RouterError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RouterError::Transport(format!("price request: {e}")))?;
        if !resp.status().is_success() {
            return Err(RouterError::Provider(format!("price http {}", resp.status())));
        }
        resp.json()
            .await
            .map_err(|e| RouterError::Provider(format!("price decode: {e}")))
    }
}

/// Maps the provider's `{coin_id: {currency: price}}` body back to symbols.
fn prices_by_symbol(
    symbols: &[String],
    ids: &[String],
    body: &HashMap<String, HashMap<String, f64>>,
    currency: &str,
) -> HashMap<String, f64> {
    symbols
        .iter()
        .zip(ids)
        .filter_map(|(symbol, id)| {
            let price = body.get(id)?.get(currency)?;
            Some((symbol.clone(), *price))
        })
        .collect()
}

#[async_trait]
impl PriceSource for CoinGeckoPrices {
    async fn prices(
        &self,
        symbols: &[String],
        currency: &str,
    ) -> Result<HashMap<String, f64>, RouterError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        let currency = currency.to_lowercase();
        let ids: Vec<String> = symbols.iter().map(|s| self.coin_id(s)).collect();
        let url = self.request_url(&ids, &currency)?;

        let started = Instant::now();
        let result = self.fetch(url).await;
        RPC_LATENCY
            .with_label_values(&["prices", "simple_price"])
            .observe(started.elapsed().as_secs_f64());
        let body = result.inspect_err(|_| {
            RPC_ERRORS.with_label_values(&["prices", "simple_price"]).inc();
        })?;

        let prices = prices_by_symbol(symbols, &ids, &body, &currency);
        debug!(requested = symbols.len(), found = prices.len(), "prices fetched");
        Ok(prices)
    }
}
