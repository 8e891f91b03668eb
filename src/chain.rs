// Chain and market collaborators
// The router reads balances, allowances, nonces, gas estimates and block
// heights through `ChainClient`, and token prices through `PriceSource`
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use crate::networks::ChainId;
use crate::token::Token;
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use std::collections::HashMap;

/// Call shape used for gas estimation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn block_number(&self, chain_id: ChainId) -> Result<u64, RouterError>;

    async fn native_balance(&self, chain_id: ChainId, account: Address) -> Result<U256, RouterError>;

    async fn token_balance(
        &self,
        chain_id: ChainId,
        token: Address,
        account: Address,
    ) -> Result<U256, RouterError>;

    async fn erc1155_balance(
        &self,
        chain_id: ChainId,
        token: Address,
        account: Address,
        id: U256,
    ) -> Result<U256, RouterError>;

    async fn allowance(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, RouterError>;

    async fn estimate_gas(&self, chain_id: ChainId, call: &CallRequest) -> Result<u64, RouterError>;

    /// Next nonce including pending transactions.
    async fn pending_nonce(&self, chain_id: ChainId, account: Address) -> Result<u64, RouterError>;

    async fn balance_of(
        &self,
        chain_id: ChainId,
        token: &Token,
        account: Address,
    ) -> Result<U256, RouterError> {
        if token.is_native() {
            self.native_balance(chain_id, account).await
        } else {
            self.token_balance(chain_id, token.address, account).await
        }
    }
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Prices keyed by symbol in `currency`. Unknown symbols are omitted.
    async fn prices(
        &self,
        symbols: &[String],
        currency: &str,
    ) -> Result<HashMap<String, f64>, RouterError>;
}

/// Fixed prices, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticPrices {
    prices: HashMap<String, f64>,
}

impl StaticPrices {
    pub fn new(prices: HashMap<String, f64>) -> Self {
        Self { prices }
    }
}

#[async_trait]
impl PriceSource for StaticPrices {
    async fn prices(
        &self,
        symbols: &[String],
        _currency: &str,
    ) -> Result<HashMap<String, f64>, RouterError> {
        Ok(symbols
            .iter()
            .filter_map(|s| self.prices.get(s).map(|p| (s.clone(), *p)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_prices_skip_unknown_symbols() {
        let source = StaticPrices::new(HashMap::from([("ETH".to_string(), 2000.0)]));
        let prices = source
            .prices(&["ETH".to_string(), "DAI".to_string()], "usd")
            .await
            .unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["ETH"], 2000.0);
    }
}
