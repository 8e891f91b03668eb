// Token metadata and token catalog
//
// The catalog is an external collaborator; the static implementation here is
// loaded from YAML and always knows each network's native currency.
//
// Numan Thabit 2025 Nov

use crate::networks::{ChainId, Network};
use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub chain_id: ChainId,
    /// Set for collectibles only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<U256>,
}

impl Token {
    pub fn native(network: &Network) -> Self {
        Self {
            address: Address::ZERO,
            name: "Ether".to_string(),
            symbol: network.native_currency_symbol.clone(),
            decimals: network.native_currency_decimals,
            chain_id: network.chain_id,
            token_id: None,
        }
    }

    pub fn is_native(&self) -> bool {
        self.address == Address::ZERO
    }
}

/// Splits a collectible id of the form `0xcontract:tokenId`.
pub fn parse_collectible_id(id: &str) -> Option<(Address, U256)> {
    let (contract, token_id) = id.split_once(':')?;
    let address = Address::from_str(contract).ok()?;
    let token_id = U256::from_str(token_id).ok()?;
    Some((address, token_id))
}

pub trait TokenCatalog: Send + Sync {
    /// Looks up a fungible token on `network` by symbol or contract address.
    fn find_token(&self, network: &Network, symbol_or_address: &str) -> Option<Token>;
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, Default)]
pub struct StaticTokenCatalog {
    by_symbol: HashMap<(ChainId, String), Token>,
}

impl StaticTokenCatalog {
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        let by_symbol = tokens
            .into_iter()
            .map(|t| ((t.chain_id, t.symbol.clone()), t))
            .collect();
        Self { by_symbol }
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(raw).context("parse token catalog")?;
        Ok(Self::new(file.tokens))
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read token catalog {}", path.display()))?;
        Self::from_yaml(&raw)
    }
}

impl TokenCatalog for StaticTokenCatalog {
    fn find_token(&self, network: &Network, symbol_or_address: &str) -> Option<Token> {
        if symbol_or_address == network.native_currency_symbol {
            return Some(Token::native(network));
        }
        if let Some(token) = self
            .by_symbol
            .get(&(network.chain_id, symbol_or_address.to_string()))
        {
            return Some(token.clone());
        }
        let address = Address::from_str(symbol_or_address).ok()?;
        self.by_symbol
            .values()
            .find(|t| t.chain_id == network.chain_id && t.address == address)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::{ETHEREUM_MAINNET, OPTIMISM_MAINNET};

    const CATALOG: &str = r#"
tokens:
  - address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
    name: USD Coin
    symbol: USDC
    decimals: 6
    chainId: 1
"#;

    #[test]
    fn finds_native_and_listed_tokens() {
        let catalog = StaticTokenCatalog::from_yaml(CATALOG).unwrap();
        let mainnet = Network::known(ETHEREUM_MAINNET).unwrap();

        let eth = catalog.find_token(&mainnet, "ETH").unwrap();
        assert!(eth.is_native());
        assert_eq!(eth.decimals, 18);

        let usdc = catalog.find_token(&mainnet, "USDC").unwrap();
        assert_eq!(usdc.decimals, 6);
        let by_address = catalog
            .find_token(&mainnet, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")
            .unwrap();
        assert_eq!(by_address.symbol, "USDC");

        let optimism = Network::known(OPTIMISM_MAINNET).unwrap();
        assert!(catalog.find_token(&optimism, "USDC").is_none());
    }

    #[test]
    fn parses_collectible_ids() {
        let (contract, id) =
            parse_collectible_id("0x0000000000000000000000000000000000000001:42").unwrap();
        assert_eq!(contract, Address::with_last_byte(1));
        assert_eq!(id, U256::from(42));
        assert!(parse_collectible_id("USDC").is_none());
    }
}
