// Configuration management module
// This file handles loading and parsing of configuration settings
// from an optional `wallet-router` config file and environment variables
//
// Numan Thabit 2025 Nov

use crate::networks::{ChainId, Network, SUPPORTED_NETWORKS, SUPPORTED_TEST_NETWORKS};
use crate::processors::hop::HopSettings;
use crate::router::RouterSettings;
use crate::transport::{PriceSettings, RpcEndpoints};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

const CONFIG_FILE: &str = "wallet-router";

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_event_buffer() -> usize {
    RouterSettings::default().event_buffer
}

fn default_heartbeat_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP API bind address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Route over test networks instead of mainnets
    #[serde(default)]
    pub testnet_mode: bool,
    /// Always add an approval tx for ERC20 sends through a spender contract
    #[serde(default)]
    pub force_approval: bool,
    /// Capacity of the route event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// JSON-RPC endpoint per chain id, e.g. APP__RPC_ENDPOINTS__10=https://mainnet.optimism.io
    pub rpc_endpoints: HashMap<String, Url>,
    /// YAML token catalog
    pub token_catalog: PathBuf,
    /// Market price API; fixed prices are used when absent
    pub prices: Option<PriceSettings>,
    /// Fixed fiat prices by symbol
    #[serde(default)]
    pub static_prices: HashMap<String, f64>,
    /// Hop bridge; bridging is disabled when absent
    pub hop: Option<HopSettings>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn rpc_endpoints(&self) -> Result<RpcEndpoints> {
        let mut endpoints = Vec::with_capacity(self.rpc_endpoints.len());
        for (chain, url) in &self.rpc_endpoints {
            let chain_id: ChainId = chain
                .parse()
                .with_context(|| format!("invalid chain id in rpc_endpoints: {chain}"))?;
            endpoints.push((chain_id, url.to_string()));
        }
        if endpoints.is_empty() {
            bail!("at least one rpc endpoint is required");
        }
        Ok(RpcEndpoints::new(endpoints))
    }

    /// Known networks that have an RPC endpoint configured.
    pub fn networks(&self, endpoints: &RpcEndpoints) -> Vec<Network> {
        let configured = endpoints.chains();
        SUPPORTED_NETWORKS
            .iter()
            .chain(SUPPORTED_TEST_NETWORKS.iter())
            .filter(|chain_id| configured.contains(chain_id))
            .filter_map(|chain_id| Network::known(*chain_id))
            .collect()
    }

    /// Environment keys arrive lowercased, symbols are matched uppercase.
    pub fn static_prices(&self) -> HashMap<String, f64> {
        self.static_prices
            .iter()
            .map(|(symbol, price)| (symbol.to_uppercase(), *price))
            .collect()
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            testnet_mode: self.testnet_mode,
            force_approval: self.force_approval,
            event_buffer: self.event_buffer,
        }
    }
}
