// Network metadata and per-chain constants
// Chain ids of the supported networks, display priority, rollup detection
// and the cadence used by the live update watchers
//
// Numan Thabit 2025 Nov

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type ChainId = u64;

pub const ETHEREUM_MAINNET: ChainId = 1;
pub const OPTIMISM_MAINNET: ChainId = 10;
pub const ARBITRUM_MAINNET: ChainId = 42161;
pub const BASE_MAINNET: ChainId = 8453;
pub const ETHEREUM_SEPOLIA: ChainId = 11155111;
pub const OPTIMISM_SEPOLIA: ChainId = 11155420;
pub const ARBITRUM_SEPOLIA: ChainId = 421614;
pub const BASE_SEPOLIA: ChainId = 84532;
pub const ANVIL_MAINNET: ChainId = 31337;

pub const SUPPORTED_NETWORKS: [ChainId; 4] = [
    ETHEREUM_MAINNET,
    OPTIMISM_MAINNET,
    ARBITRUM_MAINNET,
    BASE_MAINNET,
];

pub const SUPPORTED_TEST_NETWORKS: [ChainId; 4] = [
    ETHEREUM_SEPOLIA,
    OPTIMISM_SEPOLIA,
    ARBITRUM_SEPOLIA,
    BASE_SEPOLIA,
];

/// OP-stack gas price oracle predeploy, exposes `getL1Fee(bytes)`.
pub const GAS_PRICE_ORACLE: Address = address!("420000000000000000000000000000000000000F");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency_symbol: String,
    pub native_currency_decimals: u8,
    pub is_test: bool,
}

impl Network {
    pub fn new(chain_id: ChainId, chain_name: &str, is_test: bool) -> Self {
        Self {
            chain_id,
            chain_name: chain_name.to_string(),
            native_currency_symbol: "ETH".to_string(),
            native_currency_decimals: 18,
            is_test,
        }
    }

    /// Built-in metadata for the chains the router knows about.
    pub fn known(chain_id: ChainId) -> Option<Self> {
        let (name, is_test) = match chain_id {
            ETHEREUM_MAINNET => ("Ethereum", false),
            OPTIMISM_MAINNET => ("Optimism", false),
            ARBITRUM_MAINNET => ("Arbitrum", false),
            BASE_MAINNET => ("Base", false),
            ETHEREUM_SEPOLIA => ("Sepolia", true),
            OPTIMISM_SEPOLIA => ("Optimism Sepolia", true),
            ARBITRUM_SEPOLIA => ("Arbitrum Sepolia", true),
            BASE_SEPOLIA => ("Base Sepolia", true),
            ANVIL_MAINNET => ("Anvil", true),
            _ => return None,
        };
        Some(Self::new(chain_id, name, is_test))
    }

    pub fn has_l1_data_fee(&self) -> bool {
        has_l1_data_fee(self.chain_id)
    }
}

/// Lower value sorts first: Ethereum, then the L2s in a fixed order.
pub fn chain_priority(chain_id: ChainId) -> u8 {
    match chain_id {
        ETHEREUM_MAINNET | ETHEREUM_SEPOLIA => 0,
        OPTIMISM_MAINNET | OPTIMISM_SEPOLIA => 1,
        ARBITRUM_MAINNET | ARBITRUM_SEPOLIA => 2,
        BASE_MAINNET | BASE_SEPOLIA => 3,
        _ => u8::MAX,
    }
}

pub fn supported_networks(testnet_mode: bool) -> &'static [ChainId] {
    if testnet_mode {
        &SUPPORTED_TEST_NETWORKS
    } else {
        &SUPPORTED_NETWORKS
    }
}

/// OP-stack rollups charge an extra fee for posting calldata to L1.
pub fn has_l1_data_fee(chain_id: ChainId) -> bool {
    matches!(
        chain_id,
        OPTIMISM_MAINNET | OPTIMISM_SEPOLIA | BASE_MAINNET | BASE_SEPOLIA
    )
}

pub fn block_check_interval(chain_id: ChainId) -> Duration {
    match chain_id {
        ETHEREUM_MAINNET | ETHEREUM_SEPOLIA => Duration::from_secs(3),
        OPTIMISM_MAINNET | OPTIMISM_SEPOLIA => Duration::from_secs(1),
        ARBITRUM_MAINNET | ARBITRUM_SEPOLIA => Duration::from_millis(200),
        BASE_MAINNET | BASE_SEPOLIA => Duration::from_secs(1),
        ANVIL_MAINNET => Duration::from_secs(2),
        _ => Duration::from_secs(3),
    }
}

/// How long a chain is watched after the last resolution referenced it.
pub fn update_timeout(chain_id: ChainId) -> Duration {
    match chain_id {
        ANVIL_MAINNET => Duration::from_secs(5),
        _ => Duration::from_secs(5 * 60),
    }
}
