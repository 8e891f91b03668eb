//! Fixture values: ETH at 2000 USD, USDC at 1 USD, 2 ETH and 100 USDC on
//! each mainnet, 50 gwei base fee and 1/2/3 gwei fee levels.

use alloy_primitives::{Address, U256};
use wallet_router::fees::{
    MaxFeesLevels, MaxPriorityFeesSuggestedBounds, SuggestedFees, TransactionEstimation,
};
use wallet_router::networks::{ChainId, Network, SUPPORTED_NETWORKS, SUPPORTED_TEST_NETWORKS};
use wallet_router::requests::RouteInputParams;
use wallet_router::sendtype::SendType;
use wallet_router::token::Token;

pub const MILLI_ETH: u64 = 1_000_000_000_000_000;
pub const GWEI: u64 = 1_000_000_000;
pub const USDC_UNIT: u64 = 1_000_000;

pub const ETH_PRICE: f64 = 2000.0;
pub const USDC_PRICE: f64 = 1.0;

pub const ETH_BALANCE_MILLI: u64 = 2_000;
pub const USDC_BALANCE: u64 = 100;

pub const BASE_FEE_GWEI: u64 = 50;
pub const TRANSFER_GAS: u64 = 1000;
pub const BRIDGE_GAS: u64 = 5000;
pub const APPROVAL_GAS: u64 = 21_000;
pub const ETH_BONDER_FEE: u64 = 150_000_000_000_000;
pub const USDC_BONDER_FEE: u64 = 10_000;
pub const PENDING_NONCE: u64 = 7;

pub const MAINNETS: [ChainId; 4] = SUPPORTED_NETWORKS;

pub fn eth(milli: u64) -> U256 {
    U256::from(milli) * U256::from(MILLI_ETH)
}

pub fn usdc(whole: u64) -> U256 {
    U256::from(whole) * U256::from(USDC_UNIT)
}

pub fn gwei(n: u64) -> U256 {
    U256::from(n) * U256::from(GWEI)
}

pub fn sender() -> Address {
    Address::with_last_byte(0xaa)
}

pub fn recipient() -> Address {
    Address::with_last_byte(0xbb)
}

pub fn usdc_address() -> Address {
    Address::with_last_byte(0xcc)
}

pub fn networks() -> Vec<Network> {
    SUPPORTED_NETWORKS
        .iter()
        .chain(SUPPORTED_TEST_NETWORKS.iter())
        .filter_map(|id| Network::known(*id))
        .collect()
}

pub fn usdc_tokens() -> Vec<Token> {
    MAINNETS
        .iter()
        .map(|chain_id| Token {
            address: usdc_address(),
            name: "USD Coin".to_string(),
            symbol: "USDC".to_string(),
            decimals: 6,
            chain_id: *chain_id,
            token_id: None,
        })
        .collect()
}

/// Fee levels with `medium_gwei` as the medium max fee.
pub fn suggested_fees(medium_gwei: u64) -> SuggestedFees {
    let priority = U256::from(GWEI / 2);
    SuggestedFees {
        gas_price: gwei(medium_gwei),
        base_fee: gwei(BASE_FEE_GWEI),
        current_base_fee: gwei(BASE_FEE_GWEI),
        max_fees_levels: MaxFeesLevels {
            low: gwei(1),
            low_priority: priority,
            low_estimated_time: TransactionEstimation::LessThanFiveMinutes,
            medium: gwei(medium_gwei),
            medium_priority: priority,
            medium_estimated_time: TransactionEstimation::LessThanThreeMinutes,
            high: gwei(3),
            high_priority: priority,
            high_estimated_time: TransactionEstimation::LessThanOneMinute,
        },
        max_priority_fee_per_gas: priority,
        max_priority_fee_suggested_bounds: MaxPriorityFeesSuggestedBounds {
            lower: U256::from(GWEI / 10),
            upper: gwei(1),
        },
        eip1559_enabled: true,
    }
}

pub fn transfer(uuid: &str, amount: U256, token: &str) -> RouteInputParams {
    RouteInputParams::new(uuid, SendType::Transfer, sender(), recipient(), amount, token)
}

pub fn bridge(uuid: &str, amount: U256, token: &str) -> RouteInputParams {
    RouteInputParams::new(uuid, SendType::Bridge, sender(), recipient(), amount, token)
}

/// Medium-level fee of one main tx of `gas` units, in wei.
pub fn medium_fee(gas: u64) -> U256 {
    gwei(2) * U256::from(gas)
}
