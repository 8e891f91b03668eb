// Execution strategies ("processors")
// A processor knows how to execute one leg of a route: whether it serves a
// chain/token pair, what it charges, how much gas it needs and what
// calldata it sends
//
// Numan Thabit 2025 Nov

pub mod hop;
pub mod transfer;

use crate::errors::RouterError;
use crate::networks::Network;
use crate::token::Token;
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use hop::{HopProcessor, HopSettings};
pub use transfer::TransferProcessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProcessorKind {
    Transfer,
    #[serde(rename = "ERC721Transfer")]
    Erc721Transfer,
    #[serde(rename = "ERC1155Transfer")]
    Erc1155Transfer,
    Hop,
    CBridge,
    Paraswap,
    #[serde(rename = "ENSRegister")]
    EnsRegister,
    #[serde(rename = "ENSRelease")]
    EnsRelease,
    #[serde(rename = "ENSPublicKey")]
    EnsPublicKey,
    StickersBuy,
    CommunityBurn,
    CommunityDeployAssets,
    CommunityDeployCollectibles,
    CommunityDeployOwnerToken,
    CommunityMintTokens,
    CommunityRemoteBurn,
    CommunitySetSignerPubKey,
}

impl ProcessorKind {
    pub fn name(self) -> &'static str {
        match self {
            ProcessorKind::Transfer => "Transfer",
            ProcessorKind::Erc721Transfer => "ERC721Transfer",
            ProcessorKind::Erc1155Transfer => "ERC1155Transfer",
            ProcessorKind::Hop => "Hop",
            ProcessorKind::CBridge => "CBridge",
            ProcessorKind::Paraswap => "Paraswap",
            ProcessorKind::EnsRegister => "ENSRegister",
            ProcessorKind::EnsRelease => "ENSRelease",
            ProcessorKind::EnsPublicKey => "ENSPublicKey",
            ProcessorKind::StickersBuy => "StickersBuy",
            ProcessorKind::CommunityBurn => "CommunityBurn",
            ProcessorKind::CommunityDeployAssets => "CommunityDeployAssets",
            ProcessorKind::CommunityDeployCollectibles => "CommunityDeployCollectibles",
            ProcessorKind::CommunityDeployOwnerToken => "CommunityDeployOwnerToken",
            ProcessorKind::CommunityMintTokens => "CommunityMintTokens",
            ProcessorKind::CommunityRemoteBurn => "CommunityRemoteBurn",
            ProcessorKind::CommunitySetSignerPubKey => "CommunitySetSignerPubKey",
        }
    }

    pub fn is_bridge(self) -> bool {
        matches!(self, ProcessorKind::Hop | ProcessorKind::CBridge)
    }

    pub fn is_swap(self) -> bool {
        self == ProcessorKind::Paraswap
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a processor sees about one candidate leg.
#[derive(Debug, Clone)]
pub struct ProcessorInputParams {
    pub from_chain: Network,
    pub to_chain: Network,
    pub from_token: Token,
    pub to_token: Option<Token>,
    pub from_addr: Address,
    pub to_addr: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub username: String,
    pub public_key: String,
    pub pack_id: Option<U256>,
}

#[async_trait]
pub trait PathProcessor: Send + Sync {
    fn kind(&self) -> ProcessorKind;

    /// `Ok(false)` means the processor simply does not serve this leg.
    async fn available_for(&self, params: &ProcessorInputParams) -> Result<bool, RouterError>;

    /// Returns `(bonder_fee, token_fee)` in from-token units.
    async fn calculate_fees(
        &self,
        params: &ProcessorInputParams,
    ) -> Result<(U256, U256), RouterError>;

    async fn estimate_gas(&self, params: &ProcessorInputParams) -> Result<u64, RouterError>;

    /// Contract that must be approved to spend the from-token, if any.
    async fn get_contract_address(
        &self,
        params: &ProcessorInputParams,
    ) -> Result<Option<Address>, RouterError>;

    async fn calculate_amount_out(
        &self,
        params: &ProcessorInputParams,
    ) -> Result<U256, RouterError>;

    async fn pack_tx_input_data(
        &self,
        params: &ProcessorInputParams,
    ) -> Result<Bytes, RouterError>;
}

/// Applies a percentage margin to a gas estimate.
pub(crate) fn with_gas_margin(gas: u64, percent: u64) -> u64 {
    gas.saturating_mul(100 + percent) / 100
}
