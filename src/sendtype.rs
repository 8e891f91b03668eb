// Send types and the per-kind routing rules
// Each operation kind decides which strategies may serve it, on which
// networks, between which chains, and whether zero amounts are allowed
//
// Numan Thabit 2025 Nov

use crate::networks::{
    Network, ARBITRUM_MAINNET, BASE_MAINNET, ETHEREUM_MAINNET, ETHEREUM_SEPOLIA, OPTIMISM_MAINNET,
};
use crate::processors::ProcessorKind;
use crate::token::{parse_collectible_id, Token, TokenCatalog};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SendType {
    Transfer,
    #[serde(rename = "ENSRegister")]
    EnsRegister,
    #[serde(rename = "ENSRelease")]
    EnsRelease,
    #[serde(rename = "ENSSetPubKey")]
    EnsSetPubKey,
    StickersBuy,
    Bridge,
    #[serde(rename = "ERC721Transfer")]
    Erc721Transfer,
    #[serde(rename = "ERC1155Transfer")]
    Erc1155Transfer,
    Swap,
    CommunityBurn,
    CommunityDeployAssets,
    CommunityDeployCollectibles,
    CommunityDeployOwnerToken,
    CommunityMintTokens,
    CommunityRemoteBurn,
    CommunitySetSignerPubKey,
}

impl SendType {
    /// Wire name, also used as a metric label.
    pub fn name(self) -> &'static str {
        match self {
            SendType::Transfer => "Transfer",
            SendType::EnsRegister => "ENSRegister",
            SendType::EnsRelease => "ENSRelease",
            SendType::EnsSetPubKey => "ENSSetPubKey",
            SendType::StickersBuy => "StickersBuy",
            SendType::Bridge => "Bridge",
            SendType::Erc721Transfer => "ERC721Transfer",
            SendType::Erc1155Transfer => "ERC1155Transfer",
            SendType::Swap => "Swap",
            SendType::CommunityBurn => "CommunityBurn",
            SendType::CommunityDeployAssets => "CommunityDeployAssets",
            SendType::CommunityDeployCollectibles => "CommunityDeployCollectibles",
            SendType::CommunityDeployOwnerToken => "CommunityDeployOwnerToken",
            SendType::CommunityMintTokens => "CommunityMintTokens",
            SendType::CommunityRemoteBurn => "CommunityRemoteBurn",
            SendType::CommunitySetSignerPubKey => "CommunitySetSignerPubKey",
        }
    }

    pub fn is_collectibles_transfer(self) -> bool {
        matches!(self, SendType::Erc721Transfer | SendType::Erc1155Transfer)
    }

    pub fn is_ens_transfer(self) -> bool {
        matches!(
            self,
            SendType::EnsRegister | SendType::EnsRelease | SendType::EnsSetPubKey
        )
    }

    pub fn is_stickers_transfer(self) -> bool {
        self == SendType::StickersBuy
    }

    pub fn is_community_related(self) -> bool {
        matches!(
            self,
            SendType::CommunityBurn
                | SendType::CommunityDeployAssets
                | SendType::CommunityDeployCollectibles
                | SendType::CommunityDeployOwnerToken
                | SendType::CommunityMintTokens
                | SendType::CommunityRemoteBurn
                | SendType::CommunitySetSignerPubKey
        )
    }

    /// Transfer and Bridge have many alternative routes worth retrying.
    pub fn retries_on_balance_failure(self) -> bool {
        matches!(self, SendType::Transfer | SendType::Bridge)
    }

    /// Collectibles have no market price.
    pub fn fetch_prices(self) -> bool {
        !self.is_collectibles_transfer()
    }

    pub fn can_use_processor(self, processor: ProcessorKind) -> bool {
        match self {
            SendType::Transfer => processor == ProcessorKind::Transfer || processor.is_bridge(),
            SendType::Bridge => processor.is_bridge(),
            SendType::Swap => processor.is_swap(),
            SendType::Erc721Transfer => processor == ProcessorKind::Erc721Transfer,
            SendType::Erc1155Transfer => processor == ProcessorKind::Erc1155Transfer,
            SendType::EnsRegister => processor == ProcessorKind::EnsRegister,
            SendType::EnsRelease => processor == ProcessorKind::EnsRelease,
            SendType::EnsSetPubKey => processor == ProcessorKind::EnsPublicKey,
            SendType::StickersBuy => processor == ProcessorKind::StickersBuy,
            SendType::CommunityBurn => processor == ProcessorKind::CommunityBurn,
            SendType::CommunityDeployAssets => processor == ProcessorKind::CommunityDeployAssets,
            SendType::CommunityDeployCollectibles => {
                processor == ProcessorKind::CommunityDeployCollectibles
            }
            SendType::CommunityDeployOwnerToken => {
                processor == ProcessorKind::CommunityDeployOwnerToken
            }
            SendType::CommunityMintTokens => processor == ProcessorKind::CommunityMintTokens,
            SendType::CommunityRemoteBurn => processor == ProcessorKind::CommunityRemoteBurn,
            SendType::CommunitySetSignerPubKey => {
                processor == ProcessorKind::CommunitySetSignerPubKey
            }
        }
    }

    /// Zero amount-in is only meaningful for a few kinds.
    pub fn process_zero_amount_in_processor(
        self,
        amount_in: U256,
        amount_out: U256,
        processor: ProcessorKind,
    ) -> bool {
        if !amount_in.is_zero() {
            return true;
        }
        match self {
            SendType::Transfer => processor == ProcessorKind::Transfer,
            SendType::Swap => !amount_out.is_zero(),
            SendType::EnsRelease => true,
            kind => kind.is_community_related(),
        }
    }

    pub fn is_available_between(self, from: &Network, to: &Network) -> bool {
        if self.is_collectibles_transfer()
            || self.is_ens_transfer()
            || self.is_stickers_transfer()
            || self.is_community_related()
            || self == SendType::Swap
        {
            return from.chain_id == to.chain_id;
        }
        if self == SendType::Bridge {
            return from.chain_id != to.chain_id;
        }
        true
    }

    pub fn is_available_for(self, network: &Network) -> bool {
        if self == SendType::Swap {
            return matches!(
                network.chain_id,
                ETHEREUM_MAINNET | OPTIMISM_MAINNET | ARBITRUM_MAINNET | BASE_MAINNET
            );
        }
        if self.is_ens_transfer() || self.is_stickers_transfer() {
            return matches!(network.chain_id, ETHEREUM_MAINNET | ETHEREUM_SEPOLIA);
        }
        true
    }

    /// Resolves the token an operation moves. Collectible ids carry their own
    /// contract address so they bypass the catalog.
    pub fn find_token(
        self,
        catalog: &dyn TokenCatalog,
        network: &Network,
        token_id: &str,
    ) -> Option<Token> {
        if !self.is_collectibles_transfer() {
            return catalog.find_token(network, token_id);
        }
        let (address, id) = parse_collectible_id(token_id)?;
        Some(Token {
            address,
            name: token_id.to_string(),
            symbol: token_id.to_string(),
            decimals: 0,
            chain_id: network.chain_id,
            token_id: Some(id),
        })
    }
}
