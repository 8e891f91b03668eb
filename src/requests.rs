// Route request types and input validation
// Everything here is checked before the router touches the network
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use crate::fees::GasFeeMode;
use crate::networks::{supported_networks, ChainId};
use crate::processors::ProcessorKind;
use crate::sendtype::SendType;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const STT_SYMBOL: &str = "STT";
pub const SNT_SYMBOL: &str = "SNT";

const MAX_SUPPLY: u64 = 999_999_999;
const ASSET_SUPPLY_MULTIPLIER: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInputParams {
    #[serde(default)]
    pub uuid: String,
    pub send_type: SendType,
    pub addr_from: Address,
    pub addr_to: Address,
    #[serde(default)]
    pub amount_in: U256,
    #[serde(default)]
    pub amount_out: U256,
    #[serde(rename = "tokenID")]
    pub token_id: String,
    #[serde(rename = "toTokenID", default)]
    pub to_token_id: String,
    #[serde(rename = "disabledFromChainIDs", default)]
    pub disabled_from_chain_ids: Vec<ChainId>,
    #[serde(rename = "disabledToChainIDs", default)]
    pub disabled_to_chain_ids: Vec<ChainId>,
    #[serde(default)]
    pub gas_fee_mode: GasFeeMode,
    #[serde(default)]
    pub from_locked_amount: BTreeMap<ChainId, U256>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(rename = "packID", default)]
    pub pack_id: Option<U256>,
    #[serde(default)]
    pub community_route_input_params: Option<CommunityRouteInputParams>,
    /// Per-transaction overrides keyed by [`PathTxIdentity::key`].
    #[serde(skip)]
    pub path_tx_custom_params: HashMap<String, PathTxCustomParams>,
}

impl RouteInputParams {
    pub fn new(
        uuid: impl Into<String>,
        send_type: SendType,
        addr_from: Address,
        addr_to: Address,
        amount_in: U256,
        token_id: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            send_type,
            addr_from,
            addr_to,
            amount_in,
            amount_out: U256::ZERO,
            token_id: token_id.into(),
            to_token_id: String::new(),
            disabled_from_chain_ids: Vec::new(),
            disabled_to_chain_ids: Vec::new(),
            gas_fee_mode: GasFeeMode::Medium,
            from_locked_amount: BTreeMap::new(),
            username: String::new(),
            public_key: String::new(),
            pack_id: None,
            community_route_input_params: None,
            path_tx_custom_params: HashMap::new(),
        }
    }

    pub fn community_id(&self) -> &str {
        self.community_route_input_params
            .as_ref()
            .map(|c| c.community_id.as_str())
            .unwrap_or_default()
    }

    pub fn validate(&self, testnet_mode: bool) -> Result<(), RouterError> {
        for params in self.path_tx_custom_params.values() {
            params.validate()?;
        }

        match self.send_type {
            SendType::EnsRegister => {
                if self.username.is_empty() || self.public_key.is_empty() {
                    return Err(RouterError::EnsRegisterRequiresUsernameAndPubKey);
                }
                if testnet_mode && self.token_id != STT_SYMBOL {
                    return Err(RouterError::EnsRegisterTestnetSttOnly);
                }
                if !testnet_mode && self.token_id != SNT_SYMBOL {
                    return Err(RouterError::EnsRegisterMainnetSntOnly);
                }
                return Ok(());
            }
            SendType::EnsRelease if self.username.is_empty() => {
                return Err(RouterError::EnsReleaseRequiresUsername);
            }
            SendType::EnsSetPubKey => {
                if self.username.is_empty() || self.public_key.is_empty() {
                    return Err(RouterError::EnsSetPubKeyRequiresUsernameAndPubKey);
                }
                if !is_valid_ens_username(&self.username) {
                    return Err(RouterError::EnsSetPubKeyInvalidUsername);
                }
            }
            SendType::StickersBuy if self.pack_id.is_none() => {
                return Err(RouterError::StickersBuyRequiresPackId);
            }
            SendType::Swap => {
                if self.to_token_id.is_empty() {
                    return Err(RouterError::SwapRequiresToTokenId);
                }
                if self.token_id == self.to_token_id {
                    return Err(RouterError::SwapTokenIdMustBeDifferent);
                }
                if !self.amount_in.is_zero() && !self.amount_out.is_zero() {
                    return Err(RouterError::SwapAmountInAmountOutMustBeExclusive);
                }
            }
            _ => {}
        }

        if self.send_type.is_community_related() {
            if self.disabled_from_chain_ids.is_empty() {
                return Err(RouterError::NoFromChainProvided);
            }
            if self.disabled_to_chain_ids.is_empty() {
                return Err(RouterError::NoToChainProvided);
            }
            if !self.disabled_sets_match() {
                return Err(RouterError::FromAndToChainMustBeTheSame);
            }
            let community = self
                .community_route_input_params
                .as_ref()
                .ok_or(RouterError::NoCommunityParametersProvided)?;
            return community.validate(self.send_type);
        }

        if self.send_type == SendType::Bridge
            && !self.from_locked_amount.is_empty()
            && !self.disabled_sets_match()
        {
            return Err(RouterError::FromAndToChainMustBeTheSame);
        }

        self.validate_from_locked_amount(testnet_mode)
    }

    fn disabled_sets_match(&self) -> bool {
        let from: BTreeSet<_> = self.disabled_from_chain_ids.iter().collect();
        let to: BTreeSet<_> = self.disabled_to_chain_ids.iter().collect();
        from == to
    }

    fn validate_from_locked_amount(&self, testnet_mode: bool) -> Result<(), RouterError> {
        if self.from_locked_amount.is_empty() {
            return Ok(());
        }

        let supported = supported_networks(testnet_mode);
        let mut unlocked: BTreeSet<ChainId> = supported.iter().copied().collect();
        let mut total_locked = U256::ZERO;
        let mut excluded_chains = 0usize;

        for (chain_id, amount) in &self.from_locked_amount {
            if self.disabled_from_chain_ids.contains(chain_id) {
                return Err(RouterError::DisabledChainFoundAmongLockedNetworks);
            }
            if !supported.contains(chain_id) {
                return Err(RouterError::LockedAmountNotSupportedForNetwork);
            }
            if amount.is_zero() {
                excluded_chains += 1;
            }
            unlocked.remove(chain_id);
            total_locked = total_locked.saturating_add(*amount);
        }

        if excluded_chains == supported.len() {
            return Err(RouterError::LockedAmountExcludesAllSupported);
        }
        if total_locked > self.amount_in {
            return Err(RouterError::LockedAmountExceedsTotalSendAmount);
        }
        let any_unlocked_enabled = unlocked
            .iter()
            .any(|c| !self.disabled_from_chain_ids.contains(c));
        if total_locked < self.amount_in && !any_unlocked_enabled {
            return Err(RouterError::LockedAmountLessThanSendAmountAllNetworks);
        }
        Ok(())
    }
}

fn is_valid_ens_username(username: &str) -> bool {
    match username.strip_suffix(".eth") {
        Some(label) => !label.is_empty() && !label.contains(char::is_whitespace),
        None => false,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRouteInputParams {
    #[serde(rename = "communityID")]
    pub community_id: String,
    #[serde(default)]
    pub transfer_details: Vec<TransferDetails>,
    #[serde(default)]
    pub signer_pub_key: String,
    #[serde(default)]
    pub token_ids: Vec<U256>,
    #[serde(default)]
    pub wallet_addresses: Vec<Address>,
    #[serde(default)]
    pub token_deployment_signature: String,
    #[serde(default)]
    pub owner_token_parameters: Option<DeploymentParameters>,
    #[serde(default)]
    pub master_token_parameters: Option<DeploymentParameters>,
    #[serde(default)]
    pub deployment_parameters: Option<DeploymentParameters>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetails {
    #[serde(default)]
    pub token_type: u8,
    #[serde(default)]
    pub privilege_level: u8,
    pub token_contract_address: Address,
    #[serde(default)]
    pub amount: Option<U256>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentParameters {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub supply: Option<U256>,
    #[serde(default)]
    pub infinite_supply: bool,
    #[serde(default)]
    pub transferable: bool,
    #[serde(default)]
    pub remote_self_destruct: bool,
    #[serde(default)]
    pub token_uri: String,
    #[serde(default)]
    pub decimals: u8,
}

impl DeploymentParameters {
    pub fn validate(&self, is_asset: bool) -> Result<(), RouterError> {
        if self.name.is_empty() {
            return Err(RouterError::NoNameSet);
        }
        if self.symbol.is_empty() {
            return Err(RouterError::NoSymbolSet);
        }
        let mut max_supply = U256::from(MAX_SUPPLY);
        if is_asset {
            max_supply *= U256::from(ASSET_SUPPLY_MULTIPLIER);
        }
        let supply = self.supply.unwrap_or_default();
        if !self.infinite_supply && supply > max_supply {
            return Err(RouterError::WrongSupplyValue(supply.to_string()));
        }
        Ok(())
    }
}

impl CommunityRouteInputParams {
    fn validate(&self, send_type: SendType) -> Result<(), RouterError> {
        if self.community_id.is_empty() {
            return Err(RouterError::NoCommunityIdProvided);
        }

        match send_type {
            SendType::CommunityBurn => self.validate_transfer_details(true),
            SendType::CommunityDeployAssets => self
                .deployment_parameters
                .as_ref()
                .ok_or(RouterError::NoCommunityDeploymentParameters)?
                .validate(true),
            SendType::CommunityDeployCollectibles => self
                .deployment_parameters
                .as_ref()
                .ok_or(RouterError::NoCommunityDeploymentParameters)?
                .validate(false),
            SendType::CommunityDeployOwnerToken => {
                if self.signer_pub_key.is_empty() {
                    return Err(RouterError::NoCommunitySignerPubKey);
                }
                if self.token_deployment_signature.is_empty() {
                    return Err(RouterError::NoCommunityTokenDeploymentSignature);
                }
                if self.owner_token_parameters.is_none() {
                    return Err(RouterError::NoCommunityOwnerTokenParameters);
                }
                if self.master_token_parameters.is_none() {
                    return Err(RouterError::NoCommunityMasterTokenParameters);
                }
                Ok(())
            }
            SendType::CommunityMintTokens => {
                if self.wallet_addresses.is_empty() {
                    return Err(RouterError::WalletAddressesEmpty);
                }
                self.validate_transfer_details(true)
            }
            SendType::CommunityRemoteBurn if self.token_ids.is_empty() => {
                Err(RouterError::CommunityTokenIdsListEmpty)
            }
            SendType::CommunitySetSignerPubKey => {
                if self.signer_pub_key.is_empty() {
                    return Err(RouterError::NoCommunitySignerPubKey);
                }
                if self.transfer_details.len() != 1 {
                    return Err(RouterError::SetSignerPubKeyWithMultipleTransferDetails);
                }
                self.validate_transfer_details(false)
            }
            _ => Ok(()),
        }
    }

    fn validate_transfer_details(&self, require_amount: bool) -> Result<(), RouterError> {
        if self.transfer_details.is_empty() {
            return Err(RouterError::NoCommunityTransferDetails);
        }
        for details in &self.transfer_details {
            if details.token_contract_address == Address::ZERO {
                return Err(RouterError::NoCommunityContractAddress);
            }
            if !require_amount {
                continue;
            }
            match details.amount {
                None => return Err(RouterError::NoCommunityAmount),
                Some(amount) if amount.is_zero() => {
                    return Err(RouterError::CommunityAmountMustBePositive)
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// User overrides for one transaction of one path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathTxCustomParams {
    pub gas_fee_mode: GasFeeMode,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub gas_amount: u64,
    #[serde(default)]
    pub max_fees_per_gas: Option<U256>,
    #[serde(default)]
    pub priority_fee: Option<U256>,
}

impl PathTxCustomParams {
    pub fn validate(&self) -> Result<(), RouterError> {
        if self.gas_fee_mode != GasFeeMode::Custom {
            return Ok(());
        }
        if self.max_fees_per_gas.is_none() {
            return Err(RouterError::MaxFeesPerGasRequired);
        }
        if self.priority_fee.is_none() {
            return Err(RouterError::PriorityFeeRequired);
        }
        Ok(())
    }
}

/// Identifies one transaction (approval or main) of one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathTxIdentity {
    pub router_input_params_uuid: String,
    pub path_name: ProcessorKind,
    #[serde(rename = "chainID")]
    pub chain_id: ChainId,
    #[serde(default)]
    pub is_approval_tx: bool,
    #[serde(default)]
    pub community_id: String,
}

impl PathTxIdentity {
    pub fn path_identity(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.router_input_params_uuid, self.path_name, self.chain_id, self.community_id
        )
    }

    pub fn key(&self) -> String {
        format!("{}-{}", self.path_identity(), self.is_approval_tx)
    }
}
