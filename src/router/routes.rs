// Route types
// This file defines the priced leg (`Path`), the route built from legs,
// and the result envelopes handed to callers and event subscribers
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use crate::fees::{GasFeeMode, MaxFeesLevels, TransactionEstimation};
use crate::networks::{chain_priority, ChainId, Network};
use crate::processors::ProcessorKind;
use crate::token::Token;
use alloy_primitives::{Address, Bytes, U256};
use serde::Serialize;

/// One priced, chain-specific leg of a transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Path {
    pub router_input_params_uuid: String,
    pub processor_name: ProcessorKind,
    pub from_chain: Network,
    pub to_chain: Network,
    pub from_token: Token,
    pub to_token: Option<Token>,
    pub amount_in: U256,
    pub amount_in_locked: bool,
    pub amount_out: U256,

    pub suggested_levels_for_max_fees_per_gas: MaxFeesLevels,
    pub suggested_min_priority_fee: U256,
    pub suggested_max_priority_fee: U256,
    pub suggested_tx_nonce: Option<u64>,
    pub suggested_tx_gas_amount: u64,
    pub suggested_approval_tx_nonce: Option<u64>,
    pub suggested_approval_gas_amount: u64,
    pub current_base_fee: U256,
    pub used_contract_address: Option<Address>,

    pub tx_packed_data: Bytes,
    pub tx_nonce: Option<u64>,
    pub tx_gas_fee_mode: GasFeeMode,
    pub tx_max_fees_per_gas: U256,
    pub tx_base_fee: U256,
    pub tx_priority_fee: U256,
    pub tx_gas_amount: u64,
    pub tx_bonder_fees: U256,
    pub tx_token_fees: U256,
    pub tx_estimated_time: TransactionEstimation,
    /// Main tx only, in wei.
    pub tx_fee: U256,
    pub tx_l1_fee: U256,

    pub approval_required: bool,
    pub approval_amount_required: U256,
    pub approval_contract_address: Option<Address>,
    pub approval_packed_data: Bytes,
    pub approval_tx_nonce: Option<u64>,
    pub approval_gas_fee_mode: GasFeeMode,
    pub approval_max_fees_per_gas: U256,
    pub approval_base_fee: U256,
    pub approval_priority_fee: U256,
    pub approval_gas_amount: u64,
    pub approval_estimated_time: TransactionEstimation,
    pub approval_fee: U256,
    pub approval_l1_fee: U256,

    /// Tx, approval and both L1 fees, in wei.
    pub tx_total_fee: U256,

    pub required_token_balance: U256,
    pub required_native_balance: U256,
    pub subtract_fees: bool,

    #[serde(skip)]
    pub community_id: String,
}

impl Path {
    pub fn new(
        uuid: impl Into<String>,
        processor: ProcessorKind,
        from_chain: Network,
        to_chain: Network,
        from_token: Token,
        to_token: Option<Token>,
        amount_in: U256,
    ) -> Self {
        Self {
            router_input_params_uuid: uuid.into(),
            processor_name: processor,
            from_chain,
            to_chain,
            from_token,
            to_token,
            amount_in,
            amount_in_locked: false,
            amount_out: U256::ZERO,
            suggested_levels_for_max_fees_per_gas: MaxFeesLevels::default(),
            suggested_min_priority_fee: U256::ZERO,
            suggested_max_priority_fee: U256::ZERO,
            suggested_tx_nonce: None,
            suggested_tx_gas_amount: 0,
            suggested_approval_tx_nonce: None,
            suggested_approval_gas_amount: 0,
            current_base_fee: U256::ZERO,
            used_contract_address: None,
            tx_packed_data: Bytes::new(),
            tx_nonce: None,
            tx_gas_fee_mode: GasFeeMode::Medium,
            tx_max_fees_per_gas: U256::ZERO,
            tx_base_fee: U256::ZERO,
            tx_priority_fee: U256::ZERO,
            tx_gas_amount: 0,
            tx_bonder_fees: U256::ZERO,
            tx_token_fees: U256::ZERO,
            tx_estimated_time: TransactionEstimation::Unknown,
            tx_fee: U256::ZERO,
            tx_l1_fee: U256::ZERO,
            approval_required: false,
            approval_amount_required: U256::ZERO,
            approval_contract_address: None,
            approval_packed_data: Bytes::new(),
            approval_tx_nonce: None,
            approval_gas_fee_mode: GasFeeMode::Medium,
            approval_max_fees_per_gas: U256::ZERO,
            approval_base_fee: U256::ZERO,
            approval_priority_fee: U256::ZERO,
            approval_gas_amount: 0,
            approval_estimated_time: TransactionEstimation::Unknown,
            approval_fee: U256::ZERO,
            approval_l1_fee: U256::ZERO,
            tx_total_fee: U256::ZERO,
            required_token_balance: U256::ZERO,
            required_native_balance: U256::ZERO,
            subtract_fees: false,
            community_id: String::new(),
        }
    }

    pub fn path_identity(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.router_input_params_uuid,
            self.processor_name,
            self.from_chain.chain_id,
            self.community_id
        )
    }

    pub fn tx_identity_key(&self, approval: bool) -> String {
        format!("{}-{}", self.path_identity(), approval)
    }

    /// Strategy, chains and token: the identity used when discarding routes
    /// after a balance failure.
    pub fn signature(&self) -> (ProcessorKind, ChainId, ChainId, &str) {
        (
            self.processor_name,
            self.from_chain.chain_id,
            self.to_chain.chain_id,
            self.from_token.symbol.as_str(),
        )
    }
}

pub type Route = Vec<Path>;

pub fn route_priority(route: &[Path]) -> u32 {
    route
        .iter()
        .map(|p| u32::from(chain_priority(p.from_chain.chain_id)))
        .sum()
}

pub fn route_amount_in(route: &[Path]) -> U256 {
    route
        .iter()
        .fold(U256::ZERO, |acc, p| acc.saturating_add(p.amount_in))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedRoutes {
    pub uuid: String,
    pub best: Route,
    pub candidates: Vec<Path>,
    pub token_price: f64,
    pub native_token_price: f64,
}

impl SuggestedRoutes {
    pub fn new(uuid: impl Into<String>, candidates: Vec<Path>, token_price: f64, native_token_price: f64) -> Self {
        Self {
            uuid: uuid.into(),
            best: Vec::new(),
            candidates,
            token_price,
            native_token_price,
        }
    }
}

/// Event and API payload: routes when available, error when not, or both
/// when a fallback route failed balance validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedRoutesResponse {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<Route>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Path>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_token_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    /// Set when the payload refreshes an already delivered route.
    pub updated: bool,
}

impl SuggestedRoutesResponse {
    pub fn new(uuid: impl Into<String>, routes: Option<&SuggestedRoutes>, error: Option<&RouterError>) -> Self {
        let mut resp = Self {
            uuid: uuid.into(),
            ..Default::default()
        };
        if let Some(routes) = routes {
            if !routes.best.is_empty() {
                resp.best = Some(routes.best.clone());
            }
            resp.candidates = Some(routes.candidates.clone());
            resp.token_price = Some(routes.token_price);
            resp.native_token_price = Some(routes.native_token_price);
        }
        if let Some(err) = error {
            resp.error_code = Some(err.code().to_string());
            resp.error_details = Some(err.to_string());
        }
        resp
    }

    pub fn updated(mut self) -> Self {
        self.updated = true;
        self
    }
}
