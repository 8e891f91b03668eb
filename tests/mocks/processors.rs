//! Deterministic transfer and bridge strategies

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use wallet_router::abi;
use wallet_router::errors::RouterError;
use wallet_router::processors::{PathProcessor, ProcessorInputParams, ProcessorKind};

use super::fixtures::*;

/// Same-chain sends, no fees.
pub struct MockTransfer {
    pub calls: AtomicUsize,
}

impl MockTransfer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PathProcessor for MockTransfer {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Transfer
    }

    async fn available_for(&self, params: &ProcessorInputParams) -> Result<bool, RouterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(params.from_chain.chain_id == params.to_chain.chain_id)
    }

    async fn calculate_fees(&self, _params: &ProcessorInputParams) -> Result<(U256, U256), RouterError> {
        Ok((U256::ZERO, U256::ZERO))
    }

    async fn estimate_gas(&self, _params: &ProcessorInputParams) -> Result<u64, RouterError> {
        Ok(TRANSFER_GAS)
    }

    async fn get_contract_address(
        &self,
        _params: &ProcessorInputParams,
    ) -> Result<Option<Address>, RouterError> {
        Ok(None)
    }

    async fn calculate_amount_out(&self, params: &ProcessorInputParams) -> Result<U256, RouterError> {
        Ok(params.amount_in)
    }

    async fn pack_tx_input_data(&self, params: &ProcessorInputParams) -> Result<Bytes, RouterError> {
        Ok(abi::transfer(params.to_addr, params.amount_in))
    }
}

/// Cross-chain sends charging a fixed bonder fee per token.
pub struct MockBridge {
    bonder_fees: HashMap<String, U256>,
    spender: Option<Address>,
    failure: Option<RouterError>,
    pub calls: AtomicUsize,
}

impl MockBridge {
    pub fn new() -> Self {
        Self {
            bonder_fees: HashMap::from([
                ("ETH".to_string(), U256::from(ETH_BONDER_FEE)),
                ("USDC".to_string(), U256::from(USDC_BONDER_FEE)),
            ]),
            spender: None,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Bridge contract that must be approved for ERC-20 sends.
    pub fn with_spender(spender: Address) -> Self {
        Self {
            spender: Some(spender),
            ..Self::new()
        }
    }

    /// Every quote fails with `error`.
    pub fn failing(error: RouterError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    fn bonder_fee(&self, params: &ProcessorInputParams) -> U256 {
        self.bonder_fees
            .get(&params.from_token.symbol)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PathProcessor for MockBridge {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Hop
    }

    async fn available_for(&self, params: &ProcessorInputParams) -> Result<bool, RouterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(params.from_chain.chain_id != params.to_chain.chain_id)
    }

    async fn calculate_fees(&self, params: &ProcessorInputParams) -> Result<(U256, U256), RouterError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok((self.bonder_fee(params), U256::ZERO))
    }

    async fn estimate_gas(&self, _params: &ProcessorInputParams) -> Result<u64, RouterError> {
        Ok(BRIDGE_GAS)
    }

    async fn get_contract_address(
        &self,
        _params: &ProcessorInputParams,
    ) -> Result<Option<Address>, RouterError> {
        Ok(self.spender)
    }

    async fn calculate_amount_out(&self, params: &ProcessorInputParams) -> Result<U256, RouterError> {
        Ok(params.amount_in.saturating_sub(self.bonder_fee(params)))
    }

    async fn pack_tx_input_data(&self, _params: &ProcessorInputParams) -> Result<Bytes, RouterError> {
        Ok(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]))
    }
}
