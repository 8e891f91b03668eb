// Same-chain transfer of a native or ERC-20 token
//
// Numan Thabit 2025 Nov

use super::{with_gas_margin, PathProcessor, ProcessorInputParams, ProcessorKind};
use crate::abi;
use crate::chain::{CallRequest, ChainClient};
use crate::errors::RouterError;
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use std::sync::Arc;

const GAS_MARGIN_PERCENT: u64 = 5;

pub struct TransferProcessor {
    chain: Arc<dyn ChainClient>,
}

impl TransferProcessor {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    fn call_request(params: &ProcessorInputParams) -> CallRequest {
        if params.from_token.is_native() {
            CallRequest {
                from: params.from_addr,
                to: params.to_addr,
                value: params.amount_in,
                data: Bytes::new(),
            }
        } else {
            CallRequest {
                from: params.from_addr,
                to: params.from_token.address,
                value: U256::ZERO,
                data: abi::transfer(params.to_addr, params.amount_in),
            }
        }
    }
}

#[async_trait]
impl PathProcessor for TransferProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Transfer
    }

    async fn available_for(&self, params: &ProcessorInputParams) -> Result<bool, RouterError> {
        Ok(params.from_chain.chain_id == params.to_chain.chain_id && params.to_token.is_none())
    }

    async fn calculate_fees(
        &self,
        _params: &ProcessorInputParams,
    ) -> Result<(U256, U256), RouterError> {
        Ok((U256::ZERO, U256::ZERO))
    }

    async fn estimate_gas(&self, params: &ProcessorInputParams) -> Result<u64, RouterError> {
        let call = Self::call_request(params);
        let gas = self
            .chain
            .estimate_gas(params.from_chain.chain_id, &call)
            .await?;
        Ok(with_gas_margin(gas, GAS_MARGIN_PERCENT))
    }

    async fn get_contract_address(
        &self,
        _params: &ProcessorInputParams,
    ) -> Result<Option<Address>, RouterError> {
        Ok(None)
    }

    async fn calculate_amount_out(
        &self,
        params: &ProcessorInputParams,
    ) -> Result<U256, RouterError> {
        Ok(params.amount_in)
    }

    async fn pack_tx_input_data(
        &self,
        params: &ProcessorInputParams,
    ) -> Result<Bytes, RouterError> {
        Ok(Self::call_request(params).data)
    }
}
