// RPC-backed chain client and fee oracle
// One JSON-RPC endpoint per chain; balances and allowances go through
// `eth_call`, fees through `eth_feeHistory` with a legacy gas price fallback
//
// Numan Thabit 2025 Nov

use crate::abi;
use crate::chain::{CallRequest, ChainClient};
use crate::errors::RouterError;
use crate::fees::{
    estimated_time, suggested_fees_from_history, FeeOracle, SuggestedFees, TransactionEstimation,
};
use crate::networks::{has_l1_data_fee, ChainId, GAS_PRICE_ORACLE};
use crate::transport::jsonrpc::JsonRpc;
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

const FEE_HISTORY_BLOCKS: u64 = 300;
const ESTIMATION_HISTORY_BLOCKS: u64 = 100;
const REWARD_PERCENTILES: [f64; 3] = [25.0, 50.0, 75.0];

/// Endpoints keyed by chain id, shared by the chain client and fee oracle.
#[derive(Debug, Clone, Default)]
pub struct RpcEndpoints {
    clients: HashMap<ChainId, JsonRpc>,
}

impl RpcEndpoints {
    pub fn new(endpoints: impl IntoIterator<Item = (ChainId, String)>) -> Self {
        Self {
            clients: endpoints
                .into_iter()
                .map(|(chain_id, url)| (chain_id, JsonRpc::new(url, chain_id)))
                .collect(),
        }
    }

    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = self.clients.keys().copied().collect();
        chains.sort_unstable();
        chains
    }

    pub fn client(&self, chain_id: ChainId) -> Result<&JsonRpc, RouterError> {
        self.clients
            .get(&chain_id)
            .ok_or_else(|| RouterError::Transport(format!("no rpc endpoint for chain {chain_id}")))
    }
}

#[derive(Debug, Clone)]
pub struct RpcChainClient {
    endpoints: RpcEndpoints,
}

impl RpcChainClient {
    pub fn new(endpoints: RpcEndpoints) -> Self {
        Self { endpoints }
    }

    async fn call_uint(&self, chain_id: ChainId, to: Address, data: Bytes) -> Result<U256, RouterError> {
        let out = self.endpoints.client(chain_id)?.eth_call(to, &data).await?;
        abi::decode_uint(&out)
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn block_number(&self, chain_id: ChainId) -> Result<u64, RouterError> {
        self.endpoints.client(chain_id)?.block_number().await
    }

    async fn native_balance(&self, chain_id: ChainId, account: Address) -> Result<U256, RouterError> {
        self.endpoints.client(chain_id)?.get_balance(account).await
    }

    async fn token_balance(
        &self,
        chain_id: ChainId,
        token: Address,
        account: Address,
    ) -> Result<U256, RouterError> {
        self.call_uint(chain_id, token, abi::balance_of(account)).await
    }

    async fn erc1155_balance(
        &self,
        chain_id: ChainId,
        token: Address,
        account: Address,
        id: U256,
    ) -> Result<U256, RouterError> {
        self.call_uint(chain_id, token, abi::erc1155_balance_of(account, id))
            .await
    }

    async fn allowance(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, RouterError> {
        self.call_uint(chain_id, token, abi::allowance(owner, spender))
            .await
    }

    async fn estimate_gas(&self, chain_id: ChainId, call: &CallRequest) -> Result<u64, RouterError> {
        self.endpoints.client(chain_id)?.estimate_gas(call).await
    }

    async fn pending_nonce(&self, chain_id: ChainId, account: Address) -> Result<u64, RouterError> {
        self.endpoints.client(chain_id)?.pending_nonce(account).await
    }
}

#[derive(Debug, Clone)]
pub struct RpcFeeOracle {
    endpoints: RpcEndpoints,
}

impl RpcFeeOracle {
    pub fn new(endpoints: RpcEndpoints) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl FeeOracle for RpcFeeOracle {
    async fn suggested_fees(&self, chain_id: ChainId) -> Result<SuggestedFees, RouterError> {
        let rpc = self.endpoints.client(chain_id)?;
        let history = rpc
            .fee_history(FEE_HISTORY_BLOCKS, &REWARD_PERCENTILES)
            .await?;
        match suggested_fees_from_history(&history) {
            Ok(fees) => Ok(fees),
            Err(RouterError::Eip1559IncompatibleChain) => {
                debug!(chain_id, "no base fee in history, using legacy gas price");
                let gas_price = rpc.gas_price().await?;
                Ok(SuggestedFees::legacy(gas_price))
            }
            Err(err) => Err(err),
        }
    }

    async fn transaction_estimated_time(
        &self,
        chain_id: ChainId,
        max_fee_per_gas: U256,
        _priority_fee: U256,
    ) -> TransactionEstimation {
        let history = match self.endpoints.client(chain_id) {
            Ok(rpc) => rpc.fee_history(ESTIMATION_HISTORY_BLOCKS, &[]).await,
            Err(err) => Err(err),
        };
        match history {
            Ok(history) => estimated_time(&history, max_fee_per_gas),
            Err(err) => {
                warn!(chain_id, error = %err, "fee history unavailable for time estimate");
                TransactionEstimation::Unknown
            }
        }
    }

    async fn l1_fee(&self, chain_id: ChainId, tx_data: &[u8]) -> Result<U256, RouterError> {
        if !has_l1_data_fee(chain_id) {
            return Ok(U256::ZERO);
        }
        let out = self
            .endpoints
            .client(chain_id)?
            .eth_call(GAS_PRICE_ORACLE, &abi::get_l1_fee(tx_data))
            .await?;
        abi::decode_uint(&out)
    }
}
