//! Mock chain client, fee oracle and price source

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use wallet_router::chain::{CallRequest, ChainClient, PriceSource};
use wallet_router::errors::RouterError;
use wallet_router::fees::{FeeOracle, SuggestedFees, TransactionEstimation};
use wallet_router::networks::ChainId;

use super::fixtures::*;

/// Balances keyed by `(chain, token contract)`, native under the zero address.
pub struct MockChain {
    balances: Mutex<HashMap<(ChainId, Address), U256>>,
    allowance: Mutex<U256>,
    block: AtomicU64,
    block_error: AtomicBool,
    pub balance_calls: AtomicUsize,
    pub nonce_calls: AtomicUsize,
}

impl MockChain {
    /// 2 ETH and 100 USDC on each mainnet, unlimited allowance.
    pub fn funded() -> Self {
        let mut balances = HashMap::new();
        for chain_id in MAINNETS {
            balances.insert((chain_id, Address::ZERO), eth(ETH_BALANCE_MILLI));
            balances.insert((chain_id, usdc_address()), usdc(USDC_BALANCE));
        }
        Self {
            balances: Mutex::new(balances),
            allowance: Mutex::new(U256::MAX),
            block: AtomicU64::new(100),
            block_error: AtomicBool::new(false),
            balance_calls: AtomicUsize::new(0),
            nonce_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_native_balance(&self, chain_id: ChainId, amount: U256) {
        self.balances
            .lock()
            .unwrap()
            .insert((chain_id, Address::ZERO), amount);
    }

    pub fn set_allowance(&self, amount: U256) {
        *self.allowance.lock().unwrap() = amount;
    }

    pub fn set_block(&self, block: u64) {
        self.block.store(block, Ordering::SeqCst);
    }

    pub fn fail_block_number(&self, fail: bool) {
        self.block_error.store(fail, Ordering::SeqCst);
    }

    fn balance(&self, chain_id: ChainId, token: Address) -> U256 {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balances
            .lock()
            .unwrap()
            .get(&(chain_id, token))
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn block_number(&self, _chain_id: ChainId) -> Result<u64, RouterError> {
        if self.block_error.load(Ordering::SeqCst) {
            return Err(RouterError::Transport("mock rpc unreachable".into()));
        }
        Ok(self.block.load(Ordering::SeqCst))
    }

    async fn native_balance(&self, chain_id: ChainId, _account: Address) -> Result<U256, RouterError> {
        Ok(self.balance(chain_id, Address::ZERO))
    }

    async fn token_balance(
        &self,
        chain_id: ChainId,
        token: Address,
        _account: Address,
    ) -> Result<U256, RouterError> {
        Ok(self.balance(chain_id, token))
    }

    async fn erc1155_balance(
        &self,
        chain_id: ChainId,
        token: Address,
        _account: Address,
        _id: U256,
    ) -> Result<U256, RouterError> {
        Ok(self.balance(chain_id, token))
    }

    async fn allowance(
        &self,
        _chain_id: ChainId,
        _token: Address,
        _owner: Address,
        _spender: Address,
    ) -> Result<U256, RouterError> {
        Ok(*self.allowance.lock().unwrap())
    }

    async fn estimate_gas(&self, _chain_id: ChainId, _call: &CallRequest) -> Result<u64, RouterError> {
        Ok(APPROVAL_GAS)
    }

    async fn pending_nonce(&self, _chain_id: ChainId, _account: Address) -> Result<u64, RouterError> {
        self.nonce_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PENDING_NONCE)
    }
}

pub struct MockFeeOracle {
    fees: Mutex<SuggestedFees>,
    l1_fee: Mutex<U256>,
    unavailable: Mutex<HashSet<ChainId>>,
    l1_unavailable: Mutex<HashSet<ChainId>>,
}

impl MockFeeOracle {
    pub fn new() -> Self {
        Self {
            fees: Mutex::new(suggested_fees(2)),
            l1_fee: Mutex::new(U256::ZERO),
            unavailable: Mutex::new(HashSet::new()),
            l1_unavailable: Mutex::new(HashSet::new()),
        }
    }

    pub fn set_medium_fee(&self, medium_gwei: u64) {
        *self.fees.lock().unwrap() = suggested_fees(medium_gwei);
    }

    pub fn set_l1_fee(&self, fee: U256) {
        *self.l1_fee.lock().unwrap() = fee;
    }

    pub fn make_unavailable(&self, chain_id: ChainId) {
        self.unavailable.lock().unwrap().insert(chain_id);
    }

    pub fn fail_l1_fee(&self, chain_id: ChainId) {
        self.l1_unavailable.lock().unwrap().insert(chain_id);
    }
}

#[async_trait]
impl FeeOracle for MockFeeOracle {
    async fn suggested_fees(&self, chain_id: ChainId) -> Result<SuggestedFees, RouterError> {
        if self.unavailable.lock().unwrap().contains(&chain_id) {
            return Err(RouterError::Provider("fee history unavailable".into()));
        }
        Ok(self.fees.lock().unwrap().clone())
    }

    async fn transaction_estimated_time(
        &self,
        _chain_id: ChainId,
        _max_fee_per_gas: U256,
        _priority_fee: U256,
    ) -> TransactionEstimation {
        TransactionEstimation::LessThanOneMinute
    }

    async fn l1_fee(&self, chain_id: ChainId, _tx_data: &[u8]) -> Result<U256, RouterError> {
        if self.l1_unavailable.lock().unwrap().contains(&chain_id) {
            return Err(RouterError::Provider("l1 gas oracle unavailable".into()));
        }
        Ok(*self.l1_fee.lock().unwrap())
    }
}

pub struct MockPrices {
    prices: HashMap<String, f64>,
    delay: Option<Duration>,
    failing: bool,
}

impl MockPrices {
    pub fn new() -> Self {
        Self {
            prices: HashMap::from([
                ("ETH".to_string(), ETH_PRICE),
                ("USDC".to_string(), USDC_PRICE),
            ]),
            delay: None,
            failing: false,
        }
    }

    /// Every lookup takes `delay`, to keep a resolution in flight.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl PriceSource for MockPrices {
    async fn prices(
        &self,
        symbols: &[String],
        _currency: &str,
    ) -> Result<HashMap<String, f64>, RouterError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(RouterError::Provider("price api returned 503".into()));
        }
        Ok(symbols
            .iter()
            .filter_map(|s| self.prices.get(s).map(|p| (s.clone(), *p)))
            .collect())
    }
}
