// Nonce and fee resolver
// Applies a fee level (or the user's custom parameters) to a path, derives
// every fee and required balance from it, and hands out per-chain nonces
//
// Numan Thabit 2025 Nov

use crate::chain::ChainClient;
use crate::errors::RouterError;
use crate::fees::{FeeOracle, GasFeeMode, SuggestedFees, TransactionEstimation};
use crate::networks::ChainId;
use crate::requests::PathTxCustomParams;
use crate::router::routes::Path;
use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Nonces handed out so far in one pass over a route.
#[derive(Debug, Default)]
pub struct NonceTracker {
    used: HashMap<ChainId, u64>,
}

impl NonceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// One past the last nonce used on the chain, or the account's pending
    /// nonce the first time the chain is seen.
    pub async fn next(
        &mut self,
        chain: &dyn ChainClient,
        chain_id: ChainId,
        account: Address,
    ) -> Result<u64, RouterError> {
        let nonce = match self.used.get(&chain_id) {
            Some(last) => last + 1,
            None => chain.pending_nonce(chain_id, account).await?,
        };
        self.used.insert(chain_id, nonce);
        Ok(nonce)
    }

    pub fn reserve(&mut self, chain_id: ChainId, nonce: u64) {
        self.used.insert(chain_id, nonce);
    }
}

#[derive(Debug, Clone, Copy)]
struct TxFeeParams {
    mode: GasFeeMode,
    max_fee: U256,
    priority_fee: U256,
    base_fee: U256,
    estimated_time: TransactionEstimation,
    gas: Option<u64>,
    nonce: Option<u64>,
}

#[derive(Clone)]
pub struct PathPricer {
    fee_oracle: Arc<dyn FeeOracle>,
    chain: Arc<dyn ChainClient>,
}

impl PathPricer {
    pub fn new(fee_oracle: Arc<dyn FeeOracle>, chain: Arc<dyn ChainClient>) -> Self {
        Self { fee_oracle, chain }
    }

    async fn resolve(
        &self,
        chain_id: ChainId,
        fees: &SuggestedFees,
        default_mode: GasFeeMode,
        custom: Option<&PathTxCustomParams>,
    ) -> Result<TxFeeParams, RouterError> {
        if let Some(params) = custom.filter(|c| c.gas_fee_mode == GasFeeMode::Custom) {
            let max_fee = params.max_fees_per_gas.ok_or(RouterError::MaxFeesPerGasRequired)?;
            let priority_fee = params.priority_fee.ok_or(RouterError::PriorityFeeRequired)?;
            let estimated_time = self
                .fee_oracle
                .transaction_estimated_time(chain_id, max_fee, priority_fee)
                .await;
            return Ok(TxFeeParams {
                mode: GasFeeMode::Custom,
                max_fee,
                priority_fee,
                base_fee: max_fee.saturating_sub(priority_fee),
                estimated_time,
                gas: (params.gas_amount > 0).then_some(params.gas_amount),
                nonce: Some(params.nonce),
            });
        }

        let mode = custom.map(|c| c.gas_fee_mode).unwrap_or(default_mode);
        let (max_fee, priority_fee, estimated_time) = fees.fee_for(mode)?;
        Ok(TxFeeParams {
            mode,
            max_fee,
            priority_fee,
            base_fee: max_fee.saturating_sub(priority_fee),
            estimated_time,
            gas: None,
            nonce: None,
        })
    }

    async fn l1_fee(&self, chain_id: ChainId, data: &[u8]) -> Result<U256, RouterError> {
        self.fee_oracle
            .l1_fee(chain_id, data)
            .await
            .inspect_err(|err| warn!(chain_id, error = %err, "l1 fee lookup failed"))
    }

    /// Re-prices `path` in place. Nonces are assigned only when a tracker is
    /// given.
    pub async fn apply_fees(
        &self,
        path: &mut Path,
        fees: &SuggestedFees,
        default_mode: GasFeeMode,
        custom: &HashMap<String, PathTxCustomParams>,
        nonces: Option<&mut NonceTracker>,
        account: Address,
    ) -> Result<(), RouterError> {
        let chain_id = path.from_chain.chain_id;
        path.suggested_levels_for_max_fees_per_gas = fees.max_fees_levels.clone();
        path.suggested_min_priority_fee = fees.max_priority_fee_suggested_bounds.lower;
        path.suggested_max_priority_fee = fees.max_priority_fee_suggested_bounds.upper;
        path.current_base_fee = fees.current_base_fee;

        let tx = self
            .resolve(chain_id, fees, default_mode, custom.get(&path.tx_identity_key(false)))
            .await?;
        path.tx_gas_fee_mode = tx.mode;
        path.tx_max_fees_per_gas = tx.max_fee;
        path.tx_priority_fee = tx.priority_fee;
        path.tx_base_fee = tx.base_fee;
        path.tx_gas_amount = tx.gas.unwrap_or(path.suggested_tx_gas_amount);
        path.tx_estimated_time = if path.approval_required {
            tx.estimated_time.bumped()
        } else {
            tx.estimated_time
        };
        path.tx_fee = tx.max_fee.saturating_mul(U256::from(path.tx_gas_amount));

        let has_l1_fee = path.from_chain.has_l1_data_fee();
        path.tx_l1_fee = if has_l1_fee {
            self.l1_fee(chain_id, &path.tx_packed_data).await?
        } else {
            U256::ZERO
        };

        let mut approval_nonce = None;
        if path.approval_required {
            let approval = self
                .resolve(chain_id, fees, default_mode, custom.get(&path.tx_identity_key(true)))
                .await?;
            path.approval_gas_fee_mode = approval.mode;
            path.approval_max_fees_per_gas = approval.max_fee;
            path.approval_priority_fee = approval.priority_fee;
            path.approval_base_fee = approval.base_fee;
            path.approval_gas_amount = approval.gas.unwrap_or(path.suggested_approval_gas_amount);
            path.approval_estimated_time = approval.estimated_time;
            path.approval_fee = approval
                .max_fee
                .saturating_mul(U256::from(path.approval_gas_amount));
            path.approval_l1_fee = if has_l1_fee {
                self.l1_fee(chain_id, &path.approval_packed_data).await?
            } else {
                U256::ZERO
            };
            approval_nonce = approval.nonce;
        } else {
            path.approval_fee = U256::ZERO;
            path.approval_l1_fee = U256::ZERO;
        }

        path.tx_total_fee = path
            .tx_fee
            .saturating_add(path.tx_l1_fee)
            .saturating_add(path.approval_fee)
            .saturating_add(path.approval_l1_fee);

        if path.from_token.is_native() {
            path.required_token_balance = U256::ZERO;
            path.required_native_balance = if path.subtract_fees {
                path.amount_in
            } else {
                path.amount_in.saturating_add(path.tx_total_fee)
            };
        } else {
            path.required_token_balance = path.amount_in;
            path.required_native_balance = path.tx_total_fee;
        }

        if let Some(tracker) = nonces {
            self.set_nonces(path, tracker, account, approval_nonce, tx.nonce)
                .await?;
        }
        Ok(())
    }

    /// Assigns nonces to an already priced path, approval first. Custom
    /// params in Custom mode pin the nonce.
    pub async fn assign_nonces(
        &self,
        path: &mut Path,
        custom: &HashMap<String, PathTxCustomParams>,
        tracker: &mut NonceTracker,
        account: Address,
    ) -> Result<(), RouterError> {
        let pinned = |approval: bool| {
            custom
                .get(&path.tx_identity_key(approval))
                .filter(|c| c.gas_fee_mode == GasFeeMode::Custom)
                .map(|c| c.nonce)
        };
        let (approval_nonce, tx_nonce) = (pinned(true), pinned(false));
        self.set_nonces(path, tracker, account, approval_nonce, tx_nonce)
            .await
    }

    async fn set_nonces(
        &self,
        path: &mut Path,
        tracker: &mut NonceTracker,
        account: Address,
        approval_nonce: Option<u64>,
        tx_nonce: Option<u64>,
    ) -> Result<(), RouterError> {
        let chain_id = path.from_chain.chain_id;
        if path.approval_required {
            let nonce = self.take_nonce(tracker, chain_id, account, approval_nonce).await?;
            path.approval_tx_nonce = Some(nonce);
            path.suggested_approval_tx_nonce = Some(nonce);
        }
        let nonce = self.take_nonce(tracker, chain_id, account, tx_nonce).await?;
        path.tx_nonce = Some(nonce);
        path.suggested_tx_nonce = Some(nonce);
        Ok(())
    }

    async fn take_nonce(
        &self,
        tracker: &mut NonceTracker,
        chain_id: ChainId,
        account: Address,
        custom: Option<u64>,
    ) -> Result<u64, RouterError> {
        match custom {
            Some(nonce) => {
                tracker.reserve(chain_id, nonce);
                Ok(nonce)
            }
            None => tracker.next(self.chain.as_ref(), chain_id, account).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::CallRequest;
    use crate::fees::MaxFeesLevels;
    use crate::networks::{Network, ETHEREUM_MAINNET, OPTIMISM_MAINNET};
    use crate::processors::ProcessorKind;
    use crate::token::Token;
    use async_trait::async_trait;

    const GWEI: u64 = 1_000_000_000;

    struct Oracle {
        l1_fee: Option<u64>,
    }

    #[async_trait]
    impl FeeOracle for Oracle {
        async fn suggested_fees(&self, _chain_id: ChainId) -> Result<SuggestedFees, RouterError> {
            Ok(fees())
        }

        async fn transaction_estimated_time(
            &self,
            _chain_id: ChainId,
            _max_fee_per_gas: U256,
            _priority_fee: U256,
        ) -> TransactionEstimation {
            TransactionEstimation::MoreThanFiveMinutes
        }

        async fn l1_fee(&self, _chain_id: ChainId, _tx_data: &[u8]) -> Result<U256, RouterError> {
            self.l1_fee
                .map(U256::from)
                .ok_or_else(|| RouterError::Provider("l1 gas oracle reverted".into()))
        }
    }

    struct Chain;

    #[async_trait]
    impl ChainClient for Chain {
        async fn block_number(&self, _: ChainId) -> Result<u64, RouterError> {
            Ok(1)
        }
        async fn native_balance(&self, _: ChainId, _: Address) -> Result<U256, RouterError> {
            Ok(U256::ZERO)
        }
        async fn token_balance(&self, _: ChainId, _: Address, _: Address) -> Result<U256, RouterError> {
            Ok(U256::ZERO)
        }
        async fn erc1155_balance(
            &self,
            _: ChainId,
            _: Address,
            _: Address,
            _: U256,
        ) -> Result<U256, RouterError> {
            Ok(U256::ZERO)
        }
        async fn allowance(
            &self,
            _: ChainId,
            _: Address,
            _: Address,
            _: Address,
        ) -> Result<U256, RouterError> {
            Ok(U256::ZERO)
        }
        async fn estimate_gas(&self, _: ChainId, _: &CallRequest) -> Result<u64, RouterError> {
            Ok(21_000)
        }
        async fn pending_nonce(&self, _: ChainId, _: Address) -> Result<u64, RouterError> {
            Ok(40)
        }
    }

    fn fees() -> SuggestedFees {
        SuggestedFees {
            max_fees_levels: MaxFeesLevels {
                low: U256::from(GWEI),
                medium: U256::from(2 * GWEI),
                medium_priority: U256::from(GWEI / 2),
                medium_estimated_time: TransactionEstimation::LessThanOneMinute,
                high: U256::from(3 * GWEI),
                ..Default::default()
            },
            eip1559_enabled: true,
            ..Default::default()
        }
    }

    fn pricer() -> PathPricer {
        PathPricer::new(Arc::new(Oracle { l1_fee: Some(7) }), Arc::new(Chain))
    }

    fn path(chain_id: ChainId, native: bool) -> Path {
        let chain = Network::known(chain_id).unwrap();
        let token = if native {
            Token::native(&chain)
        } else {
            Token {
                address: Address::with_last_byte(0xcc),
                name: "USD Coin".into(),
                symbol: "USDC".into(),
                decimals: 6,
                chain_id,
                token_id: None,
            }
        };
        let mut p = Path::new("uuid", ProcessorKind::Transfer, chain.clone(), chain, token, None, U256::from(1_000u64));
        p.suggested_tx_gas_amount = 1000;
        p.suggested_approval_gas_amount = 500;
        p
    }

    #[tokio::test]
    async fn native_path_adds_fees_to_required_native() {
        let mut p = path(ETHEREUM_MAINNET, true);
        pricer()
            .apply_fees(&mut p, &fees(), GasFeeMode::Medium, &HashMap::new(), None, Address::ZERO)
            .await
            .unwrap();
        assert_eq!(p.tx_fee, U256::from(2_000 * GWEI));
        assert_eq!(p.tx_base_fee, U256::from(2 * GWEI - GWEI / 2));
        assert_eq!(p.tx_l1_fee, U256::ZERO);
        assert_eq!(p.required_native_balance, U256::from(1_000 + 2_000 * GWEI));
        assert_eq!(p.tx_nonce, None);
    }

    #[tokio::test]
    async fn rollup_token_path_with_approval() {
        let mut p = path(OPTIMISM_MAINNET, false);
        p.approval_required = true;
        let mut nonces = NonceTracker::new();
        pricer()
            .apply_fees(&mut p, &fees(), GasFeeMode::Low, &HashMap::new(), Some(&mut nonces), Address::ZERO)
            .await
            .unwrap();
        assert_eq!(p.tx_fee, U256::from(1_000 * GWEI));
        assert_eq!(p.approval_fee, U256::from(500 * GWEI));
        assert_eq!(p.tx_l1_fee, U256::from(7u64));
        assert_eq!(p.approval_l1_fee, U256::from(7u64));
        assert_eq!(p.tx_total_fee, U256::from(1_500 * GWEI + 14));
        assert_eq!(p.required_token_balance, U256::from(1_000u64));
        assert_eq!(p.required_native_balance, p.tx_total_fee);
        assert_eq!(p.approval_tx_nonce, Some(40));
        assert_eq!(p.tx_nonce, Some(41));
        assert_eq!(p.tx_estimated_time, TransactionEstimation::LessThanOneMinute);
    }

    #[tokio::test]
    async fn l1_fee_failure_fails_the_rollup_path() {
        let pricer = PathPricer::new(Arc::new(Oracle { l1_fee: None }), Arc::new(Chain));
        let mut p = path(OPTIMISM_MAINNET, true);
        let err = pricer
            .apply_fees(&mut p, &fees(), GasFeeMode::Medium, &HashMap::new(), None, Address::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "WRT-002");

        // mainnet has no data fee, so the oracle is never asked
        let mut p = path(ETHEREUM_MAINNET, true);
        pricer
            .apply_fees(&mut p, &fees(), GasFeeMode::Medium, &HashMap::new(), None, Address::ZERO)
            .await
            .unwrap();
        assert_eq!(p.tx_l1_fee, U256::ZERO);
    }

    #[tokio::test]
    async fn custom_params_are_used_verbatim() {
        let mut p = path(ETHEREUM_MAINNET, true);
        p.subtract_fees = true;
        let custom = HashMap::from([(
            p.tx_identity_key(false),
            PathTxCustomParams {
                gas_fee_mode: GasFeeMode::Custom,
                nonce: 9,
                gas_amount: 30_000,
                max_fees_per_gas: Some(U256::from(5 * GWEI)),
                priority_fee: Some(U256::from(GWEI)),
            },
        )]);
        let mut nonces = NonceTracker::new();
        pricer()
            .apply_fees(&mut p, &fees(), GasFeeMode::Medium, &custom, Some(&mut nonces), Address::ZERO)
            .await
            .unwrap();
        assert_eq!(p.tx_gas_fee_mode, GasFeeMode::Custom);
        assert_eq!(p.tx_gas_amount, 30_000);
        assert_eq!(p.tx_base_fee, U256::from(4 * GWEI));
        assert_eq!(p.tx_estimated_time, TransactionEstimation::MoreThanFiveMinutes);
        assert_eq!(p.tx_nonce, Some(9));
        assert_eq!(p.required_native_balance, U256::from(1_000u64));

        // the next tx on the chain follows the custom nonce
        let next = nonces.next(&Chain, ETHEREUM_MAINNET, Address::ZERO).await.unwrap();
        assert_eq!(next, 10);
    }

    #[tokio::test]
    async fn nonces_follow_each_other_on_one_chain() {
        let mut first = path(ETHEREUM_MAINNET, false);
        first.approval_required = true;
        let mut second = path(ETHEREUM_MAINNET, true);
        second.processor_name = ProcessorKind::Hop;
        let mut nonces = NonceTracker::new();
        let p = pricer();
        p.assign_nonces(&mut first, &HashMap::new(), &mut nonces, Address::ZERO)
            .await
            .unwrap();
        p.assign_nonces(&mut second, &HashMap::new(), &mut nonces, Address::ZERO)
            .await
            .unwrap();
        assert_eq!(first.approval_tx_nonce, Some(40));
        assert_eq!(first.tx_nonce, Some(41));
        assert_eq!(second.approval_tx_nonce, None);
        assert_eq!(second.tx_nonce, Some(42));
    }

    #[tokio::test]
    async fn custom_mode_without_custom_params_fails() {
        let mut p = path(ETHEREUM_MAINNET, true);
        let err = pricer()
            .apply_fees(&mut p, &fees(), GasFeeMode::Custom, &HashMap::new(), None, Address::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err, RouterError::CustomFeeModeNotAvailableInSuggestedFees);
    }
}
