// Gas fee levels and inclusion-time estimation
// This file defines fee modes, the suggested fee levels a chain offers,
// the fee oracle contract, and the fee-history math behind it
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use crate::networks::ChainId;
use alloy_primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};

const INCLUSION_THRESHOLD: f64 = 0.95;
/// Priority fee used when the chain returns no reward data (2 gwei).
const FALLBACK_PRIORITY_FEE: u64 = 2_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasFeeMode {
    Low,
    #[default]
    Medium,
    High,
    Custom,
}

/// Expected inclusion time bucket. Serialized as its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TransactionEstimation {
    #[default]
    Unknown = 0,
    LessThanOneMinute = 1,
    LessThanThreeMinutes = 2,
    LessThanFiveMinutes = 3,
    MoreThanFiveMinutes = 4,
}

impl TransactionEstimation {
    /// One bucket slower; an approval tx has to land first.
    pub fn bumped(self) -> Self {
        match self {
            TransactionEstimation::Unknown => TransactionEstimation::LessThanOneMinute,
            TransactionEstimation::LessThanOneMinute => TransactionEstimation::LessThanThreeMinutes,
            TransactionEstimation::LessThanThreeMinutes => TransactionEstimation::LessThanFiveMinutes,
            _ => TransactionEstimation::MoreThanFiveMinutes,
        }
    }
}

impl Serialize for TransactionEstimation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Priced fee levels: max fee, priority fee and inclusion time per level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxFeesLevels {
    pub low: U256,
    pub low_priority: U256,
    pub low_estimated_time: TransactionEstimation,
    pub medium: U256,
    pub medium_priority: U256,
    pub medium_estimated_time: TransactionEstimation,
    pub high: U256,
    pub high_priority: U256,
    pub high_estimated_time: TransactionEstimation,
}

impl MaxFeesLevels {
    pub fn fee_for(
        &self,
        mode: GasFeeMode,
    ) -> Result<(U256, U256, TransactionEstimation), RouterError> {
        match mode {
            GasFeeMode::Low => Ok((self.low, self.low_priority, self.low_estimated_time)),
            GasFeeMode::Medium => Ok((self.medium, self.medium_priority, self.medium_estimated_time)),
            GasFeeMode::High => Ok((self.high, self.high_priority, self.high_estimated_time)),
            GasFeeMode::Custom => Err(RouterError::CustomFeeModeNotAvailableInSuggestedFees),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaxPriorityFeesSuggestedBounds {
    pub lower: U256,
    pub upper: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedFees {
    pub gas_price: U256,
    pub base_fee: U256,
    /// Base fee of the latest block, unscaled.
    pub current_base_fee: U256,
    pub max_fees_levels: MaxFeesLevels,
    pub max_priority_fee_per_gas: U256,
    pub max_priority_fee_suggested_bounds: MaxPriorityFeesSuggestedBounds,
    pub eip1559_enabled: bool,
}

impl SuggestedFees {
    pub fn fee_for(
        &self,
        mode: GasFeeMode,
    ) -> Result<(U256, U256, TransactionEstimation), RouterError> {
        self.max_fees_levels.fee_for(mode)
    }

    /// Chains without EIP-1559 price every level at the legacy gas price.
    pub fn legacy(gas_price: U256) -> Self {
        Self {
            gas_price,
            max_fees_levels: MaxFeesLevels {
                low: gas_price,
                medium: gas_price,
                high: gas_price,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// `eth_feeHistory` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeHistory {
    #[serde(default)]
    pub base_fee_per_gas: Vec<U256>,
    #[serde(default)]
    pub gas_used_ratio: Vec<f64>,
    #[serde(default)]
    pub oldest_block: Option<U256>,
    #[serde(default)]
    pub reward: Vec<Vec<U256>>,
}

impl FeeHistory {
    pub fn is_eip1559_compatible(&self) -> bool {
        self.base_fee_per_gas.iter().any(|fee| !fee.is_zero())
    }
}

#[async_trait]
pub trait FeeOracle: Send + Sync {
    async fn suggested_fees(&self, chain_id: ChainId) -> Result<SuggestedFees, RouterError>;

    /// Never fails; an unknown estimate is a valid answer.
    async fn transaction_estimated_time(
        &self,
        chain_id: ChainId,
        max_fee_per_gas: U256,
        priority_fee: U256,
    ) -> TransactionEstimation;

    /// Extra fee a rollup charges for posting `tx_data` to L1.
    async fn l1_fee(&self, chain_id: ChainId, tx_data: &[u8]) -> Result<U256, RouterError>;
}

/// Probability that `max_fee_per_gas` clears the base fee of a block, taken
/// from where it ranks among recent base fees, compounded over 4, 12 and 20
/// blocks.
pub fn estimated_time(history: &FeeHistory, max_fee_per_gas: U256) -> TransactionEstimation {
    let mut fees = history.base_fee_per_gas.clone();
    if fees.is_empty() {
        return TransactionEstimation::Unknown;
    }
    fees.sort();

    let len = fees.len();
    let idx = fees
        .iter()
        .position(|fee| *fee > max_fee_per_gas)
        .unwrap_or(len - 1);
    let p_event = idx as f64 / len as f64;

    let within = |blocks: i32| 1.0 - (1.0 - p_event).powi(blocks);
    if within(4) >= INCLUSION_THRESHOLD {
        TransactionEstimation::LessThanOneMinute
    } else if within(12) >= INCLUSION_THRESHOLD {
        TransactionEstimation::LessThanThreeMinutes
    } else if within(20) >= INCLUSION_THRESHOLD {
        TransactionEstimation::LessThanFiveMinutes
    } else {
        TransactionEstimation::MoreThanFiveMinutes
    }
}

/// Suggested EIP-1559 fees from a fee history requested with the
/// 25/50/75 reward percentiles.
pub fn suggested_fees_from_history(history: &FeeHistory) -> Result<SuggestedFees, RouterError> {
    if !history.is_eip1559_compatible() {
        return Err(RouterError::Eip1559IncompatibleChain);
    }
    let pending_base_fee = history
        .base_fee_per_gas
        .last()
        .copied()
        .ok_or(RouterError::Eip1559IncompatibleChain)?;
    // pending base fee scaled by 1.33
    let base_fee = pending_base_fee * U256::from(133u64) / U256::from(100u64);

    let (low, avg, high) = priority_fees(&history.reward)?;

    let mut levels = MaxFeesLevels {
        low: base_fee + low,
        low_priority: low,
        medium: base_fee * U256::from(2u64) + avg,
        medium_priority: avg,
        high: base_fee * U256::from(3u64) + high,
        high_priority: high,
        ..Default::default()
    };
    levels.low_estimated_time = estimated_time(history, levels.low);
    levels.medium_estimated_time = estimated_time(history, levels.medium);
    levels.high_estimated_time = estimated_time(history, levels.high);

    Ok(SuggestedFees {
        gas_price: U256::ZERO,
        base_fee,
        current_base_fee: pending_base_fee,
        max_fees_levels: levels,
        max_priority_fee_per_gas: avg,
        max_priority_fee_suggested_bounds: MaxPriorityFeesSuggestedBounds {
            lower: low,
            upper: high,
        },
        eip1559_enabled: true,
    })
}

fn priority_fees(reward: &[Vec<U256>]) -> Result<(U256, U256, U256), RouterError> {
    let fallback = U256::from(FALLBACK_PRIORITY_FEE);
    if reward.is_empty() {
        return Ok((fallback, fallback, fallback));
    }
    if reward.iter().any(|r| r.len() != 3) {
        return Err(RouterError::InvalidRewardData);
    }

    let column = |i: usize| {
        let mut fees: Vec<U256> = reward.iter().map(|r| r[i]).collect();
        fees.sort();
        fees
    };
    let (lows, avgs, highs) = (column(0), column(1), column(2));
    let percentile = |fees: &[U256]| (fees.len() as f64 * 0.4) as usize;

    let avg = avgs[percentile(&avgs)];

    let mut low_idx = percentile(&lows);
    let mut low = lows[low_idx];
    while low_idx > 0 && low == avg {
        low_idx -= 1;
        low = lows[low_idx];
    }

    let mut high_idx = percentile(&highs);
    let mut high = highs[high_idx];
    while high_idx + 1 < highs.len() && high == avg {
        high_idx += 1;
        high = highs[high_idx];
    }

    Ok((low, avg, high))
}
