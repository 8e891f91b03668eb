// Amount allocator
// Decides how much each enabled source chain could send: the locked amount,
// the full unlocked remainder, and for plain transfers a greedy split of
// the remainder across the chains' balances
//
// Numan Thabit 2025 Nov

use crate::networks::{ChainId, Network};
use crate::requests::RouteInputParams;
use crate::router::validator::BalanceMap;
use crate::sendtype::SendType;
use alloy_primitives::U256;
use std::collections::BTreeMap;

/// One way a source chain could fund (part of) the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountOption {
    pub amount: U256,
    pub locked: bool,
    /// The chain's whole balance is used, so fees come out of the amount.
    pub subtract_fees: bool,
}

impl AmountOption {
    pub fn unlocked(amount: U256) -> Self {
        Self {
            amount,
            locked: false,
            subtract_fees: false,
        }
    }
}

pub type AmountOptions = BTreeMap<ChainId, Vec<AmountOption>>;

pub fn allocate(input: &RouteInputParams, from_chains: &[Network], balances: &BalanceMap) -> AmountOptions {
    let mut options = AmountOptions::new();

    for chain in from_chains {
        if input.amount_in.is_zero() {
            push_option(&mut options, chain.chain_id, AmountOption::unlocked(U256::ZERO));
            continue;
        }

        let (amount, locked) = match input.from_locked_amount.get(&chain.chain_id) {
            Some(lock) => (*lock, true),
            None => {
                let locked_elsewhere = input
                    .from_locked_amount
                    .values()
                    .fold(U256::ZERO, |acc, v| acc.saturating_add(*v));
                (input.amount_in.saturating_sub(locked_elsewhere), false)
            }
        };
        if amount.is_zero() {
            continue;
        }

        push_option(
            &mut options,
            chain.chain_id,
            AmountOption {
                amount,
                locked,
                subtract_fees: false,
            },
        );
        if locked {
            continue;
        }

        if input.send_type == SendType::Transfer && from_chains.len() > 1 {
            let split = split_across_chains(input, amount, chain, from_chains, balances);
            let allocated = split
                .iter()
                .fold(U256::ZERO, |acc, (_, o)| acc.saturating_add(o.amount));
            if allocated == amount {
                for (chain_id, option) in split {
                    push_option(&mut options, chain_id, option);
                }
            }
        }
    }

    options
}

/// Later duplicates replace earlier ones in place.
fn push_option(options: &mut AmountOptions, chain_id: ChainId, option: AmountOption) {
    let entry = options.entry(chain_id).or_default();
    match entry.iter_mut().find(|o| o.amount == option.amount) {
        Some(existing) => *existing = option,
        None => entry.push(option),
    }
}

/// Greedy walk starting at `processing`, then the other unlocked chains in
/// input order, consuming each chain's token balance.
fn split_across_chains(
    input: &RouteInputParams,
    mut remaining: U256,
    processing: &Network,
    from_chains: &[Network],
    balances: &BalanceMap,
) -> Vec<(ChainId, AmountOption)> {
    let walk = std::iter::once(processing).chain(from_chains.iter().filter(|c| {
        c.chain_id != processing.chain_id && !input.from_locked_amount.contains_key(&c.chain_id)
    }));

    let mut split = Vec::new();
    for chain in walk {
        let Some(balance) = balances.get(&(chain.chain_id, input.token_id.clone())) else {
            continue;
        };
        if balance.is_zero() {
            continue;
        }
        if *balance <= remaining {
            split.push((
                chain.chain_id,
                AmountOption {
                    amount: *balance,
                    locked: false,
                    subtract_fees: true,
                },
            ));
            remaining -= *balance;
        } else if !remaining.is_zero() {
            split.push((chain.chain_id, AmountOption::unlocked(remaining)));
            break;
        }
    }
    split
}
