// Route selector - prices routes in a common currency and picks the cheapest
// Cost of a leg is its gas (plus rollup L1 fee) at the native token price
// and its bridge fees at the token price
//
// Numan Thabit 2025 Nov

use crate::router::routes::{Path, Route};
use alloy_primitives::U256;
use tracing::debug;

const WEI_PER_ETH: f64 = 1e18;

/// Lossy conversion, amounts only feed the cost comparison.
pub fn u256_to_f64(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(f64::MAX)
}

pub fn wei_to_eth(value: U256) -> f64 {
    u256_to_f64(value) / WEI_PER_ETH
}

pub fn to_token_units(value: U256, decimals: u8) -> f64 {
    u256_to_f64(value) / 10f64.powi(i32::from(decimals))
}

/// Route cost broken down by fee kind, in the price currency.
#[derive(Debug, Clone, Default, PartialEq, PartialOrd)]
pub struct RouteCost {
    /// Sum of all components
    pub total_cost: f64,
    pub gas_cost: f64,
    pub l1_cost: f64,
    pub bonder_cost: f64,
    pub token_fee_cost: f64,
    pub approval_cost: f64,
}

impl RouteCost {
    pub fn for_path(path: &Path, token_price: f64, native_token_price: f64) -> Self {
        let gas_cost = wei_to_eth(path.tx_fee) * native_token_price;
        let l1_cost = wei_to_eth(path.tx_l1_fee) * native_token_price;
        let decimals = path.from_token.decimals;
        let bonder_cost = to_token_units(path.tx_bonder_fees, decimals) * token_price;
        let token_fee_cost = to_token_units(path.tx_token_fees, decimals) * token_price;
        let approval_cost = if path.approval_required {
            wei_to_eth(path.approval_fee.saturating_add(path.approval_l1_fee)) * native_token_price
        } else {
            0.0
        };
        Self {
            total_cost: gas_cost + l1_cost + bonder_cost + token_fee_cost + approval_cost,
            gas_cost,
            l1_cost,
            bonder_cost,
            token_fee_cost,
            approval_cost,
        }
    }

    pub fn for_route(route: &[Path], token_price: f64, native_token_price: f64) -> Self {
        route
            .iter()
            .map(|p| Self::for_path(p, token_price, native_token_price))
            .fold(Self::default(), |acc, c| Self {
                total_cost: acc.total_cost + c.total_cost,
                gas_cost: acc.gas_cost + c.gas_cost,
                l1_cost: acc.l1_cost + c.l1_cost,
                bonder_cost: acc.bonder_cost + c.bonder_cost,
                token_fee_cost: acc.token_fee_cost + c.token_fee_cost,
                approval_cost: acc.approval_cost + c.approval_cost,
            })
    }
}

/// Index of the cheapest route. Only a strictly lower cost replaces the
/// current pick, so ties keep enumeration order.
pub fn find_best(routes: &[Route], token_price: f64, native_token_price: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, route) in routes.iter().enumerate() {
        let cost = RouteCost::for_route(route, token_price, native_token_price);
        match best {
            Some((_, best_cost)) if cost.total_cost >= best_cost => {}
            _ => best = Some((idx, cost.total_cost)),
        }
    }
    if let Some((idx, cost)) = best {
        debug!(route = idx, cost, candidates = routes.len(), "cheapest route");
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::{Network, ETHEREUM_MAINNET, OPTIMISM_MAINNET};
    use crate::processors::ProcessorKind;
    use crate::token::Token;

    fn path(kind: ProcessorKind, tx_fee: u64, bonder: u64) -> Path {
        let chain = Network::known(ETHEREUM_MAINNET).unwrap();
        let mut p = Path::new(
            "uuid",
            kind,
            chain.clone(),
            Network::known(OPTIMISM_MAINNET).unwrap(),
            Token::native(&chain),
            None,
            U256::from(1u64),
        );
        p.tx_fee = U256::from(tx_fee);
        p.tx_bonder_fees = U256::from(bonder);
        p
    }

    #[test]
    fn costs_use_both_prices() {
        let mut p = path(ProcessorKind::Hop, 1_000_000_000_000_000, 500_000_000_000_000_000);
        p.approval_required = true;
        p.approval_fee = U256::from(1_000_000_000_000_000u64);
        let cost = RouteCost::for_path(&p, 2000.0, 2000.0);
        assert!((cost.gas_cost - 2.0).abs() < 1e-9);
        assert!((cost.bonder_cost - 1000.0).abs() < 1e-9);
        assert!((cost.approval_cost - 2.0).abs() < 1e-9);
        assert!((cost.total_cost - 1004.0).abs() < 1e-9);
    }

    #[test]
    fn approval_fee_ignored_without_approval() {
        let mut p = path(ProcessorKind::Transfer, 0, 0);
        p.approval_fee = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(RouteCost::for_path(&p, 1.0, 1.0).total_cost, 0.0);
    }

    #[test]
    fn cheapest_wins_and_ties_keep_first() {
        let routes = vec![
            vec![path(ProcessorKind::Hop, 10, 0)],
            vec![path(ProcessorKind::Transfer, 5, 0)],
            vec![path(ProcessorKind::Transfer, 5, 0)],
        ];
        assert_eq!(find_best(&routes, 1.0, 1.0), Some(1));
        assert_eq!(find_best(&routes, 1.0, 1.0), Some(1));
        assert_eq!(find_best(&[], 1.0, 1.0), None);
    }

    #[test]
    fn token_units_follow_decimals() {
        assert_eq!(to_token_units(U256::from(1_500_000u64), 6), 1.5);
        assert_eq!(wei_to_eth(U256::from(10u64).pow(U256::from(18u64))), 1.0);
    }
}
