// Balance validator and fallback policy
// Walks a route against a private copy of the balance snapshot and, for
// transfers and bridges, retries cheaper-first until a funded route is
// found or a least-bad fallback remains
//
// Numan Thabit 2025 Nov

use crate::chain::ChainClient;
use crate::errors::RouterError;
use crate::networks::{ChainId, Network};
use crate::processors::ProcessorKind;
use crate::requests::RouteInputParams;
use crate::router::routes::{Path, Route};
use crate::router::selector::find_best;
use crate::sendtype::SendType;
use crate::token::{Token, TokenCatalog};
use alloy_primitives::{Address, U256};
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

/// `(chain, token symbol) -> available amount`, fetched once per resolution.
pub type BalanceMap = HashMap<(ChainId, String), U256>;

/// Checks `route` against a copy of `balances`. The flag reports whether
/// any leg's source token balance was positive, even when the check fails.
pub fn check_balances(route: &[Path], balances: &BalanceMap) -> (bool, Result<(), RouterError>) {
    let mut remaining = balances.clone();
    let mut has_positive_balance = false;

    for path in route {
        let chain_id = path.from_chain.chain_id;
        let token_key = (chain_id, path.from_token.symbol.clone());
        if remaining.get(&token_key).is_some_and(|b| !b.is_zero()) {
            has_positive_balance = true;
        }

        if path.processor_name == ProcessorKind::Hop && path.tx_bonder_fees > path.amount_out {
            return (has_positive_balance, Err(RouterError::LowAmountInForHopBridge));
        }

        if !path.required_token_balance.is_zero() {
            let Some(balance) = remaining.get_mut(&token_key) else {
                return (has_positive_balance, Err(RouterError::TokenNotFound));
            };
            if *balance < path.required_token_balance {
                return (
                    has_positive_balance,
                    Err(RouterError::NotEnoughTokenBalance {
                        symbol: path.from_token.symbol.clone(),
                        chain_id,
                    }),
                );
            }
            *balance -= path.required_token_balance;
        }

        let native_symbol = &path.from_chain.native_currency_symbol;
        let Some(native) = remaining.get_mut(&(chain_id, native_symbol.clone())) else {
            return (has_positive_balance, Err(RouterError::NativeTokenNotFound));
        };
        if *native < path.required_native_balance {
            return (
                has_positive_balance,
                Err(RouterError::NotEnoughNativeBalance {
                    symbol: native_symbol.clone(),
                    chain_id,
                }),
            );
        }
        *native -= path.required_native_balance;
    }

    (has_positive_balance, Ok(()))
}

/// Drops every route made only of legs that also appear in `failed`.
pub fn remove_failed_routes(routes: &mut Vec<Route>, failed: &[Path]) {
    routes.retain(|route| {
        !route
            .iter()
            .all(|p| failed.iter().any(|f| f.signature() == p.signature()))
    });
}

/// Outcome of selection: the chosen (or fallback) route and, for a
/// fallback, the balance error it failed with.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub best: Route,
    pub error: Option<RouterError>,
}

pub fn select_funded_route(
    mut routes: Vec<Route>,
    send_type: SendType,
    token_price: f64,
    native_token_price: f64,
    balances: &BalanceMap,
) -> Selection {
    let mut fallback: Option<Selection> = None;
    let mut last_failure: Option<Selection> = None;

    while let Some(idx) = find_best(&routes, token_price, native_token_price) {
        let route = routes[idx].clone();
        let (has_positive_balance, result) = check_balances(&route, balances);
        let error = match result {
            Ok(()) => {
                return Selection {
                    best: route,
                    error: None,
                }
            }
            Err(error) => error,
        };

        debug!(code = error.code(), legs = route.len(), "route failed balance check");
        if !send_type.retries_on_balance_failure() {
            return Selection {
                best: route,
                error: Some(error),
            };
        }
        if has_positive_balance {
            fallback = Some(Selection {
                best: route.clone(),
                error: Some(error.clone()),
            });
        }
        remove_failed_routes(&mut routes, &route);
        last_failure = Some(Selection {
            best: route,
            error: Some(error),
        });
    }

    fallback.or(last_failure).unwrap_or_default()
}

async fn source_token_balance(
    chain: &dyn ChainClient,
    send_type: SendType,
    token: &Token,
    account: Address,
) -> Result<U256, RouterError> {
    let chain_id = token.chain_id;
    match (send_type, token.token_id) {
        (SendType::Erc1155Transfer, Some(id)) => {
            chain.erc1155_balance(chain_id, token.address, account, id).await
        }
        // an owner holds exactly one unit of a given id
        (SendType::Erc721Transfer, _) => {
            let owned = chain.token_balance(chain_id, token.address, account).await?;
            Ok(if owned.is_zero() { U256::ZERO } else { U256::from(1u8) })
        }
        _ => chain.balance_of(chain_id, token, account).await,
    }
}

async fn chain_balances(
    chain: &dyn ChainClient,
    tokens: &dyn TokenCatalog,
    input: &RouteInputParams,
    network: &Network,
) -> Result<Vec<((ChainId, String), U256)>, RouterError> {
    let mut entries = Vec::with_capacity(2);
    let token = input
        .send_type
        .find_token(tokens, network, &input.token_id);
    if let Some(token) = token.as_ref().filter(|t| !t.is_native()) {
        let balance = source_token_balance(chain, input.send_type, token, input.addr_from).await?;
        entries.push(((network.chain_id, token.symbol.clone()), balance));
    }
    let native = chain.native_balance(network.chain_id, input.addr_from).await?;
    entries.push(((network.chain_id, network.native_currency_symbol.clone()), native));
    Ok(entries)
}

/// Source token and native balances of the sender on every source chain.
/// Fails only when nothing could be read and at least one lookup failed.
pub async fn load_balances(
    chain: &dyn ChainClient,
    tokens: &dyn TokenCatalog,
    input: &RouteInputParams,
    from_chains: &[Network],
) -> Result<BalanceMap, RouterError> {
    let lookups = from_chains
        .iter()
        .map(|network| chain_balances(chain, tokens, input, network));

    let mut balances = BalanceMap::new();
    let mut failed = false;
    for (network, result) in from_chains.iter().zip(join_all(lookups).await) {
        match result {
            Ok(entries) => balances.extend(entries),
            Err(err) => {
                warn!(chain_id = network.chain_id, error = %err, "balance lookup failed");
                failed = true;
            }
        }
    }

    if balances.is_empty() && failed {
        return Err(RouterError::CannotCheckBalance);
    }
    Ok(balances)
}
