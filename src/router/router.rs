// Router instance
// Ties the resolution pipeline together: validation, chain selection,
// balances, allocation, candidates, enumeration, selection and nonces.
// Owns the active route, the background resolution slot and the watchers
//
// Numan Thabit 2025 Nov

use crate::chain::{ChainClient, PriceSource};
use crate::errors::{ProcessorError, ResolveFailure, RouterError};
use crate::events::EventBus;
use crate::fees::{FeeOracle, GasFeeMode};
use crate::metrics::{RESOLVE_FAILURES, RESOLVE_LATENCY};
use crate::networks::{chain_priority, ChainId, Network};
use crate::processors::PathProcessor;
use crate::requests::{PathTxCustomParams, PathTxIdentity, RouteInputParams};
use crate::router::allocator::allocate;
use crate::router::candidates::CandidateGenerator;
use crate::router::graph::enumerate;
use crate::router::pricing::{NonceTracker, PathPricer};
use crate::router::routes::{Route, SuggestedRoutes, SuggestedRoutesResponse};
use crate::router::updates::{ActiveRoute, SharedActiveRoute, UpdateContext, UpdateWatchers};
use crate::router::validator::{check_balances, load_balances, select_funded_route, BalanceMap};
use crate::token::TokenCatalog;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub const NATIVE_PRICE_SYMBOL: &str = "ETH";
pub const PRICE_CURRENCY: &str = "usd";

/// External collaborators a router is built from.
pub struct RouterDeps {
    pub chain: Arc<dyn ChainClient>,
    pub fee_oracle: Arc<dyn FeeOracle>,
    pub prices: Arc<dyn PriceSource>,
    pub tokens: Arc<dyn TokenCatalog>,
    pub processors: Vec<Arc<dyn PathProcessor>>,
    /// Every network the router may use, mainnets and testnets alike.
    pub networks: Vec<Network>,
}

#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub testnet_mode: bool,
    /// Always add an approval tx for ERC20 sends through a spender contract.
    pub force_approval: bool,
    pub event_buffer: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            testnet_mode: false,
            force_approval: false,
            event_buffer: 256,
        }
    }
}

struct BackgroundTask {
    uuid: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Router {
    settings: RouterSettings,
    networks: Vec<Network>,
    chain: Arc<dyn ChainClient>,
    fee_oracle: Arc<dyn FeeOracle>,
    prices: Arc<dyn PriceSource>,
    tokens: Arc<dyn TokenCatalog>,
    generator: CandidateGenerator,
    pricer: PathPricer,
    active: SharedActiveRoute,
    watchers: UpdateWatchers,
    events: EventBus,
    background: std::sync::Mutex<Option<BackgroundTask>>,
    /// Bumped by every resolution; only the latest one may commit.
    generation: AtomicU64,
}

impl Router {
    pub fn new(deps: RouterDeps, settings: RouterSettings) -> Self {
        let RouterDeps {
            chain,
            fee_oracle,
            prices,
            tokens,
            processors,
            networks,
        } = deps;

        let pricer = PathPricer::new(fee_oracle.clone(), chain.clone());
        let generator = CandidateGenerator::new(
            processors,
            chain.clone(),
            fee_oracle.clone(),
            tokens.clone(),
            settings.force_approval,
        );
        let events = EventBus::new(settings.event_buffer);
        let active: SharedActiveRoute = Arc::new(Mutex::new(None));
        let watchers = UpdateWatchers::new(UpdateContext {
            active: active.clone(),
            chain: chain.clone(),
            fee_oracle: fee_oracle.clone(),
            pricer: pricer.clone(),
            events: events.clone(),
        });

        Self {
            settings,
            networks,
            chain,
            fee_oracle,
            prices,
            tokens,
            generator,
            pricer,
            active,
            watchers,
            events,
            background: std::sync::Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SuggestedRoutesResponse> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Chains currently watched for live updates.
    pub fn watched_chains(&self) -> Vec<ChainId> {
        self.watchers.watching()
    }

    /// Resolves the cheapest funded route for `input`. A background
    /// resolution still running is cancelled first.
    pub async fn resolve(&self, input: RouteInputParams) -> Result<SuggestedRoutes, ResolveFailure> {
        if let Some(task) = self.take_background() {
            task.cancel.cancel();
            debug!(uuid = %task.uuid, "background resolution replaced by direct request");
        }
        self.run(input).await
    }

    #[instrument(skip_all, fields(uuid = %input.uuid, send_type = input.send_type.name()))]
    async fn run(&self, input: RouteInputParams) -> Result<SuggestedRoutes, ResolveFailure> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let timer = RESOLVE_LATENCY
            .with_label_values(&[input.send_type.name()])
            .start_timer();
        let result = self.resolve_routes(input, generation).await;
        timer.observe_duration();

        match &result {
            Ok(routes) => info!(
                legs = routes.best.len(),
                candidates = routes.candidates.len(),
                "route resolved"
            ),
            Err(failure) => {
                RESOLVE_FAILURES
                    .with_label_values(&[failure.error.code()])
                    .inc();
                warn!(code = failure.error.code(), error = %failure.error, "route resolution failed");
            }
        }
        result
    }

    async fn resolve_routes(
        &self,
        input: RouteInputParams,
        generation: u64,
    ) -> Result<SuggestedRoutes, ResolveFailure> {
        input.validate(self.settings.testnet_mode)?;

        let (from_chains, to_chains) = self.selected_chains(&input);
        debug!(from = from_chains.len(), to = to_chains.len(), "chains selected");

        let balances =
            load_balances(self.chain.as_ref(), self.tokens.as_ref(), &input, &from_chains).await?;
        let options = allocate(&input, &from_chains, &balances);
        let candidates = self
            .generator
            .generate(&input, &from_chains, &to_chains, &options)
            .await;

        let (token_price, native_token_price) = match self.fetch_prices(&input).await {
            Ok(prices) => prices,
            Err(error) => {
                let routes = SuggestedRoutes::new(&input.uuid, candidates.paths, 0.0, 0.0);
                return Err(ResolveFailure::with_routes(error, routes));
            }
        };
        let mut routes =
            SuggestedRoutes::new(&input.uuid, candidates.paths, token_price, native_token_price);

        let all = enumerate(input.amount_in, &routes.candidates, &input.from_locked_amount);
        debug!(routes = all.len(), "routes enumerated");

        let selection = select_funded_route(
            all,
            input.send_type,
            token_price,
            native_token_price,
            &balances,
        );
        if selection.best.is_empty() {
            let error = selection
                .error
                .unwrap_or_else(|| no_route_error(&candidates.errors));
            return Err(ResolveFailure::with_routes(error, routes));
        }

        let mut best = selection.best;
        subtract_fees(&mut best);
        let mut nonces = NonceTracker::new();
        for path in best.iter_mut() {
            if let Err(error) = self
                .pricer
                .assign_nonces(path, &input.path_tx_custom_params, &mut nonces, input.addr_from)
                .await
            {
                return Err(ResolveFailure::with_routes(error, routes));
            }
        }
        best.sort_by_key(|p| chain_priority(p.from_chain.chain_id));
        routes.best = best;

        self.commit(generation, input, routes.clone(), balances).await;

        match selection.error {
            Some(error) => Err(ResolveFailure::with_routes(error, routes)),
            None => Ok(routes),
        }
    }

    fn selected_chains(&self, input: &RouteInputParams) -> (Vec<Network>, Vec<Network>) {
        let mut from = Vec::new();
        let mut to = Vec::new();
        for network in self
            .networks
            .iter()
            .filter(|n| n.is_test == self.settings.testnet_mode)
        {
            if !input.disabled_from_chain_ids.contains(&network.chain_id) {
                from.push(network.clone());
            }
            if !input.disabled_to_chain_ids.contains(&network.chain_id) {
                to.push(network.clone());
            }
        }
        (from, to)
    }

    async fn fetch_prices(&self, input: &RouteInputParams) -> Result<(f64, f64), RouterError> {
        if !input.send_type.fetch_prices() {
            return Ok((0.0, 0.0));
        }
        let mut symbols = vec![input.token_id.clone()];
        if input.token_id != NATIVE_PRICE_SYMBOL {
            symbols.push(NATIVE_PRICE_SYMBOL.to_string());
        }
        let prices = self.prices.prices(&symbols, PRICE_CURRENCY).await?;
        let token_price = prices.get(&input.token_id).copied().unwrap_or_default();
        let native_price = prices.get(NATIVE_PRICE_SYMBOL).copied().unwrap_or_default();
        Ok((token_price, native_price))
    }

    /// Replaces the active route and points the watchers at its chains,
    /// unless a newer resolution has started since `generation`.
    async fn commit(
        &self,
        generation: u64,
        input: RouteInputParams,
        routes: SuggestedRoutes,
        balances: BalanceMap,
    ) {
        let chains: BTreeSet<ChainId> = routes
            .best
            .iter()
            .map(|p| p.from_chain.chain_id)
            .collect();
        {
            let mut active = self.active.lock().await;
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!(uuid = %input.uuid, "newer resolution started, result not committed");
                return;
            }
            *active = Some(ActiveRoute {
                input,
                routes,
                balances,
            });
        }

        for watched in self.watchers.watching() {
            if !chains.contains(&watched) {
                self.watchers.unsubscribe(watched);
            }
        }
        for chain_id in chains {
            self.watchers.subscribe(chain_id);
        }
    }

    /// Starts resolving in the background, cancelling any resolution still
    /// running. The result is published on the event channel.
    pub fn resolve_async(self: &Arc<Self>, input: RouteInputParams) -> String {
        let uuid = input.uuid.clone();
        let cancel = CancellationToken::new();
        let router = Arc::clone(self);
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let uuid = input.uuid.clone();
            // a task cancelled before its first poll never starts resolving
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(uuid = %uuid, "background resolution cancelled");
                    return;
                }
                result = router.run(input) => result,
            };
            let event = match &result {
                Ok(routes) => SuggestedRoutesResponse::new(&uuid, Some(routes), None),
                Err(failure) => {
                    SuggestedRoutesResponse::new(&uuid, failure.routes.as_deref(), Some(&failure.error))
                }
            };
            router.events.publish(event).await;
        });

        let previous = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(BackgroundTask {
                uuid: uuid.clone(),
                cancel,
                handle,
            });
        if let Some(task) = previous {
            debug!(uuid = %task.uuid, "replacing background resolution");
            task.cancel.cancel();
        }
        uuid
    }

    fn take_background(&self) -> Option<BackgroundTask> {
        self.background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Cancels the background resolution, if any. Returns its request id.
    pub fn stop_async(&self) -> Option<String> {
        let task = self.take_background()?;
        task.cancel.cancel();
        let running = !task.handle.is_finished();
        debug!(uuid = %task.uuid, running, "background resolution stopped");
        Some(task.uuid)
    }

    pub async fn active_route(&self) -> Option<SuggestedRoutes> {
        self.active.lock().await.as_ref().map(|a| a.routes.clone())
    }

    pub async fn clear_active_route(&self) {
        self.active.lock().await.take();
        self.watchers.unsubscribe_all();
        info!("active route cleared");
    }

    /// Switches one transaction of the active route to a preset fee level.
    pub async fn set_fee_mode(
        &self,
        identity: &PathTxIdentity,
        mode: GasFeeMode,
    ) -> Result<SuggestedRoutesResponse, RouterError> {
        if mode == GasFeeMode::Custom {
            return Err(RouterError::CustomFeeModeCannotBeSetThisWay);
        }
        self.reprice_tx(
            identity,
            PathTxCustomParams {
                gas_fee_mode: mode,
                ..Default::default()
            },
        )
        .await
    }

    /// Pins nonce, gas and fees of one transaction of the active route.
    pub async fn set_custom_tx_details(
        &self,
        identity: &PathTxIdentity,
        params: PathTxCustomParams,
    ) -> Result<SuggestedRoutesResponse, RouterError> {
        if params.gas_fee_mode != GasFeeMode::Custom {
            return Err(RouterError::OnlyCustomFeeModeCanBeSetThisWay);
        }
        params.validate()?;
        self.reprice_tx(identity, params).await
    }

    async fn reprice_tx(
        &self,
        identity: &PathTxIdentity,
        params: PathTxCustomParams,
    ) -> Result<SuggestedRoutesResponse, RouterError> {
        let mut guard = self.active.lock().await;
        let active = guard.as_mut().ok_or(RouterError::CannotCustomizeIfNoRoute)?;
        let target = identity.path_identity();
        let idx = active
            .routes
            .best
            .iter()
            .position(|p| p.path_identity() == target)
            .ok_or(RouterError::CannotFindPathForProvidedIdentity)?;

        let mut custom = active.input.path_tx_custom_params.clone();
        custom.insert(identity.key(), params);

        let mut path = active.routes.best[idx].clone();
        let fees = self
            .fee_oracle
            .suggested_fees(path.from_chain.chain_id)
            .await?;
        let mut nonces = NonceTracker::new();
        self.pricer
            .apply_fees(
                &mut path,
                &fees,
                active.input.gas_fee_mode,
                &custom,
                Some(&mut nonces),
                active.input.addr_from,
            )
            .await?;

        active.input.path_tx_custom_params = custom;
        active.routes.best[idx] = path;
        let (_, checked) = check_balances(&active.routes.best, &active.balances);
        let event = SuggestedRoutesResponse::new(
            &active.input.uuid,
            Some(&active.routes),
            checked.as_ref().err(),
        )
        .updated();
        drop(guard);

        info!(identity = %identity.key(), "transaction parameters updated");
        self.events.publish(event.clone()).await;
        Ok(event)
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        if let Some(task) = self.take_background() {
            task.cancel.cancel();
        }
    }
}

/// Strategy-specific errors win, then the first strategy error, then a
/// generic no-route error.
fn no_route_error(errors: &[ProcessorError]) -> RouterError {
    errors
        .iter()
        .find(|e| e.error.is_custom())
        .or_else(|| errors.first())
        .map(|e| e.error.clone())
        .unwrap_or(RouterError::NoBestRouteFound)
}

/// Paths that spend a chain's whole native balance pay their fees out of
/// the amount sent.
fn subtract_fees(best: &mut Route) {
    for path in best.iter_mut() {
        if !path.subtract_fees || !path.from_token.is_native() {
            continue;
        }
        let mut fees = path.tx_fee.saturating_add(path.tx_l1_fee);
        if path.approval_required {
            fees = fees
                .saturating_add(path.approval_fee)
                .saturating_add(path.approval_l1_fee);
        }
        path.amount_in = path.amount_in.saturating_sub(fees);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::{ETHEREUM_MAINNET, OPTIMISM_MAINNET};
    use crate::processors::ProcessorKind;
    use crate::router::routes::Path;
    use crate::token::Token;
    use alloy_primitives::U256;

    fn path(chain_id: ChainId) -> Path {
        let chain = Network::known(chain_id).unwrap();
        Path::new(
            "uuid",
            ProcessorKind::Transfer,
            chain.clone(),
            chain.clone(),
            Token::native(&chain),
            None,
            U256::from(1_000u64),
        )
    }

    #[test]
    fn strategy_specific_errors_take_precedence() {
        let errors = vec![
            ProcessorError {
                processor: ProcessorKind::Transfer,
                error: RouterError::TokenNotFound,
            },
            ProcessorError {
                processor: ProcessorKind::Hop,
                error: RouterError::processor("WPH-001", "hop down"),
            },
        ];
        assert_eq!(no_route_error(&errors).code(), "WPH-001");
        assert_eq!(no_route_error(&errors[..1]), RouterError::TokenNotFound);
        assert_eq!(no_route_error(&[]), RouterError::NoBestRouteFound);
    }

    #[test]
    fn whole_balance_paths_pay_fees_from_the_amount() {
        let mut p = path(OPTIMISM_MAINNET);
        p.subtract_fees = true;
        p.tx_fee = U256::from(100u64);
        p.tx_l1_fee = U256::from(10u64);
        p.approval_fee = U256::from(50u64);

        let mut untouched = path(ETHEREUM_MAINNET);
        untouched.tx_fee = U256::from(100u64);

        let mut best = vec![p, untouched];
        subtract_fees(&mut best);
        // approval not required, so its fee stays out
        assert_eq!(best[0].amount_in, U256::from(890u64));
        assert_eq!(best[1].amount_in, U256::from(1_000u64));
    }
}
