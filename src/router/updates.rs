// Live update loop
// One watcher task per chain referenced by the active route. Each tick
// polls the block height; on a new block the chain's fees are refetched,
// the active route's legs on that chain are re-priced, the whole route is
// re-validated and the result is published
//
// Numan Thabit 2025 Nov

use crate::chain::ChainClient;
use crate::errors::RouterError;
use crate::events::EventBus;
use crate::fees::{FeeOracle, SuggestedFees};
use crate::metrics::ROUTE_REFRESHES;
use crate::networks::{block_check_interval, update_timeout, ChainId};
use crate::requests::RouteInputParams;
use crate::router::pricing::{NonceTracker, PathPricer};
use crate::router::routes::{SuggestedRoutes, SuggestedRoutesResponse};
use crate::router::validator::{check_balances, BalanceMap};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// The last best route together with everything needed to re-price it.
#[derive(Debug, Clone)]
pub struct ActiveRoute {
    pub input: RouteInputParams,
    pub routes: SuggestedRoutes,
    pub balances: BalanceMap,
}

pub type SharedActiveRoute = Arc<Mutex<Option<ActiveRoute>>>;

#[derive(Clone)]
pub struct UpdateContext {
    pub active: SharedActiveRoute,
    pub chain: Arc<dyn ChainClient>,
    pub fee_oracle: Arc<dyn FeeOracle>,
    pub pricer: PathPricer,
    pub events: EventBus,
}

impl UpdateContext {
    /// Re-prices the legs starting on `chain_id` and re-checks the whole
    /// route. The stored route only changes when re-pricing succeeds.
    pub async fn refresh(&self, chain_id: ChainId, fees: &SuggestedFees) -> Option<SuggestedRoutesResponse> {
        let mut guard = self.active.lock().await;
        let active = guard.as_mut()?;

        let mut best = active.routes.best.clone();
        let mut nonces = NonceTracker::new();
        let mut error = None;
        for path in best.iter_mut().filter(|p| p.from_chain.chain_id == chain_id) {
            let priced = self
                .pricer
                .apply_fees(
                    path,
                    fees,
                    active.input.gas_fee_mode,
                    &active.input.path_tx_custom_params,
                    Some(&mut nonces),
                    active.input.addr_from,
                )
                .await;
            if let Err(err) = priced {
                error = Some(err);
                break;
            }
        }

        if error.is_none() {
            active.routes.best = best;
            if let (_, Err(err)) = check_balances(&active.routes.best, &active.balances) {
                error = Some(err);
            }
        }

        Some(SuggestedRoutesResponse::new(&active.input.uuid, Some(&active.routes), error.as_ref()).updated())
    }

    /// Snapshot of the active route carrying `error`.
    pub async fn current(&self, error: Option<&RouterError>) -> Option<SuggestedRoutesResponse> {
        let guard = self.active.lock().await;
        let active = guard.as_ref()?;
        Some(SuggestedRoutesResponse::new(&active.input.uuid, Some(&active.routes), error).updated())
    }

    async fn on_new_block(&self, chain_id: ChainId) {
        let label = chain_id.to_string();
        ROUTE_REFRESHES.with_label_values(&[label.as_str()]).inc();

        let event = match self.fee_oracle.suggested_fees(chain_id).await {
            Ok(fees) => self.refresh(chain_id, &fees).await,
            Err(err) => {
                warn!(chain_id, error = %err, "suggested fees unavailable for update");
                self.current(Some(&err)).await
            }
        };
        if let Some(event) = event {
            if let Some(code) = event.error_code.as_deref() {
                debug!(chain_id, code, "active route refresh failed");
            }
            self.events.publish(event).await;
        }
    }
}

struct Watch {
    cancel: CancellationToken,
    generation: u64,
}

type WatchMap = Arc<std::sync::Mutex<HashMap<ChainId, Watch>>>;

/// Registry of per-chain watchers owned by one router.
pub struct UpdateWatchers {
    ctx: UpdateContext,
    watches: WatchMap,
    generation: AtomicU64,
}

impl UpdateWatchers {
    pub fn new(ctx: UpdateContext) -> Self {
        Self {
            ctx,
            watches: Arc::new(std::sync::Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Starts watching `chain_id`. Returns false when a watcher already runs.
    pub fn subscribe(&self, chain_id: ChainId) -> bool {
        let mut watches = self.watches.lock().unwrap_or_else(PoisonError::into_inner);
        if watches.contains_key(&chain_id) {
            return false;
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        watches.insert(
            chain_id,
            Watch {
                cancel: cancel.clone(),
                generation,
            },
        );
        drop(watches);

        tokio::spawn(watch(
            self.ctx.clone(),
            chain_id,
            cancel,
            generation,
            self.watches.clone(),
        ));
        info!(chain_id, "watching chain for route updates");
        true
    }

    pub fn unsubscribe(&self, chain_id: ChainId) {
        let removed = self
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&chain_id);
        if let Some(watch) = removed {
            watch.cancel.cancel();
        }
    }

    pub fn unsubscribe_all(&self) {
        let drained: Vec<Watch> = self
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, w)| w)
            .collect();
        for watch in drained {
            watch.cancel.cancel();
        }
    }

    pub fn watching(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = self
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        chains.sort_unstable();
        chains
    }
}

impl Drop for UpdateWatchers {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}

#[instrument(skip_all, fields(chain_id = chain_id))]
async fn watch(
    ctx: UpdateContext,
    chain_id: ChainId,
    cancel: CancellationToken,
    generation: u64,
    watches: WatchMap,
) {
    let mut ticker = tokio::time::interval(block_check_interval(chain_id));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = tokio::time::sleep(update_timeout(chain_id));
    tokio::pin!(deadline);
    let mut last_block = 0u64;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("watch stopped");
                break;
            }
            _ = &mut deadline => {
                debug!("watch deadline reached");
                break;
            }
            _ = ticker.tick() => {
                match ctx.chain.block_number(chain_id).await {
                    Ok(block) if block > last_block => {
                        last_block = block;
                        ctx.on_new_block(chain_id).await;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "block number unavailable");
                        if let Some(event) = ctx.current(Some(&err)).await {
                            ctx.events.publish(event).await;
                        }
                    }
                }
            }
        }
    }

    // a newer watcher may already own the slot
    let mut watches = watches.lock().unwrap_or_else(PoisonError::into_inner);
    if watches.get(&chain_id).is_some_and(|w| w.generation == generation) {
        watches.remove(&chain_id);
    }
}
