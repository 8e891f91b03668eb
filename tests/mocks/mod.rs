//! Shared mocks and fixtures for the router integration tests
//!
//! Four funded mainnets, fixed prices and fee levels, and deterministic
//! transfer and bridge strategies.
#![allow(dead_code)]

pub mod fixtures;
pub mod processors;
pub mod providers;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use wallet_router::processors::PathProcessor;
use wallet_router::router::{Router, RouterDeps, RouterSettings, SuggestedRoutesResponse};
use wallet_router::token::StaticTokenCatalog;

pub use fixtures::*;
pub use processors::{MockBridge, MockTransfer};
pub use providers::{MockChain, MockFeeOracle, MockPrices};

/// A router wired to mocks, with handles to poke at them.
pub struct Harness {
    pub router: Arc<Router>,
    pub chain: Arc<MockChain>,
    pub fees: Arc<MockFeeOracle>,
    pub transfer: Arc<MockTransfer>,
    pub bridge: Arc<MockBridge>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(MockPrices::new(), MockBridge::new(), None)
    }

    pub fn with_prices(prices: MockPrices) -> Self {
        Self::build(prices, MockBridge::new(), None)
    }

    pub fn with_bridge(bridge: MockBridge) -> Self {
        Self::build(MockPrices::new(), bridge, None)
    }

    /// Uses `processor` for cross-chain legs instead of the mock bridge.
    pub fn with_cross_chain(processor: Arc<dyn PathProcessor>) -> Self {
        Self::build(MockPrices::new(), MockBridge::new(), Some(processor))
    }

    fn build(
        prices: MockPrices,
        bridge: MockBridge,
        cross_chain: Option<Arc<dyn PathProcessor>>,
    ) -> Self {
        let chain = Arc::new(MockChain::funded());
        let fees = Arc::new(MockFeeOracle::new());
        let transfer = Arc::new(MockTransfer::new());
        let bridge = Arc::new(bridge);
        let cross_chain = cross_chain.unwrap_or_else(|| bridge.clone() as Arc<dyn PathProcessor>);

        let router = Router::new(
            RouterDeps {
                chain: chain.clone(),
                fee_oracle: fees.clone(),
                prices: Arc::new(prices),
                tokens: Arc::new(StaticTokenCatalog::new(usdc_tokens())),
                processors: vec![
                    transfer.clone() as Arc<dyn PathProcessor>,
                    cross_chain,
                ],
                networks: networks(),
            },
            RouterSettings::default(),
        );

        Self {
            router: Arc::new(router),
            chain,
            fees,
            transfer,
            bridge,
        }
    }
}

/// Next event that is a resolution result rather than a live update.
pub async fn next_resolution(
    rx: &mut broadcast::Receiver<SuggestedRoutesResponse>,
) -> SuggestedRoutesResponse {
    loop {
        match rx.recv().await {
            Ok(event) if !event.updated => return event,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
        }
    }
}

/// Next live update event.
pub async fn next_update(
    rx: &mut broadcast::Receiver<SuggestedRoutesResponse>,
) -> SuggestedRoutesResponse {
    loop {
        match rx.recv().await {
            Ok(event) if event.updated => return event,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
        }
    }
}

pub const EVENT_WAIT: Duration = Duration::from_secs(60);
