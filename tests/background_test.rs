//! Background resolution slot: one resolution in flight at a time

use std::time::Duration;

use tokio::time::timeout;

mod mocks;

use mocks::*;

const PRICE_DELAY: Duration = Duration::from_secs(10);

#[tokio::test(start_paused = true)]
async fn newer_request_replaces_the_running_one() {
    let h = Harness::with_prices(MockPrices::slow(PRICE_DELAY));
    let mut rx = h.router.subscribe();

    assert_eq!(h.router.resolve_async(transfer("a", eth(1_000), "ETH")), "a");
    assert_eq!(h.router.resolve_async(transfer("b", eth(1_000), "ETH")), "b");

    let event = timeout(EVENT_WAIT, next_resolution(&mut rx)).await.unwrap();
    assert_eq!(event.uuid, "b");
    assert!(event.error_code.is_none());
    assert_eq!(event.best.map(|b| b.len()), Some(1));

    // the replaced request never reports
    assert!(timeout(EVENT_WAIT, next_resolution(&mut rx)).await.is_err());
    assert_eq!(h.router.events().last_uuid().await.as_deref(), Some("b"));
}

#[tokio::test(start_paused = true)]
async fn stopped_resolution_publishes_nothing() {
    let h = Harness::with_prices(MockPrices::slow(PRICE_DELAY));
    let mut rx = h.router.subscribe();

    h.router.resolve_async(transfer("c", eth(1_000), "ETH"));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.router.stop_async().as_deref(), Some("c"));
    assert_eq!(h.router.stop_async(), None);

    assert!(timeout(EVENT_WAIT, next_resolution(&mut rx)).await.is_err());
    assert!(h.router.active_route().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn direct_resolution_cancels_the_background_one() {
    let h = Harness::with_prices(MockPrices::slow(PRICE_DELAY));
    let mut rx = h.router.subscribe();

    h.router.resolve_async(transfer("e", eth(1_000), "ETH"));
    let routes = h
        .router
        .resolve(transfer("f", eth(1_000), "ETH"))
        .await
        .unwrap();
    assert_eq!(routes.uuid, "f");
    assert_eq!(h.router.stop_async(), None);

    assert!(timeout(EVENT_WAIT, next_resolution(&mut rx)).await.is_err());
    assert_eq!(h.router.active_route().await.unwrap().uuid, "f");
}

#[tokio::test(start_paused = true)]
async fn results_older_than_the_latest_request_are_not_committed() {
    let h = Harness::with_prices(MockPrices::slow(PRICE_DELAY));
    let mut rx = h.router.subscribe();

    let router = h.router.clone();
    let direct = tokio::spawn(async move { router.resolve(transfer("g", eth(1_000), "ETH")).await });
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.router.resolve_async(transfer("h", eth(1_000), "ETH"));

    // "g" still answers its caller but leaves the active route alone
    let routes = direct.await.unwrap().unwrap();
    assert_eq!(routes.uuid, "g");
    assert!(h.router.active_route().await.is_none());
    assert!(h.router.watched_chains().is_empty());

    let event = timeout(EVENT_WAIT, next_resolution(&mut rx)).await.unwrap();
    assert_eq!(event.uuid, "h");
    assert_eq!(h.router.active_route().await.unwrap().uuid, "h");
}

#[tokio::test(start_paused = true)]
async fn failures_are_published_with_their_code() {
    let h = Harness::new();
    for chain_id in MAINNETS {
        h.chain.set_native_balance(chain_id, alloy_primitives::U256::ZERO);
    }
    let mut rx = h.router.subscribe();

    h.router.resolve_async(transfer("d", usdc(10), "USDC"));
    let event = timeout(EVENT_WAIT, next_resolution(&mut rx)).await.unwrap();
    assert_eq!(event.uuid, "d");
    assert_eq!(event.error_code.as_deref(), Some("WR-002"));
    // fallback route and candidates travel with the error
    assert_eq!(event.best.map(|b| b.len()), Some(1));
    assert_eq!(event.candidates.map(|c| c.len()), Some(16));
}
