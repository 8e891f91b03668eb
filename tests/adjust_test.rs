//! Fee mode and custom transaction parameters on the active route

use alloy_primitives::U256;
use wallet_router::errors::RouterError;
use wallet_router::fees::GasFeeMode;
use wallet_router::networks::ETHEREUM_MAINNET;
use wallet_router::processors::ProcessorKind;
use wallet_router::requests::{PathTxCustomParams, PathTxIdentity};

mod mocks;

use mocks::*;

fn identity(uuid: &str) -> PathTxIdentity {
    PathTxIdentity {
        router_input_params_uuid: uuid.to_string(),
        path_name: ProcessorKind::Transfer,
        chain_id: ETHEREUM_MAINNET,
        is_approval_tx: false,
        community_id: String::new(),
    }
}

fn custom(max_fee: Option<U256>, priority: Option<U256>) -> PathTxCustomParams {
    PathTxCustomParams {
        gas_fee_mode: GasFeeMode::Custom,
        nonce: 42,
        gas_amount: 2_000,
        max_fees_per_gas: max_fee,
        priority_fee: priority,
    }
}

async fn resolved(uuid: &str) -> Harness {
    let h = Harness::new();
    h.router
        .resolve(transfer(uuid, eth(1_000), "ETH"))
        .await
        .unwrap();
    h
}

#[tokio::test]
async fn nothing_to_adjust_without_an_active_route() {
    let h = Harness::new();
    let err = h
        .router
        .set_fee_mode(&identity("u"), GasFeeMode::High)
        .await
        .unwrap_err();
    assert_eq!(err, RouterError::CannotCustomizeIfNoRoute);
    assert_eq!(err.code(), "WR-013");
}

#[tokio::test]
async fn mode_setters_are_not_interchangeable() {
    let h = resolved("u-modes").await;

    let err = h
        .router
        .set_fee_mode(&identity("u-modes"), GasFeeMode::Custom)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "WR-009");

    let mut params = custom(Some(gwei(5)), Some(gwei(1)));
    params.gas_fee_mode = GasFeeMode::Low;
    let err = h
        .router
        .set_custom_tx_details(&identity("u-modes"), params)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "WR-010");

    let err = h
        .router
        .set_custom_tx_details(&identity("u-modes"), custom(None, Some(gwei(1))))
        .await
        .unwrap_err();
    assert_eq!(err, RouterError::MaxFeesPerGasRequired);

    let err = h
        .router
        .set_custom_tx_details(&identity("u-modes"), custom(Some(gwei(5)), None))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "WRC-002");
}

#[tokio::test]
async fn unknown_identity_is_rejected() {
    let h = resolved("u-id").await;
    let mut other = identity("u-id");
    other.chain_id = 10;
    let err = h
        .router
        .set_fee_mode(&other, GasFeeMode::High)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "WR-014");
}

#[tokio::test]
async fn fee_mode_reprices_and_publishes() {
    let h = resolved("u-high").await;
    let mut rx = h.router.subscribe();

    let resp = h
        .router
        .set_fee_mode(&identity("u-high"), GasFeeMode::High)
        .await
        .unwrap();
    assert!(resp.updated);
    assert!(resp.error_code.is_none());
    let path = &resp.best.as_ref().unwrap()[0];
    assert_eq!(path.tx_gas_fee_mode, GasFeeMode::High);
    assert_eq!(path.tx_max_fees_per_gas, gwei(3));
    assert_eq!(path.tx_fee, gwei(3) * U256::from(TRANSFER_GAS));

    // a block refresh may be published too; it keeps the chosen mode
    let published = next_update(&mut rx).await;
    assert_eq!(published.uuid, "u-high");
    assert_eq!(
        published.best.unwrap()[0].tx_gas_fee_mode,
        GasFeeMode::High
    );
    let active = h.router.active_route().await.unwrap();
    assert_eq!(active.best[0].tx_gas_fee_mode, GasFeeMode::High);
}

#[tokio::test]
async fn custom_details_are_used_verbatim() {
    let h = resolved("u-custom").await;
    let resp = h
        .router
        .set_custom_tx_details(&identity("u-custom"), custom(Some(gwei(5)), Some(gwei(1))))
        .await
        .unwrap();

    let path = &resp.best.unwrap()[0];
    assert_eq!(path.tx_gas_fee_mode, GasFeeMode::Custom);
    assert_eq!(path.tx_nonce, Some(42));
    assert_eq!(path.tx_gas_amount, 2_000);
    assert_eq!(path.tx_base_fee, gwei(4));
    assert_eq!(path.tx_fee, gwei(5) * U256::from(2_000u64));
}
