// JSON-RPC transport layer implementation
// This file implements the Ethereum JSON-RPC client used for balances,
// gas estimation, nonces, fee history and contract calls
//
// Numan Thabit 2025 Nov

use crate::chain::CallRequest;
use crate::errors::RouterError;
use crate::fees::FeeHistory;
use crate::metrics::{RPC_ERRORS, RPC_LATENCY};
use crate::networks::ChainId;
use alloy_primitives::{Address, Bytes, U256};
use backoff::{future::retry, ExponentialBackoff};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JsonRpc {
    http: Client,
    url: String,
    chain_id: ChainId,
}

fn quantity_u64(method: &str, value: U256) -> Result<u64, RouterError> {
    if value > U256::from(u64::MAX) {
        return Err(RouterError::Provider(format!("{method}: quantity {value} overflows u64")));
    }
    Ok(value.as_limbs()[0])
}

fn call_object(call: &CallRequest) -> Value {
    let mut obj = json!({
        "from": call.from,
        "to": call.to,
        "data": call.data,
    });
    if !call.value.is_zero() {
        obj["value"] = json!(call.value);
    }
    obj
}

impl JsonRpc {
    pub fn new(url: impl Into<String>, chain_id: ChainId) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
            chain_id,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    async fn call_once<T: DeserializeOwned>(&self, method: &str, params: &Value) -> Result<T, RouterError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RouterError::Transport(format!("jsonrpc send: {e}")))?;
        if !resp.status().is_success() {
            return Err(RouterError::Provider(format!("http {}", resp.status())));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| RouterError::Transport(format!("json parse: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(RouterError::Provider(err.to_string()));
        }
        serde_json::from_value(body["result"].clone())
            .map_err(|e| RouterError::Provider(format!("decode {method} result: {e}")))
    }

    /// Retries transport failures with exponential backoff. Provider
    /// errors are returned as they come.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RouterError> {
        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(Duration::from_secs(30)),
            multiplier: 2.0,
            ..Default::default()
        };

        let params = &params;
        let started = Instant::now();
        let result = retry(backoff, || async move {
            self.call_once(method, params).await.map_err(|err| match err {
                RouterError::Transport(_) => {
                    debug!(chain_id = self.chain_id, method, error = %err, "retrying rpc call");
                    backoff::Error::transient(err)
                }
                other => backoff::Error::permanent(other),
            })
        })
        .await;

        RPC_LATENCY
            .with_label_values(&["eth", method])
            .observe(started.elapsed().as_secs_f64());
        if result.is_err() {
            RPC_ERRORS.with_label_values(&["eth", method]).inc();
        }
        result
    }

    pub async fn block_number(&self) -> Result<u64, RouterError> {
        let block: U256 = self.call("eth_blockNumber", json!([])).await?;
        quantity_u64("eth_blockNumber", block)
    }

    pub async fn get_balance(&self, account: Address) -> Result<U256, RouterError> {
        self.call("eth_getBalance", json!([account, "latest"])).await
    }

    pub async fn eth_call(&self, to: Address, data: &Bytes) -> Result<Bytes, RouterError> {
        self.call("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    pub async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, RouterError> {
        let gas: U256 = self.call("eth_estimateGas", json!([call_object(call)])).await?;
        quantity_u64("eth_estimateGas", gas)
    }

    pub async fn pending_nonce(&self, account: Address) -> Result<u64, RouterError> {
        let nonce: U256 = self
            .call("eth_getTransactionCount", json!([account, "pending"]))
            .await?;
        quantity_u64("eth_getTransactionCount", nonce)
    }

    pub async fn gas_price(&self) -> Result<U256, RouterError> {
        self.call("eth_gasPrice", json!([])).await
    }

    pub async fn fee_history(&self, block_count: u64, percentiles: &[f64]) -> Result<FeeHistory, RouterError> {
        self.call(
            "eth_feeHistory",
            json!([format!("0x{block_count:x}"), "latest", percentiles]),
        )
        .await
    }
}
