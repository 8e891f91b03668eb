// Hop bridge processor
// Prices cross-chain legs from the Hop quote API and packs the bridge
// calls: `sendToL2` when leaving Ethereum, `swapAndSend` from an L2
//
// Numan Thabit 2025 Nov

use super::{with_gas_margin, PathProcessor, ProcessorInputParams, ProcessorKind};
use crate::abi::{address_word, encode_call, uint_word};
use crate::errors::RouterError;
use crate::metrics::RPC_LATENCY;
use crate::networks::{
    ChainId, Network, ARBITRUM_MAINNET, ARBITRUM_SEPOLIA, BASE_MAINNET, BASE_SEPOLIA,
    ETHEREUM_MAINNET, ETHEREUM_SEPOLIA, OPTIMISM_MAINNET, OPTIMISM_SEPOLIA,
};
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

const SEND_TO_L2: [u8; 4] = [0xde, 0xac, 0xe8, 0xf5];
const SWAP_AND_SEND: [u8; 4] = [0xee, 0xa0, 0xd7, 0xb2];
const GAS_MARGIN_PERCENT: u64 = 20;
/// How long a fetched or seeded quote stays usable.
pub const QUOTE_TTL: Duration = Duration::from_secs(30);

fn default_slippage() -> f64 {
    0.5
}

fn default_gas_limit() -> u64 {
    250_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct HopSettings {
    pub api_url: Url,
    #[serde(default = "default_slippage")]
    pub slippage: f64,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Bridge entry contract per token symbol, then per source chain id.
    #[serde(default)]
    pub contracts: HashMap<String, HashMap<String, Address>>,
}

impl HopSettings {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            slippage: default_slippage(),
            gas_limit: default_gas_limit(),
            contracts: HashMap::new(),
        }
    }

    fn contract(&self, symbol: &str, chain_id: ChainId) -> Option<Address> {
        // config sources may lowercase keys
        self.contracts
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(symbol))?
            .1
            .get(&chain_id.to_string())
            .copied()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    bonder_fee: String,
    // sic, the API field is misspelled
    estimated_recieved: String,
    #[serde(default)]
    amount_out_min: Option<String>,
    #[serde(default)]
    deadline: Option<u64>,
    #[serde(default)]
    destination_amount_out_min: Option<String>,
    #[serde(default)]
    destination_deadline: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HopQuote {
    pub bonder_fee: U256,
    pub estimated_received: U256,
    pub amount_out_min: U256,
    pub deadline: u64,
    pub destination_amount_out_min: U256,
    pub destination_deadline: u64,
}

impl HopQuote {
    /// `(bonder_fee, token_fee, amount_out)` for sending `amount_in`.
    ///
    /// A bonder fee above the received amount is still returned; the
    /// balance check rejects such a leg as too small.
    pub fn fees(&self, amount_in: U256) -> (U256, U256, U256) {
        let token_fee = amount_in
            .saturating_sub(self.estimated_received)
            .saturating_sub(self.bonder_fee);
        (self.bonder_fee, token_fee, self.estimated_received)
    }
}

fn parse_amount(field: &str, raw: &str) -> Result<U256, RouterError> {
    U256::from_str(raw)
        .map_err(|e| RouterError::processor("WPH-002", format!("hop quote {field}: {e}")))
}

impl TryFrom<QuoteResponse> for HopQuote {
    type Error = RouterError;

    fn try_from(resp: QuoteResponse) -> Result<Self, Self::Error> {
        let optional = |field: &str, raw: &Option<String>| match raw {
            Some(raw) => parse_amount(field, raw),
            None => Ok(U256::ZERO),
        };
        Ok(Self {
            bonder_fee: parse_amount("bonderFee", &resp.bonder_fee)?,
            estimated_received: parse_amount("estimatedRecieved", &resp.estimated_recieved)?,
            amount_out_min: optional("amountOutMin", &resp.amount_out_min)?,
            deadline: resp.deadline.unwrap_or_default(),
            destination_amount_out_min: optional(
                "destinationAmountOutMin",
                &resp.destination_amount_out_min,
            )?,
            destination_deadline: resp.destination_deadline.unwrap_or_default(),
        })
    }
}

fn chain_slug(chain_id: ChainId) -> Option<&'static str> {
    match chain_id {
        ETHEREUM_MAINNET | ETHEREUM_SEPOLIA => Some("ethereum"),
        OPTIMISM_MAINNET | OPTIMISM_SEPOLIA => Some("optimism"),
        ARBITRUM_MAINNET | ARBITRUM_SEPOLIA => Some("arbitrum"),
        BASE_MAINNET | BASE_SEPOLIA => Some("base"),
        _ => None,
    }
}

fn is_l1(network: &Network) -> bool {
    matches!(network.chain_id, ETHEREUM_MAINNET | ETHEREUM_SEPOLIA)
}

struct CachedQuote {
    fetched_at: tokio::time::Instant,
    quote: HopQuote,
}

pub struct HopProcessor {
    http: Client,
    settings: HopSettings,
    quotes: Mutex<HashMap<String, CachedQuote>>,
}

impl HopProcessor {
    pub fn new(settings: HopSettings) -> Self {
        Self {
            http: Client::new(),
            settings,
            quotes: Mutex::new(HashMap::new()),
        }
    }

    fn quote_key(params: &ProcessorInputParams) -> String {
        format!(
            "{}-{}-{}-{}",
            params.from_chain.chain_id,
            params.to_chain.chain_id,
            params.from_token.symbol,
            params.amount_in
        )
    }

    fn cached_quote(&self, key: &str) -> Option<HopQuote> {
        self.quotes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .filter(|cached| cached.fetched_at.elapsed() < QUOTE_TTL)
            .map(|cached| cached.quote.clone())
    }

    fn store_quote(&self, key: String, quote: HopQuote) {
        let mut quotes = self
            .quotes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        quotes.retain(|_, cached| cached.fetched_at.elapsed() < QUOTE_TTL);
        quotes.insert(
            key,
            CachedQuote {
                fetched_at: tokio::time::Instant::now(),
                quote,
            },
        );
    }

    /// Seeds the quote cache, used when a quote is known ahead of time.
    /// The entry expires after [`QUOTE_TTL`] like a fetched one.
    pub fn insert_quote(&self, params: &ProcessorInputParams, quote: HopQuote) {
        self.store_quote(Self::quote_key(params), quote);
    }

    #[cfg(test)]
    fn cached_quotes(&self) -> usize {
        self.quotes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    async fn quote(&self, params: &ProcessorInputParams) -> Result<HopQuote, RouterError> {
        let key = Self::quote_key(params);
        if let Some(quote) = self.cached_quote(&key) {
            return Ok(quote);
        }

        let from = chain_slug(params.from_chain.chain_id)
            .ok_or(RouterError::PathNotSupportedForProvidedChain)?;
        let to = chain_slug(params.to_chain.chain_id)
            .ok_or(RouterError::PathNotSupportedForProvidedChain)?;
        let network = if params.from_chain.is_test { "sepolia" } else { "mainnet" };

        let mut url = self
            .settings
            .api_url
            .join("v1/quote")
            .map_err(|e| RouterError::processor("WPH-001", format!("hop url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("amount", &params.amount_in.to_string())
            .append_pair("token", &params.from_token.symbol)
            .append_pair("fromChain", from)
            .append_pair("toChain", to)
            .append_pair("slippage", &self.settings.slippage.to_string())
            .append_pair("network", network);

        let started = Instant::now();
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RouterError::processor("WPH-001", format!("hop quote send: {e}")))?;
        RPC_LATENCY
            .with_label_values(&["hop", "quote"])
            .observe(started.elapsed().as_secs_f64());
        if !resp.status().is_success() {
            return Err(RouterError::processor(
                "WPH-001",
                format!("hop quote http {}", resp.status()),
            ));
        }
        let body: QuoteResponse = resp
            .json()
            .await
            .map_err(|e| RouterError::processor("WPH-002", format!("hop quote decode: {e}")))?;
        let quote = HopQuote::try_from(body)?;
        debug!(
            from = params.from_chain.chain_id,
            to = params.to_chain.chain_id,
            bonder_fee = %quote.bonder_fee,
            "hop quote fetched"
        );

        self.store_quote(key, quote.clone());
        Ok(quote)
    }

    fn pack(params: &ProcessorInputParams, quote: &HopQuote) -> Bytes {
        let to_chain = U256::from(params.to_chain.chain_id);
        if is_l1(&params.from_chain) {
            encode_call(
                SEND_TO_L2,
                &[
                    uint_word(to_chain),
                    address_word(params.to_addr),
                    uint_word(params.amount_in),
                    uint_word(quote.destination_amount_out_min),
                    uint_word(U256::from(quote.destination_deadline)),
                    address_word(Address::ZERO),
                    uint_word(U256::ZERO),
                ],
            )
        } else {
            encode_call(
                SWAP_AND_SEND,
                &[
                    uint_word(to_chain),
                    address_word(params.to_addr),
                    uint_word(params.amount_in),
                    uint_word(quote.bonder_fee),
                    uint_word(quote.amount_out_min),
                    uint_word(U256::from(quote.deadline)),
                    uint_word(quote.destination_amount_out_min),
                    uint_word(U256::from(quote.destination_deadline)),
                ],
            )
        }
    }
}

#[async_trait]
impl PathProcessor for HopProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Hop
    }

    async fn available_for(&self, params: &ProcessorInputParams) -> Result<bool, RouterError> {
        if params.from_chain.chain_id == params.to_chain.chain_id || params.to_token.is_some() {
            return Ok(false);
        }
        Ok(chain_slug(params.to_chain.chain_id).is_some()
            && self
                .settings
                .contract(&params.from_token.symbol, params.from_chain.chain_id)
                .is_some())
    }

    async fn calculate_fees(
        &self,
        params: &ProcessorInputParams,
    ) -> Result<(U256, U256), RouterError> {
        let quote = self.quote(params).await?;
        let (bonder_fee, token_fee, _) = quote.fees(params.amount_in);
        Ok((bonder_fee, token_fee))
    }

    async fn estimate_gas(&self, _params: &ProcessorInputParams) -> Result<u64, RouterError> {
        Ok(with_gas_margin(self.settings.gas_limit, GAS_MARGIN_PERCENT))
    }

    async fn get_contract_address(
        &self,
        params: &ProcessorInputParams,
    ) -> Result<Option<Address>, RouterError> {
        self.settings
            .contract(&params.from_token.symbol, params.from_chain.chain_id)
            .map(Some)
            .ok_or(RouterError::PathNotSupportedForProvidedChain)
    }

    async fn calculate_amount_out(
        &self,
        params: &ProcessorInputParams,
    ) -> Result<U256, RouterError> {
        let quote = self.quote(params).await?;
        let (_, _, amount_out) = quote.fees(params.amount_in);
        Ok(amount_out)
    }

    async fn pack_tx_input_data(
        &self,
        params: &ProcessorInputParams,
    ) -> Result<Bytes, RouterError> {
        let quote = self.quote(params).await?;
        Ok(Self::pack(params, &quote))
    }
}
