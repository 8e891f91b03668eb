// Candidate generator
// Fans out one task per source network; each task walks the amount
// options, compatible processors and destinations for its network and
// returns its own priced paths and processor errors
//
// Numan Thabit 2025 Nov

use crate::abi;
use crate::chain::{CallRequest, ChainClient};
use crate::errors::{ProcessorError, RouterError};
use crate::fees::{FeeOracle, SuggestedFees};
use crate::metrics::CANDIDATE_COUNT;
use crate::networks::{chain_priority, Network};
use crate::processors::{PathProcessor, ProcessorInputParams};
use crate::requests::RouteInputParams;
use crate::router::allocator::{AmountOption, AmountOptions};
use crate::router::pricing::PathPricer;
use crate::router::routes::Path;
use crate::sendtype::SendType;
use crate::token::TokenCatalog;
use alloy_primitives::{Address, Bytes, U256};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Default)]
pub struct Candidates {
    pub paths: Vec<Path>,
    pub errors: Vec<ProcessorError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Approval {
    pub required: bool,
    pub amount: U256,
    pub gas: u64,
    pub packed_data: Bytes,
}

pub struct CandidateGenerator {
    processors: Vec<Arc<dyn PathProcessor>>,
    chain: Arc<dyn ChainClient>,
    fee_oracle: Arc<dyn FeeOracle>,
    tokens: Arc<dyn TokenCatalog>,
    pricer: PathPricer,
    force_approval: bool,
}

impl CandidateGenerator {
    pub fn new(
        processors: Vec<Arc<dyn PathProcessor>>,
        chain: Arc<dyn ChainClient>,
        fee_oracle: Arc<dyn FeeOracle>,
        tokens: Arc<dyn TokenCatalog>,
        force_approval: bool,
    ) -> Self {
        let pricer = PathPricer::new(fee_oracle.clone(), chain.clone());
        Self {
            processors,
            chain,
            fee_oracle,
            tokens,
            pricer,
            force_approval,
        }
    }

    pub async fn generate(
        &self,
        input: &RouteInputParams,
        from_chains: &[Network],
        to_chains: &[Network],
        options: &AmountOptions,
    ) -> Candidates {
        let tasks = from_chains
            .iter()
            .filter(|network| input.send_type.is_available_for(network))
            .map(|network| {
                let opts = options
                    .get(&network.chain_id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                self.generate_for_network(input, network, to_chains, opts)
            });

        let mut candidates = Candidates::default();
        for (paths, errors) in join_all(tasks).await {
            candidates.paths.extend(paths);
            candidates.errors.extend(errors);
        }
        candidates
            .paths
            .sort_by_key(|p| chain_priority(p.from_chain.chain_id));

        CANDIDATE_COUNT.observe(candidates.paths.len() as f64);
        debug!(
            candidates = candidates.paths.len(),
            processor_errors = candidates.errors.len(),
            "candidates generated"
        );
        candidates
    }

    #[instrument(skip_all, fields(chain_id = network.chain_id))]
    async fn generate_for_network(
        &self,
        input: &RouteInputParams,
        network: &Network,
        to_chains: &[Network],
        options: &[AmountOption],
    ) -> (Vec<Path>, Vec<ProcessorError>) {
        let mut paths = Vec::new();
        let mut errors = Vec::new();

        let Some(from_token) = input
            .send_type
            .find_token(self.tokens.as_ref(), network, &input.token_id)
        else {
            debug!(token = %input.token_id, "token not found on network");
            return (paths, errors);
        };
        let to_token = if input.send_type == SendType::Swap {
            input
                .send_type
                .find_token(self.tokens.as_ref(), network, &input.to_token_id)
        } else {
            None
        };

        let fees = match self.fee_oracle.suggested_fees(network.chain_id).await {
            Ok(fees) => fees,
            Err(err) => {
                warn!(error = %err, "suggested fees unavailable, skipping network");
                return (paths, errors);
            }
        };

        for option in options {
            for processor in &self.processors {
                let kind = processor.kind();
                if !input.send_type.can_use_processor(kind) {
                    continue;
                }
                if !input
                    .send_type
                    .process_zero_amount_in_processor(option.amount, input.amount_out, kind)
                {
                    continue;
                }

                for dest in to_chains {
                    if !input.send_type.is_available_between(network, dest) {
                        continue;
                    }

                    let params = ProcessorInputParams {
                        from_chain: network.clone(),
                        to_chain: dest.clone(),
                        from_token: from_token.clone(),
                        to_token: to_token.clone(),
                        from_addr: input.addr_from,
                        to_addr: input.addr_to,
                        amount_in: option.amount,
                        amount_out: input.amount_out,
                        username: input.username.clone(),
                        public_key: input.public_key.clone(),
                        pack_id: input.pack_id,
                    };

                    match self
                        .price_candidate(input, processor.as_ref(), &params, option, &fees)
                        .await
                    {
                        Ok(Some(path)) => paths.push(path),
                        Ok(None) => {}
                        Err(error) => {
                            debug!(processor = %kind, to = dest.chain_id, error = %error, "processor failed");
                            errors.push(ProcessorError {
                                processor: kind,
                                error,
                            });
                        }
                    }
                }
            }
        }

        (paths, errors)
    }

    async fn price_candidate(
        &self,
        input: &RouteInputParams,
        processor: &dyn PathProcessor,
        params: &ProcessorInputParams,
        option: &AmountOption,
        fees: &SuggestedFees,
    ) -> Result<Option<Path>, RouterError> {
        if !processor.available_for(params).await? {
            return Ok(None);
        }

        let (bonder_fees, token_fees) = processor.calculate_fees(params).await?;
        let gas = processor.estimate_gas(params).await?;
        let spender = processor.get_contract_address(params).await?;
        let approval = self.require_approval(input.send_type, spender, params).await?;
        let amount_out = processor.calculate_amount_out(params).await?;
        let packed_data = processor.pack_tx_input_data(params).await?;

        let mut path = Path::new(
            input.uuid.clone(),
            processor.kind(),
            params.from_chain.clone(),
            params.to_chain.clone(),
            params.from_token.clone(),
            params.to_token.clone(),
            option.amount,
        );
        path.amount_in_locked = option.locked;
        path.subtract_fees = option.subtract_fees;
        path.amount_out = amount_out;
        path.community_id = input.community_id().to_string();
        path.tx_bonder_fees = bonder_fees;
        path.tx_token_fees = token_fees;
        path.tx_packed_data = packed_data;
        path.suggested_tx_gas_amount = gas;
        path.used_contract_address = spender;

        path.approval_required = approval.required;
        path.approval_amount_required = approval.amount;
        path.approval_contract_address = spender;
        path.approval_packed_data = approval.packed_data;
        path.suggested_approval_gas_amount = approval.gas;

        self.pricer
            .apply_fees(
                &mut path,
                fees,
                input.gas_fee_mode,
                &input.path_tx_custom_params,
                None,
                input.addr_from,
            )
            .await?;
        Ok(Some(path))
    }

    pub async fn require_approval(
        &self,
        send_type: SendType,
        spender: Option<Address>,
        params: &ProcessorInputParams,
    ) -> Result<Approval, RouterError> {
        if send_type.is_collectibles_transfer()
            || send_type.is_ens_transfer()
            || send_type.is_stickers_transfer()
            || params.from_token.is_native()
        {
            return Ok(Approval::default());
        }
        let Some(spender) = spender else {
            return Ok(Approval::default());
        };

        let chain_id = params.from_chain.chain_id;
        if !self.force_approval {
            let allowance = self
                .chain
                .allowance(chain_id, params.from_token.address, params.from_addr, spender)
                .await?;
            if allowance >= params.amount_in {
                return Ok(Approval::default());
            }
        }

        let packed_data = abi::approve(spender, params.amount_in);
        let gas = self
            .chain
            .estimate_gas(
                chain_id,
                &CallRequest {
                    from: params.from_addr,
                    to: params.from_token.address,
                    value: U256::ZERO,
                    data: packed_data.clone(),
                },
            )
            .await?;
        Ok(Approval {
            required: true,
            amount: params.amount_in,
            gas,
            packed_data,
        })
    }
}
