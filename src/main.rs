use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use wallet_router::chain::{ChainClient, PriceSource, StaticPrices};
use wallet_router::config::AppConfig;
use wallet_router::fees::FeeOracle;
use wallet_router::processors::{HopProcessor, PathProcessor, TransferProcessor};
use wallet_router::router::{create_api_router, Router, RouterDeps};
use wallet_router::token::StaticTokenCatalog;
use wallet_router::transport::{CoinGeckoPrices, RpcChainClient, RpcFeeOracle};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal router error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration")?;
    let endpoints = config.rpc_endpoints().context("parse rpc endpoints")?;
    let networks = config.networks(&endpoints);
    if networks.is_empty() {
        warn!("no configured rpc endpoint matches a supported network");
    }

    let tokens = StaticTokenCatalog::load(&config.token_catalog)
        .with_context(|| format!("load token catalog {}", config.token_catalog.display()))?;

    let chain: Arc<dyn ChainClient> = Arc::new(RpcChainClient::new(endpoints.clone()));
    let fee_oracle: Arc<dyn FeeOracle> = Arc::new(RpcFeeOracle::new(endpoints));

    let prices: Arc<dyn PriceSource> = match &config.prices {
        Some(settings) => Arc::new(CoinGeckoPrices::new(settings.clone())),
        None => {
            warn!("price API not configured; using static prices");
            Arc::new(StaticPrices::new(config.static_prices()))
        }
    };

    let mut processors: Vec<Arc<dyn PathProcessor>> =
        vec![Arc::new(TransferProcessor::new(chain.clone()))];
    if let Some(hop) = &config.hop {
        processors.push(Arc::new(HopProcessor::new(hop.clone())));
    } else {
        warn!("Hop settings not provided; bridging disabled");
    }

    let router = Arc::new(Router::new(
        RouterDeps {
            chain,
            fee_oracle,
            prices,
            tokens: Arc::new(tokens),
            processors,
            networks,
        },
        config.router_settings(),
    ));

    App {
        config: Arc::new(config),
        router,
    }
    .run()
    .await
}

struct App {
    config: Arc<AppConfig>,
    router: Arc<Router>,
}

impl App {
    async fn run(self) -> Result<()> {
        info!(
            testnet_mode = self.config.testnet_mode,
            force_approval = self.config.force_approval,
            chains = self.config.rpc_endpoints.len(),
            "wallet router online"
        );

        let api_router = create_api_router(self.router.clone());
        let listener = tokio::net::TcpListener::bind(self.config.listen_addr)
            .await
            .with_context(|| format!("bind API server address {}", self.config.listen_addr))?;
        info!(address = %self.config.listen_addr, "HTTP API server starting");
        let _api_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, api_router).await {
                warn!(error = %e, "API server error");
            }
        });

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.heartbeat_secs.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let active = self.router.active_route().await;
                    info!(
                        active_route = active.is_some(),
                        watched_chains = ?self.router.watched_chains(),
                        subscribers = self.router.events().receiver_count(),
                        "router heartbeat"
                    );
                    if let Some(uuid) = self.router.events().last_uuid().await {
                        debug!(uuid = %uuid, "last published route");
                    }
                }
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        warn!(error = %err, "ctrl_c listener error");
                    }
                    info!("Shutdown signal received, exiting");
                    if let Some(uuid) = self.router.stop_async() {
                        info!(uuid = %uuid, "stopped background resolution");
                    }
                    break;
                }
            }
        }
        Ok(())
    }
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
