// Transport layer
// Ethereum JSON-RPC plumbing and the HTTP price source
//
// Numan Thabit 2025 Nov

pub mod eth;
pub mod jsonrpc;
pub mod prices;

pub use eth::{RpcChainClient, RpcEndpoints, RpcFeeOracle};
pub use prices::{CoinGeckoPrices, PriceSettings};
