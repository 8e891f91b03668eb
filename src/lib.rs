// Library root module for wallet-router
// This file defines the public API and module structure for the wallet-router library
// It exports route resolution for multi-chain sends and its collaborators
//
// Numan Thabit 2025 Nov

pub mod abi;
pub mod chain;
pub mod config;
pub mod errors;
pub mod events;
pub mod fees;
pub mod metrics;
pub mod networks;
pub mod processors;
pub mod requests;
pub mod router;
pub mod sendtype;
pub mod token;
pub mod transport;
