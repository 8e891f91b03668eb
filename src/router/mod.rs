// Router module - route resolution plane
// This file wires the allocator, candidate generator, graph enumerator,
// selector, balance validator, fee resolver and live update loop
//
// Numan Thabit 2025 Nov

pub mod allocator;
pub mod api;
pub mod candidates;
pub mod graph;
pub mod pricing;
pub mod routes;
pub mod selector;
pub mod updates;
pub mod validator;

#[allow(clippy::module_inception)]
pub mod router;

pub use api::create_api_router;
pub use router::{Router, RouterDeps, RouterSettings};
pub use routes::{Path, Route, SuggestedRoutes, SuggestedRoutesResponse};
