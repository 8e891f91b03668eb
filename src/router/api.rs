// Router HTTP API implementation
// This file provides HTTP endpoints for route resolution, the background
// resolution slot, active route adjustments and the event stream
//
// Numan Thabit 2025 Nov

use crate::errors::{ErrorResponse, RouterError};
use crate::fees::GasFeeMode;
use crate::metrics;
use crate::requests::{PathTxCustomParams, PathTxIdentity, RouteInputParams};
use crate::router::routes::{SuggestedRoutes, SuggestedRoutesResponse};
use crate::router::Router;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
    routing::{get, post},
    Router as AxumRouter,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize, Deserialize)]
pub struct AsyncResolveResponse {
    pub uuid: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopResponse {
    pub stopped: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeModeRequest {
    pub identity: PathTxIdentity,
    pub gas_fee_mode: GasFeeMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTxRequest {
    pub identity: PathTxIdentity,
    pub params: PathTxCustomParams,
}

/// Create the HTTP router with API endpoints
pub fn create_api_router(router: Arc<Router>) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .route("/api/v1/routes", post(resolve_routes))
        .route("/api/v1/routes/async", post(resolve_routes_async))
        .route("/api/v1/routes/stop", post(stop_resolution))
        .route(
            "/api/v1/routes/active",
            get(get_active_route).delete(clear_active_route),
        )
        .route("/api/v1/routes/fee-mode", post(set_fee_mode))
        .route("/api/v1/routes/custom-tx", post(set_custom_tx))
        .route("/api/v1/events", get(route_events))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(router)
}

fn status_for(error: &RouterError) -> StatusCode {
    let code = error.code();
    match error {
        RouterError::Transport(_) | RouterError::Provider(_) => StatusCode::BAD_GATEWAY,
        RouterError::CannotCustomizeIfNoRoute | RouterError::CannotFindPathForProvidedIdentity => {
            StatusCode::NOT_FOUND
        }
        _ if code.starts_with("WRR") || code.starts_with("WRC") => StatusCode::BAD_REQUEST,
        RouterError::CustomFeeModeCannotBeSetThisWay
        | RouterError::OnlyCustomFeeModeCanBeSetThisWay => StatusCode::BAD_REQUEST,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn api_error(error: &RouterError) -> ApiError {
    (status_for(error), Json(error.to_response()))
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn render_metrics() -> Result<impl IntoResponse, StatusCode> {
    let body = metrics::render().map_err(|err| {
        warn!(error = %err, "metrics encoding failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

/// Synchronous resolution. Failures still carry candidates and, for
/// balance errors, the fallback route.
async fn resolve_routes(
    State(router): State<Arc<Router>>,
    Json(input): Json<RouteInputParams>,
) -> (StatusCode, Json<SuggestedRoutesResponse>) {
    let uuid = input.uuid.clone();
    match router.resolve(input).await {
        Ok(routes) => (
            StatusCode::OK,
            Json(SuggestedRoutesResponse::new(uuid, Some(&routes), None)),
        ),
        Err(failure) => (
            status_for(&failure.error),
            Json(SuggestedRoutesResponse::new(
                uuid,
                failure.routes.as_deref(),
                Some(&failure.error),
            )),
        ),
    }
}

async fn resolve_routes_async(
    State(router): State<Arc<Router>>,
    Json(input): Json<RouteInputParams>,
) -> (StatusCode, Json<AsyncResolveResponse>) {
    let uuid = router.resolve_async(input);
    (StatusCode::ACCEPTED, Json(AsyncResolveResponse { uuid }))
}

async fn stop_resolution(State(router): State<Arc<Router>>) -> Json<StopResponse> {
    Json(StopResponse {
        stopped: router.stop_async(),
    })
}

async fn get_active_route(
    State(router): State<Arc<Router>>,
) -> Result<Json<SuggestedRoutes>, ApiError> {
    router
        .active_route()
        .await
        .map(Json)
        .ok_or_else(|| api_error(&RouterError::CannotCustomizeIfNoRoute))
}

async fn clear_active_route(State(router): State<Arc<Router>>) -> StatusCode {
    router.clear_active_route().await;
    StatusCode::NO_CONTENT
}

async fn set_fee_mode(
    State(router): State<Arc<Router>>,
    Json(req): Json<FeeModeRequest>,
) -> Result<Json<SuggestedRoutesResponse>, ApiError> {
    router
        .set_fee_mode(&req.identity, req.gas_fee_mode)
        .await
        .map(Json)
        .map_err(|e| api_error(&e))
}

async fn set_custom_tx(
    State(router): State<Arc<Router>>,
    Json(req): Json<CustomTxRequest>,
) -> Result<Json<SuggestedRoutesResponse>, ApiError> {
    router
        .set_custom_tx_details(&req.identity, req.params)
        .await
        .map(Json)
        .map_err(|e| api_error(&e))
}

/// Server-sent stream of route events. Lagging subscribers skip ahead.
async fn route_events(
    State(router): State<Arc<Router>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(router.subscribe()).filter_map(|item| {
        let event = item.ok()?;
        match Event::default().event("routes").json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(err) => {
                warn!(error = %err, "route event encoding failed");
                None
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
