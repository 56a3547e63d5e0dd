use std::sync::Arc;

use axum::extract::{Json, State};
use router_relayer_context::RelayerContext;
use router_relayer_tx_relay::health::{health, HealthReport};
use router_relayer_utils::HandlerError;

use crate::ApiResponse;

/// Handles `GET /health`
///
/// Returns the relayer account balance on every enabled chain, and whether
/// all of them are above the configured minimum.
pub async fn handle_health(
    State(ctx): State<Arc<RelayerContext>>,
) -> Result<Json<ApiResponse<HealthReport>>, HandlerError> {
    Ok(ApiResponse::json(health(&ctx).await?))
}

/// Handles `GET /version`
pub async fn handle_version() -> Json<ApiResponse<&'static str>> {
    ApiResponse::json(env!("CARGO_PKG_VERSION"))
}
