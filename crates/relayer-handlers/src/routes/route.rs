use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query, State};
use ethers::types::TxHash;
use router_relayer_context::RelayerContext;
use router_relayer_tx_relay::router::{
    execute, preview, RouteFamily, ShouldRoute,
};
use router_relayer_utils::HandlerError;

use super::{validated_body, validated_query};
use crate::ApiResponse;

/// Handles `GET /shouldRoute{Name}` for the route family `F`.
///
/// Computes the router address without touching chain state. Requests
/// that cannot be routed are answered with `shouldRoute: false` and the
/// reason.
pub async fn handle_should_route<F: RouteFamily>(
    State(ctx): State<Arc<RelayerContext>>,
    query: Result<Query<F::Params>, QueryRejection>,
) -> Result<Json<ApiResponse<ShouldRoute>>, HandlerError> {
    let request = validated_query(query)?;
    let outcome =
        preview::<F, RelayerContext>(&ctx.config, ctx.as_ref(), &request)
            .await?;
    Ok(ApiResponse::json(ShouldRoute::from(outcome)))
}

/// Handles `POST /route{Name}` for the route family `F`, returns the hash
/// of the deploy-and-route transaction.
pub async fn handle_route<F: RouteFamily>(
    State(ctx): State<Arc<RelayerContext>>,
    body: Result<Json<F::Params>, JsonRejection>,
) -> Result<Json<ApiResponse<TxHash>>, HandlerError> {
    let request = validated_body(body)?;
    tracing::debug!(family = F::NAME, ?request, "Route requested");
    let tx_hash = execute::<F>(&ctx, &request).await?;
    Ok(ApiResponse::json(tx_hash))
}
