use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query, State};
use ethers::types::{TransactionReceipt, TxHash, H256};
use router_relayer_context::RelayerContext;
use router_relayer_tx_relay::batch::{relay_and_route, relay_and_route_batch};
use router_relayer_tx_relay::params::{
    RelayAndRouteParams, RelayParams, ShouldRelayQuery,
};
use router_relayer_tx_relay::policy::{decide, RelayDecision};
use router_relayer_tx_relay::relay::relay;
use router_relayer_utils::HandlerError;

use super::validated_body;
use crate::ApiResponse;

/// Handles `GET /shouldRelay`.
///
/// Rejections are answers, not errors, and come back with a 200.
pub async fn handle_should_relay(
    State(ctx): State<Arc<RelayerContext>>,
    query: Result<Query<ShouldRelayQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<RelayDecision>>, HandlerError> {
    let Query(q) = query
        .map_err(|e| HandlerError::invalid_params(vec![e.body_text()]))?;
    let decision = decide(
        ctx.config.routing(),
        q.target_chain.as_deref(),
        q.origin_asset.as_deref(),
        q.amount.as_deref(),
    );
    Ok(ApiResponse::json(decision))
}

/// Handles `POST /relay`, returns the receipt of the relay transaction.
pub async fn handle_relay(
    State(ctx): State<Arc<RelayerContext>>,
    body: Result<Json<RelayParams>, JsonRejection>,
) -> Result<Json<ApiResponse<TransactionReceipt>>, HandlerError> {
    let request = validated_body(body)?;
    tracing::debug!(target_chain = request.target_chain, "Relay requested");
    let receipt = relay(&ctx, &request).await?;
    Ok(ApiResponse::json(receipt))
}

/// Handles `POST /relayAndRoute`, returns the relay and route tx hashes.
pub async fn handle_relay_and_route(
    State(ctx): State<Arc<RelayerContext>>,
    body: Result<Json<RelayAndRouteParams>, JsonRejection>,
) -> Result<Json<ApiResponse<[TxHash; 2]>>, HandlerError> {
    let request = validated_body(body)?;
    let hashes = relay_and_route(&ctx, &request).await?;
    Ok(ApiResponse::json(hashes))
}

/// Handles `POST /relayAndRouteBatch`, returns the batch extrinsic hash.
pub async fn handle_relay_and_route_batch(
    State(ctx): State<Arc<RelayerContext>>,
    body: Result<Json<RelayAndRouteParams>, JsonRejection>,
) -> Result<Json<ApiResponse<H256>>, HandlerError> {
    let request = validated_body(body)?;
    let tx_hash = relay_and_route_batch(&ctx, &request).await?;
    Ok(ApiResponse::json(tx_hash))
}
