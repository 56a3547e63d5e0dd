/// Module for handling relayer health and version API
pub mod info;
/// Module for handling VAA relaying API
pub mod relay;
/// Module for handling router preview and execution API
pub mod route;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use router_relayer_tx_relay::params::Validate;
use router_relayer_utils::HandlerError;

/// Validates a query extracted by axum into a typed request.
pub(crate) fn validated_query<P: Validate>(
    query: Result<Query<P>, QueryRejection>,
) -> Result<P::Output, HandlerError> {
    let Query(params) = query
        .map_err(|e| HandlerError::invalid_params(vec![e.body_text()]))?;
    params.validate().map_err(HandlerError::invalid_params)
}

/// Validates a JSON body extracted by axum into a typed request.
pub(crate) fn validated_body<P: Validate>(
    body: Result<Json<P>, JsonRejection>,
) -> Result<P::Output, HandlerError> {
    let Json(params) =
        body.map_err(|e| HandlerError::invalid_params(vec![e.body_text()]))?;
    params.validate().map_err(HandlerError::invalid_params)
}
