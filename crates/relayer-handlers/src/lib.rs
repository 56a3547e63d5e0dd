// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Relayer handlers for HTTP calls

#![warn(missing_docs)]
use std::sync::Arc;

use axum::http::{Method, Uri};
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use router_relayer_context::RelayerContext;
use router_relayer_tx_relay::router::{RouteFamily, Wormhole, Xcm};
use router_relayer_utils::HandlerError;
use serde::Serialize;

/// Module handles relayer API
pub mod routes;

/// Successful response envelope, `{ "data": ... }`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// The payload.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wraps `data` as a JSON response.
    pub fn json(data: T) -> axum::Json<Self> {
        axum::Json(Self { data })
    }
}

/// Builds the relayer API.
///
/// Every route family is mounted as `GET /shouldRoute{Name}` and
/// `POST /route{Name}`. Unknown paths, and known paths with the wrong
/// method, get the same 404 envelope.
pub fn build_routes(ctx: Arc<RelayerContext>) -> Router {
    use routes::{info, relay};

    Router::new()
        .route("/shouldRelay", only(get(relay::handle_should_relay)))
        .route("/relay", only(post(relay::handle_relay)))
        .route("/relayAndRoute", only(post(relay::handle_relay_and_route)))
        .route(
            "/relayAndRouteBatch",
            only(post(relay::handle_relay_and_route_batch)),
        )
        .merge(family_routes::<Xcm>())
        .merge(family_routes::<Wormhole>())
        .route("/health", only(get(info::handle_health)))
        .route("/version", only(get(info::handle_version)))
        .fallback(handle_not_supported)
        .with_state(ctx)
}

fn family_routes<F: RouteFamily>() -> Router<Arc<RelayerContext>> {
    use routes::route;

    Router::new()
        .route(
            &format!("/shouldRoute{}", F::NAME),
            only(get(route::handle_should_route::<F>)),
        )
        .route(
            &format!("/route{}", F::NAME),
            only(post(route::handle_route::<F>)),
        )
}

fn only(
    method_router: MethodRouter<Arc<RelayerContext>>,
) -> MethodRouter<Arc<RelayerContext>> {
    method_router.fallback(handle_not_supported)
}

async fn handle_not_supported(method: Method, uri: Uri) -> HandlerError {
    HandlerError::not_supported(method.as_str(), uri.path())
}
