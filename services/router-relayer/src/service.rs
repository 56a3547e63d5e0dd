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

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use router_relayer_context::RelayerContext;
use router_relayer_handlers::build_routes;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// The relayer API with its middleware stack.
///
/// Requests running longer than the configured request timeout are
/// answered with a `408`, transactions they already queued still complete.
pub fn build_app(ctx: Arc<RelayerContext>) -> Router {
    let request_timeout = ctx.config.request_timeout();
    build_routes(ctx)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Serves the relayer API until the context signals shutdown.
///
/// # Arguments
///
/// * `ctx` - RelayContext reference that holds the configuration
pub async fn build_web_services(ctx: Arc<RelayerContext>) -> crate::Result<()> {
    let socket_addr = SocketAddr::new([0, 0, 0, 0].into(), ctx.config.port);
    let mut shutdown = ctx.shutdown_signal();
    let app = build_app(ctx).into_make_service();

    tracing::info!("Starting the server on {}", socket_addr);
    axum::Server::try_bind(&socket_addr)?
        .serve(app)
        .with_graceful_shutdown(async move { shutdown.recv().await })
        .await?;
    Ok(())
}
