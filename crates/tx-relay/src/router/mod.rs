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

//! Routing through one-time router contracts.
//!
//! A router is deployed by a factory at an address derived from the
//! routing instructions, so the address can be previewed before any funds
//! move. Once funded, a single transaction deploys the router and makes it
//! forward its whole balance, after which the router is gone.

use std::sync::Arc;

use ethers::providers::Middleware;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TxHash, U256};
use router_relayer_config::chain::ChainConfig;
use router_relayer_config::RouterRelayerConfig;
use router_relayer_context::RelayerContext;
use router_relayer_tx_queue::evm::send_transaction;
use router_relayer_utils::{probe, Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::contracts::{
    WormholeInstructions, WormholeRouterFactory, XcmInstructions,
    XcmRouterFactory, IERC20,
};
use crate::params::Validate;

mod resolver;
mod wormhole;
mod xcm;

pub use resolver::RouterFactory;
pub use wormhole::Wormhole;
pub use xcm::Xcm;

/// Instructions a router is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteInstructions {
    /// Forward over xcm to a parachain.
    Xcm(XcmInstructions),
    /// Bridge out through the wormhole token bridge.
    Wormhole {
        /// Destination of the transfer.
        instructions: WormholeInstructions,
        /// Token bridge on the router chain.
        token_bridge: Address,
    },
}

/// A request that cannot be routed. Not an error, preview endpoints answer
/// with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRejection {
    /// Why the request cannot be routed.
    pub msg: String,
}

impl RouteRejection {
    /// Creates a rejection.
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Everything needed to resolve and execute a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    /// Name of the chain hosting the router.
    pub router_chain: String,
    /// Wormhole chain id of the router chain.
    pub router_chain_id: u16,
    /// Router factory on the router chain.
    pub factory: Address,
    /// Fee registry on the router chain.
    pub fee_registry: Address,
    /// Instructions the router is created with.
    pub instructions: RouteInstructions,
    /// Token the router forwards.
    pub token: Address,
}

impl RoutePlan {
    fn rejection_error(msg: String, request: &impl Serialize) -> Error {
        Error::route(msg)
            .with_params(serde_json::to_value(request).unwrap_or_default())
    }
}

/// A routable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePreview {
    /// Where the router will be deployed, and where funds must be sent.
    pub router_addr: Address,
    /// Wormhole chain id of the router chain.
    pub router_chain_id: u16,
}

/// Body of the `shouldRoute*` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShouldRoute {
    /// Whether the request can be routed.
    pub should_route: bool,
    /// Router address to fund.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_addr: Option<Address>,
    /// Wormhole chain id of the router chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_chain_id: Option<u16>,
    /// Why the request cannot be routed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl From<std::result::Result<RoutePreview, RouteRejection>> for ShouldRoute {
    fn from(value: std::result::Result<RoutePreview, RouteRejection>) -> Self {
        match value {
            Ok(p) => Self {
                should_route: true,
                router_addr: Some(p.router_addr),
                router_chain_id: Some(p.router_chain_id),
                msg: None,
            },
            Err(r) => Self {
                should_route: false,
                router_addr: None,
                router_chain_id: None,
                msg: Some(r.msg),
            },
        }
    }
}

/// A routing product, mounted as `GET /shouldRoute{NAME}` and
/// `POST /route{NAME}`.
pub trait RouteFamily: Send + Sync + 'static {
    /// Name used in the endpoint paths.
    const NAME: &'static str;
    /// Raw request parameters.
    type Params: DeserializeOwned
        + Validate<Output = Self::Request>
        + Send
        + 'static;
    /// Validated request.
    type Request: Serialize + std::fmt::Debug + Send + Sync + 'static;

    /// Checks the request against the routing tables and picks the router
    /// chain and the router instructions. Pure.
    fn plan(
        config: &RouterRelayerConfig,
        request: &Self::Request,
    ) -> std::result::Result<RoutePlan, RouteRejection>;
}

/// Computes where the router of `request` would be deployed, without
/// touching chain state.
pub async fn preview<F, R>(
    config: &RouterRelayerConfig,
    factory: &R,
    request: &F::Request,
) -> Result<std::result::Result<RoutePreview, RouteRejection>>
where
    F: RouteFamily,
    R: RouterFactory + ?Sized,
{
    let plan = match F::plan(config, request) {
        Ok(plan) => plan,
        Err(rejection) => return Ok(Err(rejection)),
    };
    let router_addr = factory
        .router_address(
            &plan.router_chain,
            plan.factory,
            plan.fee_registry,
            &plan.instructions,
        )
        .await?;
    Ok(router_addr.map(|router_addr| RoutePreview {
        router_addr,
        router_chain_id: plan.router_chain_id,
    }))
}

/// Resolves the plan and router address of an executable request,
/// rejections become route errors.
pub async fn resolve<F: RouteFamily>(
    ctx: &RelayerContext,
    request: &F::Request,
) -> Result<(RoutePlan, Address)> {
    let plan = F::plan(&ctx.config, request)
        .map_err(|r| RoutePlan::rejection_error(r.msg, request))?;
    let router_addr = ctx
        .router_address(
            &plan.router_chain,
            plan.factory,
            plan.fee_registry,
            &plan.instructions,
        )
        .await?
        .map_err(|r| RoutePlan::rejection_error(r.msg, request))?;
    Ok((plan, router_addr))
}

/// Deploys the router of `request` and routes the funds it holds.
///
/// The router must already hold the token, an empty router means it was
/// never funded or was already used, and is reported as a route error.
#[tracing::instrument(skip_all, fields(family = F::NAME))]
pub async fn execute<F: RouteFamily>(
    ctx: &RelayerContext,
    request: &F::Request,
) -> Result<TxHash> {
    let (plan, router_addr) = resolve::<F>(ctx, request).await?;
    ensure_router_funded(ctx, &plan, router_addr).await?;
    route(ctx, &plan, router_addr).await
}

/// Token balances of routers.
#[async_trait::async_trait]
pub trait RouterBalance: Send + Sync {
    /// Amount of `token` held by `holder` on `chain`.
    async fn token_balance(
        &self,
        chain: &str,
        token: Address,
        holder: Address,
    ) -> Result<U256>;
}

#[async_trait::async_trait]
impl RouterBalance for RelayerContext {
    async fn token_balance(
        &self,
        chain: &str,
        token: Address,
        holder: Address,
    ) -> Result<U256> {
        let provider = self.evm_provider(chain)?;
        Ok(IERC20::new(token, provider).balance_of(holder).call().await?)
    }
}

/// Fails unless the router address holds some of the routed token.
pub async fn ensure_router_funded<B>(
    source: &B,
    plan: &RoutePlan,
    router_addr: Address,
) -> Result<()>
where
    B: RouterBalance + ?Sized,
{
    let balance = source
        .token_balance(&plan.router_chain, plan.token, router_addr)
        .await?;
    if balance.is_zero() {
        return Err(Error::Route {
            msg: format!(
                "router {router_addr:?} holds no {:?}, it is not funded yet or was already routed",
                plan.token
            ),
            params: Some(serde_json::json!({
                "routerAddr": router_addr,
                "token": plan.token,
            })),
        });
    }
    tracing::debug!(?router_addr, %balance, "Router is funded");
    Ok(())
}

/// Sends the deploy-and-route transaction of `plan` through the router
/// chain's tx queue and waits for it.
pub async fn route(
    ctx: &RelayerContext,
    plan: &RoutePlan,
    router_addr: Address,
) -> Result<TxHash> {
    let client = ctx.evm_client(&plan.router_chain)?;
    let tx = route_transaction(client.clone(), plan);
    let opts = ctx.evm_tx_options(&plan.router_chain)?;
    let receipt = ctx
        .tx_queue(&plan.router_chain)?
        .submit(async move { send_transaction(&client, tx, &opts).await })
        .await?;
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Route,
        chain = %plan.router_chain,
        ?router_addr,
        tx_hash = ?receipt.transaction_hash,
        routed = true,
    );
    Ok(receipt.transaction_hash)
}

/// Unsigned deploy-and-route transaction of `plan`.
pub fn route_transaction<M: Middleware>(
    client: Arc<M>,
    plan: &RoutePlan,
) -> TypedTransaction {
    match &plan.instructions {
        RouteInstructions::Xcm(inst) => {
            XcmRouterFactory::new(plan.factory, client)
                .deploy_xcm_router_and_route(
                    plan.fee_registry,
                    inst.clone(),
                    plan.token,
                )
                .tx
        }
        RouteInstructions::Wormhole {
            instructions,
            token_bridge,
        } => {
            WormholeRouterFactory::new(plan.factory, client)
                .deploy_wormhole_router_and_route(
                    plan.fee_registry,
                    instructions.clone(),
                    *token_bridge,
                    plan.token,
                )
                .tx
        }
    }
}

/// Configuration of a router chain, a chain the relayer does not serve
/// cannot host routers.
fn router_chain<'a>(
    config: &'a RouterRelayerConfig,
    name: &str,
) -> std::result::Result<&'a ChainConfig, RouteRejection> {
    config.chain(name).map_err(|_| {
        RouteRejection::new(format!("router chain {name} is not available"))
    })
}
