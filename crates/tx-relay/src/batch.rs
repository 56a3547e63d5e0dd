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

//! Relay a VAA to a router chain, then route the minted tokens.
//!
//! [`relay_and_route`] sends two transactions one after the other.
//! [`relay_and_route_batch`] wraps both EVM calls into a single
//! `Utility.batch_all` extrinsic, so either both land or none does.

use ethers::providers::Middleware;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TxHash, U256};
use router_relayer_config::chain::ChainConfig;
use router_relayer_context::RelayerContext;
use router_relayer_tx_queue::substrate::{
    submit_extrinsic, ExtrinsicHash, ExtrinsicOutcome,
};
use router_relayer_types::vaa::{SignedVaa, TokenTransfer};
use router_relayer_utils::retry::{retry, RetryOptions};
use router_relayer_utils::{probe, revert_reason, EvmClient, Error, Result};
use subxt::dynamic::Value;

use crate::contracts::TokenBridge;
use crate::eligibility::{check_should_relay_before_routing, TokenInfoSource};
use crate::params::RelayAndRouteRequest;
use crate::relay::complete_transfer;
use crate::router::{
    ensure_router_funded, resolve, route, route_transaction, RouterBalance,
    RoutePlan, Xcm,
};

/// Gas limit of the route call when it cannot be estimated, which is the
/// usual case since the router is only funded once the relay runs.
pub const DEFAULT_ROUTE_GAS_LIMIT: u64 = 2_000_000;

struct Prepared {
    plan: RoutePlan,
    router_addr: Address,
}

/// Checks the route, then that the relay pays for itself on the router
/// chain and mints the routed token into the router.
async fn prepare(
    ctx: &RelayerContext,
    request: &RelayAndRouteRequest,
) -> Result<Prepared> {
    let params = || serde_json::to_value(request).unwrap_or_default();
    let transfer = SignedVaa::decode(&request.signed_vaa)
        .and_then(|vaa| vaa.token_transfer())
        .map_err(|e| Error::relay(e.to_string()).with_params(params()))?;
    let (plan, router_addr) = resolve::<Xcm>(ctx, &request.route).await?;
    let chain = ctx.chain_config(&plan.router_chain)?;
    if transfer.to_chain != chain.wormhole_chain_id {
        return Err(Error::relay(format!(
            "VAA targets chain {}, but routing happens on {}",
            transfer.to_chain, chain.name
        ))
        .with_params(params()));
    }
    check_transfer_feeds_route(ctx, chain, &plan, router_addr, &transfer)
        .await?;
    Ok(Prepared { plan, router_addr })
}

/// Fails unless relaying `transfer` leaves the routed token in the router.
async fn check_transfer_feeds_route<S>(
    source: &S,
    chain: &ChainConfig,
    plan: &RoutePlan,
    router_addr: Address,
    transfer: &TokenTransfer,
) -> Result<()>
where
    S: TokenInfoSource + ?Sized,
{
    let recipient = transfer.recipient();
    if recipient != router_addr {
        return Err(Error::relay(format!(
            "VAA pays {recipient:?}, not the router {router_addr:?}"
        ))
        .with_params(serde_json::json!({
            "recipient": recipient,
            "routerAddr": router_addr,
        })));
    }
    let token =
        check_should_relay_before_routing(source, chain, transfer).await?;
    if token != plan.token {
        return Err(Error::relay(format!(
            "VAA mints {token:?}, but the route forwards {:?}",
            plan.token
        ))
        .with_params(serde_json::json!({
            "token": token,
            "routeToken": plan.token,
        })));
    }
    Ok(())
}

/// Polls the router balance until the relayed tokens show up.
async fn wait_until_funded<B>(
    source: &B,
    options: RetryOptions,
    plan: &RoutePlan,
    router_addr: Address,
) -> Result<()>
where
    B: RouterBalance + ?Sized,
{
    retry(options, || ensure_router_funded(source, plan, router_addr)).await
}

/// Relays the VAA, waits for the router to be funded, then routes.
///
/// Returns the relay and the route transaction hashes.
#[tracing::instrument(skip_all, fields(dest_para_id = request.route.dest_para_id))]
pub async fn relay_and_route(
    ctx: &RelayerContext,
    request: &RelayAndRouteRequest,
) -> Result<[TxHash; 2]> {
    let Prepared { plan, router_addr } = prepare(ctx, request).await?;
    let relay_receipt = complete_transfer(
        ctx,
        &plan.router_chain,
        request.signed_vaa.clone(),
    )
    .await?;
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Relay,
        chain = %plan.router_chain,
        tx_hash = ?relay_receipt.transaction_hash,
        relayed = true,
    );
    wait_until_funded(ctx, ctx.retry_options(), &plan, router_addr).await?;
    let route_hash = route(ctx, &plan, router_addr).await?;
    Ok([relay_receipt.transaction_hash, route_hash])
}

/// Relays and routes in one `Utility.batch_all` extrinsic on the router
/// chain, signed with the substrate key bound to the relayer's EVM account.
///
/// Returns the extrinsic hash once finalized.
#[tracing::instrument(skip_all, fields(dest_para_id = request.route.dest_para_id))]
pub async fn relay_and_route_batch(
    ctx: &RelayerContext,
    request: &RelayAndRouteRequest,
) -> Result<ExtrinsicHash> {
    let Prepared { plan, .. } = prepare(ctx, request).await?;
    let chain = ctx.chain_config(&plan.router_chain)?;
    let client = ctx.evm_client(&chain.name)?;

    let mut relay_tx =
        TokenBridge::new(chain.contracts.token_bridge, client.clone())
            .complete_transfer(request.signed_vaa.clone())
            .tx;
    relay_tx.set_from(client.address());
    let mut route_tx = route_transaction(client.clone(), &plan);
    route_tx.set_from(client.address());

    let (gas_price, relay_estimate, route_estimate) = futures::join!(
        client.get_gas_price(),
        client.estimate_gas(&relay_tx, None),
        client.estimate_gas(&route_tx, None),
    );
    let gas_price = gas_price?;
    let (relay_gas, route_gas) = gas_limits(
        relay_estimate.map_err(|e| revert_reason(&e)),
        route_estimate.map_err(|e| revert_reason(&e)),
    )?;
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Batch,
        chain = %chain.name,
        %gas_price,
        %relay_gas,
        %route_gas,
    );

    let batch = subxt::dynamic::tx(
        "Utility",
        "batch_all",
        vec![Value::unnamed_composite(vec![
            eth_call(&relay_tx, gas_price, relay_gas).into_value(),
            eth_call(&route_tx, gas_price, route_gas).into_value(),
        ])],
    );

    let (substrate, rpc) = ctx.substrate_provider(&chain.name).await?;
    let signer = ctx.substrate_wallet(&chain.name)?;
    let opts = ctx.extrinsic_options(&chain.name)?;
    let outcome = ctx
        .tx_queue(&chain.name)?
        .submit(async move {
            submit_extrinsic(&substrate, &rpc, &batch, &signer, &opts).await
        })
        .await?;

    match outcome {
        ExtrinsicOutcome::Success { tx_hash } => {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::Batch,
                chain = %chain.name,
                ?tx_hash,
                finalized = true,
            );
            Ok(tx_hash)
        }
        ExtrinsicOutcome::Failed { tx_hash, reason } => {
            let reason = replay_failure(&client, &[relay_tx, route_tx])
                .await
                .unwrap_or(reason);
            Err(Error::BatchFailed {
                tx_hash: format!("{tx_hash:?}"),
                reason,
            })
        }
    }
}

/// Picks the gas limits of the batched calls.
///
/// The relay must be estimable. The route usually is not, since the router
/// only holds tokens once the relay ran, so it falls back to
/// [`DEFAULT_ROUTE_GAS_LIMIT`].
fn gas_limits(
    relay: std::result::Result<U256, String>,
    route: std::result::Result<U256, String>,
) -> Result<(U256, U256)> {
    let relay = relay.map_err(|reason| Error::GasEstimation { reason })?;
    let route = route.unwrap_or_else(|reason| {
        tracing::debug!(
            "Route gas estimation failed ({}), using {}",
            reason,
            DEFAULT_ROUTE_GAS_LIMIT,
        );
        U256::from(DEFAULT_ROUTE_GAS_LIMIT)
    });
    Ok((relay, route))
}

/// `EVM.eth_call_v2` wrapping an EVM transaction.
fn eth_call(
    tx: &TypedTransaction,
    gas_price: U256,
    gas_limit: U256,
) -> subxt::tx::DynamicPayload {
    let action = match tx.to_addr() {
        Some(to) => Value::unnamed_variant("Call", [Value::from_bytes(to)]),
        None => Value::unnamed_variant("Create", Vec::<Value>::new()),
    };
    let input = tx.data().map(|d| d.to_vec()).unwrap_or_default();
    let value = tx.value().copied().unwrap_or_default();
    subxt::dynamic::tx(
        "EVM",
        "eth_call_v2",
        vec![
            action,
            Value::from_bytes(input),
            Value::u128(value.low_u128()),
            Value::u128(saturating_u64(gas_price).into()),
            Value::u128(saturating_u64(gas_limit).into()),
            Value::unnamed_composite(Vec::<Value>::new()),
        ],
    )
}

fn saturating_u64(v: U256) -> u64 {
    if v > U256::from(u64::MAX) {
        u64::MAX
    } else {
        v.as_u64()
    }
}

/// Replays each call of a failed batch with `eth_call`, the first revert
/// reason found explains the failure better than the dispatch error.
async fn replay_failure(
    client: &EvmClient,
    txs: &[TypedTransaction],
) -> Option<String> {
    for tx in txs {
        if let Err(e) = client.call(tx, None).await {
            return Some(revert_reason(&e));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ethers::types::transaction::eip2718::TypedTransaction;
    use ethers::types::{Address, Bytes, TransactionRequest};
    use router_relayer_config::defaults::{
        PARA_BASILISK, WORMHOLE_ACALA, WORMHOLE_KARURA,
    };

    use super::*;
    use crate::params::XcmRouteRequest;
    use crate::router::tests::{karura_plan, FundedAfter};
    use crate::test_utils::{config, transfer_vaa, StaticTokens, KARURA_USDC};

    /// Recipient of the transfers built by `transfer_vaa`.
    const VAA_RECIPIENT: Address = ethers::types::H160([0x42; 20]);

    fn karura_transfer() -> TokenTransfer {
        SignedVaa::decode(&transfer_vaa(10_000_000, WORMHOLE_KARURA))
            .unwrap()
            .token_transfer()
            .unwrap()
    }

    fn karura() -> ChainConfig {
        config().chain("karura").unwrap().clone()
    }

    fn call_fields(payload: &subxt::tx::DynamicPayload) -> String {
        format!("{:?}", payload.call_data())
    }

    #[test]
    fn eth_call_carries_the_evm_transaction() {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(Address::repeat_byte(0x11))
            .data(Bytes::from(vec![0xde, 0xad]))
            .into();
        let payload = eth_call(&tx, U256::from(100), U256::from(21_000));
        assert_eq!(payload.pallet_name(), "EVM");
        assert_eq!(payload.call_name(), "eth_call_v2");
        let fields = call_fields(&payload);
        assert!(fields.contains("Call"));
        assert!(fields.contains("21000"));
    }

    #[test]
    fn relay_gas_must_be_estimated() {
        let err = gas_limits(
            Err("execution reverted: VAA already redeemed".into()),
            Ok(U256::from(90_000)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "RelayError");
        assert_eq!(
            err.to_string(),
            "failed to estimate gas limit: execution reverted: VAA already redeemed"
        );
    }

    #[test]
    fn route_gas_falls_back_to_the_default() {
        let (relay, route) =
            gas_limits(Ok(U256::from(150_000)), Err("not funded".into()))
                .unwrap();
        assert_eq!(relay, U256::from(150_000));
        assert_eq!(route, U256::from(DEFAULT_ROUTE_GAS_LIMIT));

        let (_, route) =
            gas_limits(Ok(U256::from(150_000)), Ok(U256::from(400_000)))
                .unwrap();
        assert_eq!(route, U256::from(400_000));
    }

    #[tokio::test]
    async fn transfer_must_pay_the_router() {
        let tokens = StaticTokens::fee_on(KARURA_USDC, 6, U256::one());
        let err = check_transfer_feeds_route(
            &tokens,
            &karura(),
            &karura_plan(KARURA_USDC),
            Address::repeat_byte(0x99),
            &karura_transfer(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "RelayError");
        assert!(err.to_string().starts_with("VAA pays"));
        assert_eq!(
            err.params().unwrap()["recipient"],
            serde_json::json!(VAA_RECIPIENT)
        );
        // rejected before any chain read
        assert_eq!(tokens.wrapped_lookups(), 0);
    }

    #[tokio::test]
    async fn transfer_must_mint_the_routed_token() {
        let other = Address::repeat_byte(0x77);
        let tokens = StaticTokens::fee_on(other, 6, U256::one());
        let err = check_transfer_feeds_route(
            &tokens,
            &karura(),
            &karura_plan(KARURA_USDC),
            VAA_RECIPIENT,
            &karura_transfer(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "RelayError");
        assert!(err.to_string().starts_with("VAA mints"));
        let params = err.params().unwrap();
        assert_eq!(params["token"], serde_json::json!(other));
        assert_eq!(params["routeToken"], serde_json::json!(KARURA_USDC));
    }

    #[tokio::test]
    async fn matching_transfer_feeds_the_route() {
        let tokens = StaticTokens::fee_on(KARURA_USDC, 6, U256::one());
        check_transfer_feeds_route(
            &tokens,
            &karura(),
            &karura_plan(KARURA_USDC),
            VAA_RECIPIENT,
            &karura_transfer(),
        )
        .await
        .unwrap();
        assert_eq!(tokens.wrapped_lookups(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_the_relayed_tokens() {
        let balances = FundedAfter::new(3);
        let started = tokio::time::Instant::now();
        wait_until_funded(
            &balances,
            RetryOptions::default(),
            &karura_plan(KARURA_USDC),
            VAA_RECIPIENT,
        )
        .await
        .unwrap();
        assert_eq!(balances.reads(), 4);
        assert!(started.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_on_a_router_that_stays_empty() {
        let balances = FundedAfter::new(usize::MAX);
        let options = RetryOptions {
            times: 3,
            interval: Duration::from_secs(5),
        };
        let err = wait_until_funded(
            &balances,
            options,
            &karura_plan(KARURA_USDC),
            VAA_RECIPIENT,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "RouteError");
        assert_eq!(balances.reads(), 3);
    }

    #[test]
    fn gas_values_saturate() {
        assert_eq!(saturating_u64(U256::MAX), u64::MAX);
        assert_eq!(saturating_u64(U256::from(7)), 7);
    }

    #[tokio::test]
    async fn rejections_come_before_any_broadcast() {
        let ctx = RelayerContext::new(config()).unwrap();
        let request = RelayAndRouteRequest {
            route: XcmRouteRequest {
                origin_addr: KARURA_USDC,
                dest_para_id: 1111,
                dest: vec![0x03].into(),
            },
            signed_vaa: transfer_vaa(10_000_000, WORMHOLE_ACALA).into(),
        };
        // the route is checked first, without touching the network
        let err = relay_and_route_batch(&ctx, &request).await.unwrap_err();
        assert_eq!(err.kind(), "RouteError");
        assert_eq!(err.to_string(), "unsupported dest parachain: 1111");

        let request = RelayAndRouteRequest {
            route: XcmRouteRequest {
                dest_para_id: PARA_BASILISK,
                ..request.route
            },
            signed_vaa: vec![0u8; 3].into(),
        };
        let err = relay_and_route(&ctx, &request).await.unwrap_err();
        assert_eq!(err.kind(), "RelayError");
    }
}
