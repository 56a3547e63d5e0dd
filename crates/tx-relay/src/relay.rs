use ethers::types::{Bytes, TransactionReceipt};
use router_relayer_context::RelayerContext;
use router_relayer_tx_queue::evm::send_transaction;
use router_relayer_types::vaa::SignedVaa;
use router_relayer_utils::{probe, Error, Result};

use crate::contracts::TokenBridge;
use crate::params::RelayRequest;
use crate::policy::decide_transfer;

/// Relays a signed VAA to the chain it targets.
///
/// The transfer must target the chain named in the request, pass the relay
/// policy and not be redeemed yet. The `completeTransfer` transaction goes
/// through the chain's tx queue, and its receipt is returned.
#[tracing::instrument(skip_all, fields(target_chain = request.target_chain))]
pub async fn relay(
    ctx: &RelayerContext,
    request: &RelayRequest,
) -> Result<TransactionReceipt> {
    let params = || serde_json::to_value(request).unwrap_or_default();
    let vaa = SignedVaa::decode(&request.signed_vaa)
        .map_err(|e| Error::relay(e.to_string()).with_params(params()))?;
    let transfer = vaa
        .token_transfer()
        .map_err(|e| Error::relay(e.to_string()).with_params(params()))?;
    if transfer.to_chain != request.target_chain {
        return Err(Error::relay(format!(
            "VAA targets chain {}, not {}",
            transfer.to_chain, request.target_chain
        ))
        .with_params(params()));
    }
    let chain = ctx
        .config
        .chain_by_wormhole_id(request.target_chain)
        .filter(|c| c.enabled)
        .ok_or_else(|| {
            Error::relay("target chain not supported").with_params(params())
        })?;

    let decision = decide_transfer(ctx.config.routing(), &transfer);
    if !decision.should_relay {
        return Err(Error::relay(decision.msg).with_params(params()));
    }

    let provider = ctx.evm_provider(&chain.name)?;
    let redeemed = TokenBridge::new(chain.contracts.token_bridge, provider)
        .is_transfer_completed(vaa.digest().to_fixed_bytes())
        .call()
        .await?;
    if redeemed {
        return Err(Error::relay("VAA already redeemed").with_params(params()));
    }

    let receipt =
        complete_transfer(ctx, &chain.name, request.signed_vaa.clone()).await?;
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Relay,
        chain = %chain.name,
        sequence = vaa.sequence,
        tx_hash = ?receipt.transaction_hash,
        relayed = true,
    );
    Ok(receipt)
}

/// Sends `completeTransfer(signed_vaa)` on `chain` through its tx queue and
/// waits for the receipt.
pub async fn complete_transfer(
    ctx: &RelayerContext,
    chain: &str,
    signed_vaa: Bytes,
) -> Result<TransactionReceipt> {
    let token_bridge = ctx.chain_config(chain)?.contracts.token_bridge;
    let client = ctx.evm_client(chain)?;
    let tx = TokenBridge::new(token_bridge, client.clone())
        .complete_transfer(signed_vaa)
        .tx;
    let opts = ctx.evm_tx_options(chain)?;
    ctx.tx_queue(chain)?
        .submit(async move { send_transaction(&client, tx, &opts).await })
        .await
}

#[cfg(test)]
mod tests {
    use router_relayer_config::defaults::{WORMHOLE_ACALA, WORMHOLE_KARURA};

    use super::*;
    use crate::test_utils::{config, transfer_vaa};

    async fn relay_err(request: RelayRequest) -> Error {
        let ctx = RelayerContext::new(config()).unwrap();
        relay(&ctx, &request).await.unwrap_err()
    }

    #[tokio::test]
    async fn mismatched_target_chain_is_rejected() {
        let err = relay_err(RelayRequest {
            target_chain: WORMHOLE_ACALA,
            signed_vaa: transfer_vaa(10_000_000, WORMHOLE_KARURA).into(),
        })
        .await;
        assert_eq!(err.kind(), "RelayError");
        assert_eq!(err.to_string(), "VAA targets chain 11, not 12");
        assert_eq!(err.params().unwrap()["targetChain"], WORMHOLE_ACALA);
    }

    #[tokio::test]
    async fn policy_rejections_carry_the_request() {
        let err = relay_err(RelayRequest {
            target_chain: WORMHOLE_KARURA,
            signed_vaa: transfer_vaa(9_999_999, WORMHOLE_KARURA).into(),
        })
        .await;
        assert_eq!(
            err.to_string(),
            "transfer amount too small, expect at least 10000000"
        );
        assert!(err.params().unwrap()["signedVAA"].is_string());
    }

    #[tokio::test]
    async fn garbage_vaa_is_a_relay_error() {
        let err = relay_err(RelayRequest {
            target_chain: WORMHOLE_KARURA,
            signed_vaa: vec![1, 2, 3].into(),
        })
        .await;
        assert_eq!(err.kind(), "RelayError");
    }

    #[tokio::test]
    async fn unserved_chain_is_rejected() {
        let err = relay_err(RelayRequest {
            target_chain: 2,
            signed_vaa: transfer_vaa(10_000_000, 2).into(),
        })
        .await;
        assert_eq!(err.to_string(), "target chain not supported");
    }
}
