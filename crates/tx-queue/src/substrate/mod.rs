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

use std::time::Duration;

use router_relayer_utils::{probe, AcalaRuntimeConfig, Error, Result};
use subxt::backend::legacy::rpc_methods::DryRunResult;
use subxt::backend::legacy::LegacyRpcMethods;
use subxt::tx::{Signer, TxPayload, ValidationResult};
use subxt::OnlineClient;

/// Hash type of the extrinsics we submit.
pub type ExtrinsicHash = <AcalaRuntimeConfig as subxt::Config>::Hash;

/// Settings for submitting an extrinsic.
#[derive(Debug, Clone)]
pub struct ExtrinsicOptions {
    /// Chain name, only used in logs.
    pub chain: String,
    /// How long to wait for the extrinsic to be finalized.
    pub finalization_timeout: Duration,
}

/// Final state of a submitted extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtrinsicOutcome {
    /// Included in a finalized block and dispatched successfully.
    Success {
        /// Extrinsic hash.
        tx_hash: ExtrinsicHash,
    },
    /// Included in a finalized block, but the dispatch failed.
    Failed {
        /// Extrinsic hash.
        tx_hash: ExtrinsicHash,
        /// The decoded dispatch error.
        reason: String,
    },
}

/// Signs `call`, checks it against the transaction pool and the runtime,
/// then submits it and waits for finalization.
///
/// A rejection by the validity check or the dispatch dry run never reaches
/// the chain and is returned as [`Error::BatchDryRun`] with the encoded
/// extrinsic. A failure once finalized is returned as
/// [`ExtrinsicOutcome::Failed`] so the caller can dig out a better reason.
#[tracing::instrument(skip_all, fields(chain = %opts.chain))]
pub async fn submit_extrinsic<Call, S>(
    client: &OnlineClient<AcalaRuntimeConfig>,
    rpc: &LegacyRpcMethods<AcalaRuntimeConfig>,
    call: &Call,
    signer: &S,
    opts: &ExtrinsicOptions,
) -> Result<ExtrinsicOutcome>
where
    Call: TxPayload,
    S: Signer<AcalaRuntimeConfig>,
{
    let signed_extrinsic = client
        .tx()
        .create_signed(call, signer, Default::default())
        .await?;
    let encoded = hex::encode(signed_extrinsic.encoded());

    // dry run test
    match signed_extrinsic.validate().await? {
        ValidationResult::Valid(..) => {}
        ValidationResult::Invalid(e) => {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::TxQueue,
                ty = "SUBSTRATE",
                chain = %opts.chain,
                errored = true,
                signed_extrinsic = %encoded,
                dry_run = "transaction_invalid",
            );
            return Err(Error::BatchDryRun {
                extrinsic: format!("0x{encoded}"),
                reason: format!("{e:?}"),
            });
        }
        ValidationResult::Unknown(e) => {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::TxQueue,
                ty = "SUBSTRATE",
                chain = %opts.chain,
                errored = true,
                signed_extrinsic = %encoded,
                dry_run = "transaction_unknown",
            );
            return Err(Error::BatchDryRun {
                extrinsic: format!("0x{encoded}"),
                reason: format!("{e:?}"),
            });
        }
    }

    let dry_run = rpc
        .dry_run(signed_extrinsic.encoded(), None)
        .await?
        .into_dry_run_result(&client.metadata())?;
    match dry_run {
        DryRunResult::Success => {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::TxQueue,
                ty = "SUBSTRATE",
                chain = %opts.chain,
                dry_run = "passed",
            );
        }
        DryRunResult::DispatchError(e) => {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::TxQueue,
                ty = "SUBSTRATE",
                chain = %opts.chain,
                errored = true,
                error = %e,
                signed_extrinsic = %encoded,
                dry_run = "dispatch_error",
            );
            return Err(Error::BatchDryRun {
                extrinsic: format!("0x{encoded}"),
                reason: e.to_string(),
            });
        }
        DryRunResult::TransactionValidityError => {
            return Err(Error::BatchDryRun {
                extrinsic: format!("0x{encoded}"),
                reason: "transaction validity error".into(),
            });
        }
    }

    // submits and returns the transaction subscription
    let progress = signed_extrinsic.submit_and_watch().await.map_err(|e| {
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::TxQueue,
            ty = "SUBSTRATE",
            chain = %opts.chain,
            errored = true,
            error = %e,
            progress = "failed",
        );
        e
    })?;
    let tx_hash = progress.extrinsic_hash();
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::TxQueue,
        ty = "SUBSTRATE",
        chain = %opts.chain,
        status = "Submitted",
        ?tx_hash,
    );

    let in_block = tokio::time::timeout(
        opts.finalization_timeout,
        progress.wait_for_finalized(),
    )
    .await
    .map_err(|_| Error::ReceiptTimeout {
        tx_hash: format!("{tx_hash:?}"),
    })??;
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::TxQueue,
        ty = "SUBSTRATE",
        chain = %opts.chain,
        status = "Finalized",
        ?tx_hash,
        block_hash = ?in_block.block_hash(),
    );

    match in_block.wait_for_success().await {
        Ok(_) => {
            tracing::info!("Extrinsic {:?} Finalized", tx_hash);
            Ok(ExtrinsicOutcome::Success { tx_hash })
        }
        Err(subxt::Error::Runtime(e)) => {
            tracing::warn!("Extrinsic {:?} Failed: {}", tx_hash, e);
            Ok(ExtrinsicOutcome::Failed {
                tx_hash,
                reason: e.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}
