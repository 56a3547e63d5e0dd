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

use ethers::providers::Middleware;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::TransactionReceipt;
use router_relayer_utils::clickable_link::ClickableLink;
use router_relayer_utils::{probe, revert_reason, EvmClient, Error, Result};
use url::Url;

/// Interval between two receipt polls.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Per chain settings for sending EVM transactions.
#[derive(Debug, Clone)]
pub struct EvmTxOptions {
    /// Chain name, only used in logs.
    pub chain: String,
    /// Block explorer, used for printing clickable links.
    pub explorer: Option<Url>,
    /// Block confirmations to wait for.
    pub confirmations: usize,
    /// How long to wait for the receipt once the transaction is broadcast.
    pub receipt_timeout: Duration,
}

/// Dry runs, signs, sends `tx` and waits for its receipt.
///
/// Meant to run inside the chain's [`crate::TxQueue`] so nonces are
/// assigned one transaction at a time.
///
/// Returns the receipt of a successful transaction. A reverted transaction,
/// a transaction dropped from the mempool and a receipt that did not show up
/// within `receipt_timeout` are reported as distinct errors, the last one
/// does not mean the transaction failed.
#[tracing::instrument(skip_all, fields(chain = %opts.chain))]
pub async fn send_transaction(
    client: &EvmClient,
    mut tx: TypedTransaction,
    opts: &EvmTxOptions,
) -> Result<TransactionReceipt> {
    client.fill_transaction(&mut tx, None).await?;
    // dry run test
    if let Err(err) = client.call(&tx, None).await {
        let reason = revert_reason(&err);
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::TxQueue,
            ty = "EVM",
            chain = %opts.chain,
            errored = true,
            error = %reason,
            dry_run = "failed",
        );
        return Err(Error::Relayer {
            msg: format!("transaction dry run failed: {reason}"),
            params: Some(serde_json::json!({ "chain": opts.chain })),
        });
    }
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::TxQueue,
        ty = "EVM",
        chain = %opts.chain,
        dry_run = "passed",
    );

    let pending = client.send_transaction(tx, None).await.map_err(|e| {
        tracing::error!("Error while sending tx: {}", e);
        e
    })?;
    let tx_hash_string = format!("0x{:x}", *pending);
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::TxQueue,
        ty = "EVM",
        chain = %opts.chain,
        pending = true,
        tx_hash = %tx_hash_string,
    );
    tracing::info!(
        "Tx {} is submitted and pending!",
        ClickableLink::tx(opts.explorer.as_ref(), &tx_hash_string),
    );

    let waiting = pending
        .interval(RECEIPT_POLL_INTERVAL)
        .confirmations(opts.confirmations);
    let receipt = match tokio::time::timeout(opts.receipt_timeout, waiting)
        .await
    {
        Ok(outcome) => outcome?,
        Err(_) => {
            tracing::warn!(
                "Tx {} has no receipt after {:?}, it may still be mined",
                tx_hash_string,
                opts.receipt_timeout,
            );
            return Err(Error::ReceiptTimeout {
                tx_hash: tx_hash_string,
            });
        }
    };

    let Some(receipt) = receipt else {
        tracing::warn!("Tx {} Dropped from Mempool!!", tx_hash_string);
        return Err(Error::TransactionDropped {
            tx_hash: tx_hash_string,
        });
    };
    match receipt.status {
        Some(v) if v.is_zero() => {
            tracing::info!("Tx {} Failed", tx_hash_string);
            return Err(Error::TransactionReverted {
                tx_hash: tx_hash_string,
            });
        }
        _ => {}
    }

    tracing::info!(
        "Tx {} Finalized",
        ClickableLink::tx(opts.explorer.as_ref(), &tx_hash_string),
    );
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::TxQueue,
        ty = "EVM",
        chain = %opts.chain,
        finalized = true,
        tx_hash = %tx_hash_string,
        block = ?receipt.block_number,
    );
    Ok(receipt)
}
