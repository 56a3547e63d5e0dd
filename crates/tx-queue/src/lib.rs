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

#![warn(missing_docs)]
//! # Transaction Queue
//!
//! Every transaction the relayer broadcasts from a signing key goes through
//! that key's [`TxQueue`], a mailbox drained by a single worker task, so
//! nonces never race between concurrent requests.
//!
//! Jobs run to completion even when the caller stops waiting for them: an
//! HTTP request timing out must never cancel a transaction that was already
//! broadcast.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use router_relayer_utils::{probe, Error, Result};
use tokio::sync::{mpsc, oneshot};

/// Sending, dry running and awaiting EVM transactions.
pub mod evm;
/// Validating, submitting and awaiting substrate extrinsics.
pub mod substrate;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle to a single-consumer transaction queue.
///
/// Cloning the handle shares the same worker.
#[derive(Clone)]
pub struct TxQueue {
    name: Arc<str>,
    sender: mpsc::Sender<Job>,
}

impl std::fmt::Debug for TxQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxQueue").field("name", &self.name).finish()
    }
}

impl TxQueue {
    /// Spawns the queue worker on the current tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the queue, usually the chain it signs for
    /// * `max_pending` - Jobs that may wait before `submit` waits for a slot
    pub fn spawn(name: impl Into<String>, max_pending: usize) -> Self {
        let (sender, receiver) = mpsc::channel(max_pending.max(1));
        let name: Arc<str> = name.into().into();
        tokio::spawn(run(name.clone(), receiver));
        Self { name, sender }
    }

    /// Name of the queue.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueues `job` and waits for its outcome.
    ///
    /// Dropping the returned future does not cancel the job once it is
    /// enqueued, the worker still runs it and discards the outcome.
    pub async fn submit<T, F>(&self, job: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let name = self.name.clone();
        let job: Job = Box::pin(async move {
            let outcome = job.await;
            if tx.send(outcome).is_err() {
                tracing::event!(
                    target: probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %probe::Kind::TxQueue,
                    queue = %name,
                    detached = true,
                    "caller stopped waiting, job completed anyway",
                );
            }
        });
        self.sender.send(job).await.map_err(|_| Error::QueueClosed)?;
        rx.await.map_err(|_| Error::QueueClosed)?
    }
}

async fn run(name: Arc<str>, mut receiver: mpsc::Receiver<Job>) {
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::TxQueue,
        queue = %name,
        starting = true,
    );
    let mut processed = 0u64;
    while let Some(job) = receiver.recv().await {
        job.await;
        processed += 1;
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::TRACE,
            kind = %probe::Kind::TxQueue,
            queue = %name,
            processed,
        );
    }
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::TxQueue,
        queue = %name,
        stopped = true,
        processed,
    );
}
