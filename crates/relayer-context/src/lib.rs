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
//! # Relayer Context Module 🕸️
//!
//! A module for managing the context of the relayer.
//!
//! The context is built once at startup from the loaded configuration and
//! shared behind an `Arc` by every handler. It never changes afterwards.
//!
//! Each chain has two relayer accounts derived from the same private key:
//! the EVM account, which signs relay and route transactions, and the
//! substrate account of the ecdsa key, `blake2_256(compressed public key)`,
//! which signs `relayAndRouteBatch` extrinsics and pays their fees. The
//! latter is not the account the chain maps the EVM address to, so it has
//! to be funded (and bound to the EVM address for the batched calls) on its
//! own. [`RelayerContext::substrate_account`] tells which account it is.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ethers::core::k256::SecretKey;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider, RetryClientBuilder};
use ethers::signers::{LocalWallet, Signer};
use router_relayer_config::chain::ChainConfig;
use router_relayer_config::RouterRelayerConfig;
use router_relayer_tx_queue::evm::EvmTxOptions;
use router_relayer_tx_queue::substrate::ExtrinsicOptions;
use router_relayer_tx_queue::TxQueue;
use router_relayer_utils::retry::RetryOptions;
use router_relayer_utils::{
    AcalaRuntimeConfig, Error, EvmClient, EvmProvider, Result,
};
use subxt::backend::legacy::LegacyRpcMethods;
use subxt::backend::rpc::RpcClient;
use subxt::utils::AccountId32;
use tokio::sync::broadcast;

mod ethers_retry_policy;

pub use ethers_retry_policy::HttpRetryPolicy;

/// Polling interval of the EVM providers.
const PROVIDER_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Connections and the transaction queue of one chain.
#[derive(Clone)]
struct ChainHandle {
    provider: Arc<EvmProvider>,
    client: Arc<EvmClient>,
    queue: TxQueue,
}

/// RelayerContext contains Relayer's configuration and shutdown signal.
#[derive(Clone)]
pub struct RelayerContext {
    /// The configuration of the relayer.
    pub config: RouterRelayerConfig,
    /// Broadcasts a shutdown signal to all active connections.
    ///
    /// The initial `shutdown` trigger is provided by the `run` caller. The
    /// server is responsible for gracefully shutting down active connections.
    /// When a connection task is spawned, it is passed a broadcast receiver
    /// handle. When a graceful shutdown is initiated, a `()` value is sent via
    /// the broadcast::Sender. Each active connection receives it, reaches a
    /// safe terminal state, and completes the task.
    notify_shutdown: broadcast::Sender<()>,
    /// Per chain providers, signing clients and tx queues, keyed by the
    /// lower-cased chain name.
    chains: HashMap<String, ChainHandle>,
}

impl std::fmt::Debug for RelayerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayerContext")
            .field("chains", &self.chains.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RelayerContext {
    /// Creates a new RelayerContext.
    ///
    /// Builds the EVM provider and wallet of every chain and spawns one
    /// transaction queue per chain, so it must be called from within a
    /// tokio runtime.
    pub fn new(config: RouterRelayerConfig) -> Result<Self> {
        let (notify_shutdown, _) = broadcast::channel(2);
        let mut chains = HashMap::with_capacity(config.chains.len());
        for (name, chain_config) in &config.chains {
            let provider = Arc::new(build_evm_provider(chain_config)?);
            let wallet = build_evm_wallet(chain_config)?;
            tracing::debug!(
                chain = %name,
                relayer = ?wallet.address(),
                "Relayer account ready",
            );
            if chain_config.ws_endpoint.is_some() {
                let signer = build_substrate_signer(chain_config)?;
                tracing::info!(
                    chain = %name,
                    batch_signer = %substrate_account_of(&signer),
                    "Batch extrinsics are signed and paid by this account",
                );
            }
            let client =
                Arc::new(SignerMiddleware::new(provider.clone(), wallet));
            let queue =
                TxQueue::spawn(name.clone(), chain_config.tx_queue.max_pending);
            chains.insert(
                name.clone(),
                ChainHandle {
                    provider,
                    client,
                    queue,
                },
            );
        }
        Ok(Self {
            config,
            notify_shutdown,
            chains,
        })
    }
    /// Returns a broadcast receiver handle for the shutdown signal.
    pub fn shutdown_signal(&self) -> Shutdown {
        Shutdown::new(self.notify_shutdown.subscribe())
    }
    /// Sends a shutdown signal to all subscribed tasks/connections.
    pub fn shutdown(&self) {
        let _ = self.notify_shutdown.send(());
    }

    fn handle(&self, chain: &str) -> Result<&ChainHandle> {
        self.chains
            .get(&chain.to_lowercase())
            .ok_or_else(|| Error::ChainNotFound {
                chain_id: chain.to_string(),
            })
    }

    /// Configuration of the given chain.
    pub fn chain_config(&self, chain: &str) -> Result<&ChainConfig> {
        self.config.chain(chain)
    }

    /// Returns the read-only `EthereumProvider` of the given chain.
    ///
    /// # Arguments
    ///
    /// * `chain` - Name of the chain.
    pub fn evm_provider(&self, chain: &str) -> Result<Arc<EvmProvider>> {
        self.handle(chain).map(|h| h.provider.clone())
    }
    /// Returns the provider of the given chain with the relayer's wallet
    /// attached.
    ///
    /// Transactions sent through it must go through [`Self::tx_queue`].
    pub fn evm_client(&self, chain: &str) -> Result<Arc<EvmClient>> {
        self.handle(chain).map(|h| h.client.clone())
    }
    /// Transaction queue of the relayer's key on the given chain.
    pub fn tx_queue(&self, chain: &str) -> Result<TxQueue> {
        self.handle(chain).map(|h| h.queue.clone())
    }
    /// Settings used when sending EVM transactions on the given chain.
    pub fn evm_tx_options(&self, chain: &str) -> Result<EvmTxOptions> {
        let c = self.chain_config(chain)?;
        Ok(EvmTxOptions {
            chain: c.name.clone(),
            explorer: c.explorer.clone(),
            confirmations: c.tx_queue.confirmations,
            receipt_timeout: c.tx_queue.receipt_timeout(),
        })
    }
    /// Settings used when submitting extrinsics on the given chain.
    pub fn extrinsic_options(&self, chain: &str) -> Result<ExtrinsicOptions> {
        let c = self.chain_config(chain)?;
        Ok(ExtrinsicOptions {
            chain: c.name.clone(),
            finalization_timeout: c.tx_queue.receipt_timeout(),
        })
    }
    /// Options of the retry runner.
    pub fn retry_options(&self) -> RetryOptions {
        self.config.retry.into()
    }

    /// Connects to the substrate node of the given chain.
    ///
    /// Returns the client together with the legacy RPC methods, which
    /// carry the `system_dryRun` call.
    ///
    /// # Arguments
    ///
    /// * `chain` - Name of the chain.
    pub async fn substrate_provider(
        &self,
        chain: &str,
    ) -> Result<(
        subxt::OnlineClient<AcalaRuntimeConfig>,
        LegacyRpcMethods<AcalaRuntimeConfig>,
    )> {
        let node_config = self.chain_config(chain)?;
        let ws_endpoint = node_config.ws_endpoint.as_ref().ok_or_else(|| {
            Error::Relayer {
                msg: format!("no substrate endpoint configured for {chain}"),
                params: None,
            }
        })?;
        let rpc_client = RpcClient::from_url(ws_endpoint.as_str()).await?;
        let rpc = LegacyRpcMethods::new(rpc_client.clone());
        let client = subxt::OnlineClient::from_rpc_client(rpc_client).await?;
        Ok((client, rpc))
    }
    /// Sets up and returns the substrate signer of the relayer on the
    /// given chain.
    ///
    /// Acala style chains bind EVM accounts to ecdsa keys, so the signer is
    /// derived from the same private key as the EVM wallet.
    pub fn substrate_wallet(
        &self,
        chain: &str,
    ) -> Result<subxt_signer::ecdsa::Keypair> {
        build_substrate_signer(self.chain_config(chain)?)
    }

    /// Substrate account of the batch signer on the given chain, the one
    /// that must hold funds for `relayAndRouteBatch`.
    pub fn substrate_account(&self, chain: &str) -> Result<AccountId32> {
        Ok(substrate_account_of(&self.substrate_wallet(chain)?))
    }
}

fn build_substrate_signer(
    chain_config: &ChainConfig,
) -> Result<subxt_signer::ecdsa::Keypair> {
    let private_key = chain_config
        .private_key
        .as_ref()
        .ok_or(Error::MissingSecrets)?;
    subxt_signer::ecdsa::Keypair::from_seed(private_key.to_fixed_bytes())
        .map_err(|e| Error::InvalidSigningKey(format!("{e:?}")))
}

fn substrate_account_of(signer: &subxt_signer::ecdsa::Keypair) -> AccountId32 {
    subxt::tx::Signer::<AcalaRuntimeConfig>::account_id(signer)
}

fn build_evm_provider(chain_config: &ChainConfig) -> Result<EvmProvider> {
    let http = Http::new(chain_config.http_endpoint.as_url().clone());
    let client = RetryClientBuilder::default()
        .rate_limit_retries(10)
        .timeout_retries(3)
        .initial_backoff(Duration::from_millis(500))
        .build(http, HttpRetryPolicy::boxed());
    Ok(Provider::new(client).interval(PROVIDER_POLL_INTERVAL))
}

fn build_evm_wallet(chain_config: &ChainConfig) -> Result<LocalWallet> {
    let private_key = chain_config
        .private_key
        .as_ref()
        .ok_or(Error::MissingSecrets)?;
    let key = SecretKey::from_bytes(private_key.as_bytes().into())?;
    let wallet = LocalWallet::from(key).with_chain_id(chain_config.chain_id);
    Ok(wallet)
}

/// Listens for the server shutdown signal.
///
/// Shutdown is signalled using a `broadcast::Receiver`. Only a single value is
/// ever sent. Once a value has been sent via the broadcast channel, the server
/// should shutdown.
///
/// The `Shutdown` struct listens for the signal and tracks that the signal has
/// been received. Callers may query for whether the shutdown signal has been
/// received or not.
#[derive(Debug)]
pub struct Shutdown {
    /// `true` if the shutdown signal has been received
    shutdown: bool,

    /// The receive half of the channel used to listen for shutdown.
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    /// Create a new `Shutdown` backed by the given `broadcast::Receiver`.
    pub fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            shutdown: false,
            notify,
        }
    }

    /// Returns `true` if the shutdown signal has been received.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Receive the shutdown notice, waiting if necessary.
    pub async fn recv(&mut self) {
        if self.shutdown {
            return;
        }

        // Cannot receive a "lag error" as only one value is ever sent.
        let _ = self.notify.recv().await;

        self.shutdown = true;
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use ethers::types::H256;
    use router_relayer_config::chain::{ContractsConfig, TxQueueConfig};

    use super::*;

    const KEY: &str =
        "0x8075991ce870b93a8870eca0c0f91913d12f47948ca0fd25b49c6fa7cdbeee8b";

    fn karura() -> ChainConfig {
        ChainConfig {
            name: "karura".into(),
            enabled: true,
            chain_id: 686,
            wormhole_chain_id: 11,
            para_id: Some(2000),
            http_endpoint: url::Url::parse("http://localhost:8545")
                .unwrap()
                .into(),
            ws_endpoint: None,
            explorer: None,
            private_key: Some(H256::from_str(KEY).unwrap().into()),
            contracts: ContractsConfig {
                token_bridge: Default::default(),
                fee_registry: Default::default(),
                xcm_router_factory: None,
                wormhole_router_factory: None,
            },
            min_balance: 0.0,
            tx_queue: TxQueueConfig::default(),
        }
    }

    fn context() -> RelayerContext {
        let config = RouterRelayerConfig {
            chains: HashMap::from([("karura".to_string(), karura())]),
            ..Default::default()
        };
        RelayerContext::new(config).unwrap()
    }

    #[tokio::test]
    async fn builds_per_chain_clients() {
        let ctx = context();
        let client = ctx.evm_client("Karura").unwrap();
        let expected = LocalWallet::from_str(KEY.trim_start_matches("0x"))
            .unwrap()
            .address();
        assert_eq!(client.address(), expected);
        assert_eq!(client.signer().chain_id(), 686);
        assert_eq!(ctx.tx_queue("karura").unwrap().name(), "karura");
        assert_eq!(
            ctx.evm_tx_options("karura").unwrap().receipt_timeout,
            TxQueueConfig::default().receipt_timeout()
        );
    }

    #[tokio::test]
    async fn unknown_chain_is_reported() {
        let ctx = context();
        assert!(matches!(
            ctx.evm_provider("moonbeam"),
            Err(Error::ChainNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn substrate_endpoint_is_required_for_batches() {
        let ctx = context();
        let err = ctx.substrate_provider("karura").await.unwrap_err();
        assert_eq!(err.kind(), "RelayerError");
    }

    #[tokio::test]
    async fn batch_signer_is_not_the_evm_mapped_account() {
        let ctx = context();
        let account = ctx.substrate_account("karura").unwrap();
        assert_eq!(account, ctx.substrate_account("Karura").unwrap());

        // default account Acala maps an unclaimed EVM address to
        let evm = ctx.evm_client("karura").unwrap().address();
        let mut mapped = [0u8; 32];
        mapped[..4].copy_from_slice(b"evm:");
        mapped[4..24].copy_from_slice(evm.as_bytes());
        assert_ne!(account, AccountId32(mapped));
    }

    #[tokio::test]
    async fn shutdown_reaches_subscribers() {
        let ctx = context();
        let mut signal = ctx.shutdown_signal();
        ctx.shutdown();
        signal.recv().await;
        assert!(signal.is_shutdown());
    }
}
