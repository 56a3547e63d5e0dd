use ethers::types::Address;
use router_relayer_types::{private_key::PrivateKey, rpc_url::RpcUrl};

use super::*;

/// ChainConfig is the configuration for one Acala-style chain the relayer
/// relays to and routes from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChainConfig {
    /// String that groups configuration for this chain on a human-readable name.
    ///
    /// Routing tables refer to router chains by this name.
    pub name: String,
    /// Boolean indicating the chain is enabled or not.
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
    /// chain specific id (output of chainId opcode on EVM networks)
    #[serde(rename(serialize = "chainId"))]
    pub chain_id: u64,
    /// Wormhole chain id of this chain, the `targetChain` of VAAs relayed here.
    #[serde(rename(serialize = "wormholeChainId"))]
    pub wormhole_chain_id: u16,
    /// Parachain id of this chain, if any.
    #[serde(rename(serialize = "paraId"))]
    pub para_id: Option<u32>,
    /// Http(s) Endpoint of the EVM JSON-RPC.
    #[serde(skip_serializing)]
    pub http_endpoint: RpcUrl,
    /// Websocket Endpoint of the substrate node.
    ///
    /// Required for submitting batch extrinsics.
    #[serde(skip_serializing)]
    pub ws_endpoint: Option<RpcUrl>,
    /// Block Explorer for this chain.
    ///
    /// Optional, and only used for printing a clickable links
    /// for transactions.
    #[serde(skip_serializing)]
    pub explorer: Option<url::Url>,
    /// The Private Key of the relayer account on this network
    /// the format is more dynamic here:
    /// 1. if it starts with '0x' then this would be raw (64 bytes) hex encoded
    ///    private key.
    ///
    /// 2. if it starts with '$' then it would be considered as an Enviroment variable
    ///    of a hex-encoded private key.
    ///    Example: $KARURA_PRIVATE_KEY
    #[serde(skip_serializing)]
    pub private_key: Option<PrivateKey>,
    /// Deployed contracts the relayer talks to on this chain.
    pub contracts: ContractsConfig,
    /// Minimum native balance of the relayer account for `/health` to
    /// report the chain as healthy, in whole tokens.
    #[serde(default, rename(serialize = "minBalance"))]
    pub min_balance: f64,
    /// TxQueue configuration
    #[serde(skip_serializing, default)]
    pub tx_queue: TxQueueConfig,
}

/// Addresses of the contracts deployed on a chain.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContractsConfig {
    /// Wormhole token bridge.
    #[serde(rename(serialize = "tokenBridge"))]
    pub token_bridge: Address,
    /// Relayer fee registry of the asset router.
    #[serde(rename(serialize = "feeRegistry"))]
    pub fee_registry: Address,
    /// Factory deploying xcm routers.
    #[serde(rename(serialize = "xcmRouterFactory"))]
    pub xcm_router_factory: Option<Address>,
    /// Factory deploying wormhole routers.
    #[serde(rename(serialize = "wormholeRouterFactory"))]
    pub wormhole_router_factory: Option<Address>,
}

/// TxQueueConfig is the configuration for the TxQueue.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TxQueueConfig {
    /// How many submissions may wait in the queue before callers are
    /// back-pressured.
    #[serde(rename(serialize = "maxPending"))]
    pub max_pending: usize,
    /// Seconds to wait for a receipt (or finalization) once a transaction
    /// is broadcast.
    #[serde(rename(serialize = "receiptTimeout"))]
    pub receipt_timeout: u64,
    /// Confirmations to wait for before a receipt is returned.
    pub confirmations: usize,
}

impl Default for TxQueueConfig {
    fn default() -> Self {
        Self {
            max_pending: defaults::tx_queue_max_pending(),
            receipt_timeout: defaults::receipt_timeout(),
            confirmations: 1,
        }
    }
}

impl TxQueueConfig {
    /// Receipt timeout as a [`Duration`].
    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout)
    }
}
