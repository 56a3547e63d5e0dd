use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use ethers::types::{Address, H160, H256, U256};
use router_relayer_config::chain::{ChainConfig, ContractsConfig, TxQueueConfig};
use router_relayer_config::defaults::{
    routing_tables, WORMHOLE_ACALA, WORMHOLE_BSC, WORMHOLE_KARURA,
};
use router_relayer_config::RouterRelayerConfig;
use router_relayer_utils::Result;

use crate::eligibility::TokenInfoSource;

/// Testnet USDC on Karura.
pub const KARURA_USDC: Address = H160([
    0xe2, 0x06, 0x83, 0xad, 0x1e, 0xd8, 0xbb, 0xee, 0xd7, 0xe1, 0xae, 0x74,
    0xbe, 0x10, 0xf1, 0x9d, 0x80, 0x45, 0xb5, 0x30,
]);

pub const BSC_USDT: &str = "0x337610d27c682e347c9cd60bd4b3b107c9d34ddd";

fn chain(name: &str, wormhole_chain_id: u16, seed: u8) -> ChainConfig {
    ChainConfig {
        name: name.into(),
        enabled: true,
        chain_id: 595,
        wormhole_chain_id,
        para_id: None,
        http_endpoint: url::Url::parse("http://localhost:8545")
            .unwrap()
            .into(),
        ws_endpoint: None,
        explorer: None,
        private_key: Some(H256::repeat_byte(0x11).into()),
        contracts: ContractsConfig {
            token_bridge: Address::repeat_byte(seed),
            fee_registry: Address::repeat_byte(seed + 1),
            xcm_router_factory: Some(Address::repeat_byte(seed + 2)),
            wormhole_router_factory: Some(Address::repeat_byte(seed + 3)),
        },
        min_balance: 0.0,
        tx_queue: TxQueueConfig::default(),
    }
}

/// Testnet config serving karura and acala.
pub fn config() -> RouterRelayerConfig {
    RouterRelayerConfig {
        testnet: true,
        chains: HashMap::from([
            ("karura".to_string(), chain("karura", WORMHOLE_KARURA, 0x10)),
            ("acala".to_string(), chain("acala", WORMHOLE_ACALA, 0x20)),
        ]),
        routing: Some(routing_tables(true)),
        ..Default::default()
    }
}

/// A signed VAA carrying a plain token transfer of `amount` BSC testnet
/// USDT to `to_chain`.
pub fn transfer_vaa(amount: u64, to_chain: u16) -> Vec<u8> {
    let mut payload = vec![1u8];
    let mut word = [0u8; 32];
    U256::from(amount).to_big_endian(&mut word);
    payload.extend_from_slice(&word);
    let token: Address = BSC_USDT.parse().unwrap();
    payload.extend_from_slice(H256::from(token).as_bytes());
    payload.extend_from_slice(&WORMHOLE_BSC.to_be_bytes());
    let recipient = H256::from(Address::repeat_byte(0x42));
    payload.extend_from_slice(recipient.as_bytes());
    payload.extend_from_slice(&to_chain.to_be_bytes());
    payload.extend_from_slice(&[0u8; 32]);

    let mut vaa = vec![1u8];
    vaa.extend_from_slice(&0u32.to_be_bytes());
    vaa.push(1);
    vaa.push(0);
    vaa.extend_from_slice(&[7u8; 65]);
    vaa.extend_from_slice(&1_700_000_000u32.to_be_bytes());
    vaa.extend_from_slice(&0u32.to_be_bytes());
    vaa.extend_from_slice(&WORMHOLE_BSC.to_be_bytes());
    vaa.extend_from_slice(&[9u8; 32]);
    vaa.extend_from_slice(&1u64.to_be_bytes());
    vaa.push(15);
    vaa.extend_from_slice(&payload);
    vaa
}

/// Token facts answered from memory.
#[derive(Default)]
pub struct StaticTokens {
    pub wrapped: Address,
    pub decimals: u8,
    pub fees: HashMap<Address, U256>,
    pub(crate) lookups: AtomicUsize,
}

impl StaticTokens {
    /// `token` is what transfers mint, and the only token with a fee.
    pub fn fee_on(token: Address, decimals: u8, fee: U256) -> Self {
        Self {
            wrapped: token,
            decimals,
            fees: HashMap::from([(token, fee)]),
            ..Default::default()
        }
    }

    pub fn wrapped_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TokenInfoSource for StaticTokens {
    async fn wrapped_asset(
        &self,
        _chain: &str,
        _token_bridge: Address,
        _token_chain: u16,
        _token_address: H256,
    ) -> Result<Address> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.wrapped)
    }

    async fn decimals(&self, _chain: &str, _token: Address) -> Result<u8> {
        Ok(self.decimals)
    }

    async fn relayer_fee(
        &self,
        _chain: &str,
        _fee_registry: Address,
        token: Address,
    ) -> Result<U256> {
        Ok(self.fees.get(&token).copied().unwrap_or_default())
    }
}
