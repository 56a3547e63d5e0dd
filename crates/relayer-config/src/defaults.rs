use ethers::types::Address;

use crate::routing::{
    RelayTokens, RoutingTables, TokenThreshold, WormholeRoute, XcmRoute,
};

/// The default port the relayer will listen on. Defaults to 3111.
pub const fn relayer_port() -> u16 {
    3111
}
/// Chains are enabled unless disabled explicitly.
pub const fn enabled() -> bool {
    true
}
/// Seconds an HTTP request may run before the server answers with a timeout.
pub const fn request_timeout() -> u64 {
    180
}
/// Submissions waiting in a chain's tx queue before callers wait for a slot.
pub const fn tx_queue_max_pending() -> usize {
    64
}
/// Seconds to wait for a receipt once a transaction is broadcast.
pub const fn receipt_timeout() -> u64 {
    120
}
/// Attempts made by the retry runner.
pub const fn retry_times() -> usize {
    10
}
/// Seconds between two attempts of the retry runner.
pub const fn retry_interval() -> u64 {
    5
}

/// Wormhole chain id of Karura.
pub const WORMHOLE_KARURA: u16 = 11;
/// Wormhole chain id of Acala.
pub const WORMHOLE_ACALA: u16 = 12;
/// Wormhole chain id of Ethereum.
pub const WORMHOLE_ETHEREUM: u16 = 2;
/// Wormhole chain id of BNB smart chain.
pub const WORMHOLE_BSC: u16 = 4;

/// Parachain id of Basilisk.
pub const PARA_BASILISK: u32 = 2090;
/// Parachain id of HydraDX.
pub const PARA_HYDRA: u32 = 2034;
/// Parachain id of Moonbeam.
pub const PARA_MOONBEAM: u32 = 2004;

fn addr(s: &str) -> Address {
    s.parse().expect("valid address literal")
}

fn tokens(list: &[(&str, u64)]) -> Vec<TokenThreshold> {
    list.iter()
        .map(|(address, min_amount)| TokenThreshold {
            address: address.to_string(),
            min_amount: *min_amount,
        })
        .collect()
}

/// Routing tables used when the config files do not carry any, picked by
/// network mode.
pub fn routing_tables(testnet: bool) -> RoutingTables {
    if testnet {
        testnet_routing_tables()
    } else {
        mainnet_routing_tables()
    }
}

fn mainnet_routing_tables() -> RoutingTables {
    // origin assets on ethereum
    let eth_tokens = tokens(&[
        ("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 10_000_000), // USDC
        ("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", 500_000), // WETH
        ("0xdac17f958d2ee523a2206206994597c13d831ec7", 10_000_000), // USDT
        ("0x6b175474e89094c44da98b954eedeac495271d0f", 1_000_000_000), // DAI
        ("0x2260fac5e5542a773aa44fbcfedf7c193bc2c599", 30_000), // WBTC
    ]);
    let karura_usdc = addr("0x1f3a10587a20114ea25ba1b388ee2dd4a337ce27");
    let acala_usdc = addr("0x07df96d1341a7d16ba1ad431e2c847d978bc2bce");
    let acala_weth = addr("0x5a4d6acdc4e3e5ab15717f407afe957f7a242578");
    let acala_wbtc = addr("0xc80084af223c8b598536178d9361dc55bfda6818");

    RoutingTables {
        relay: vec![
            RelayTokens {
                target_chain: WORMHOLE_KARURA,
                tokens: eth_tokens.clone(),
            },
            RelayTokens {
                target_chain: WORMHOLE_ACALA,
                tokens: eth_tokens,
            },
        ],
        xcm: vec![
            XcmRoute {
                dest_para_id: PARA_BASILISK,
                router_chain: "karura".into(),
                tokens: vec![karura_usdc],
            },
            XcmRoute {
                dest_para_id: PARA_HYDRA,
                router_chain: "acala".into(),
                tokens: vec![acala_usdc, acala_weth, acala_wbtc],
            },
            XcmRoute {
                dest_para_id: PARA_MOONBEAM,
                router_chain: "acala".into(),
                tokens: vec![acala_usdc],
            },
        ],
        wormhole: vec![
            WormholeRoute {
                origin_para_id: PARA_BASILISK,
                router_chain: "karura".into(),
                tokens: vec![karura_usdc],
                target_chains: vec![WORMHOLE_ETHEREUM],
            },
            WormholeRoute {
                origin_para_id: PARA_HYDRA,
                router_chain: "acala".into(),
                tokens: vec![acala_usdc, acala_weth, acala_wbtc],
                target_chains: vec![WORMHOLE_ETHEREUM],
            },
        ],
    }
}

fn testnet_routing_tables() -> RoutingTables {
    let karura_usdc = addr("0xe20683ad1ed8bbeed7e1ae74be10f19d8045b530");
    let karura_usdt = addr("0x478dee0fa42f4a6d6bbc3aa3e1d2dbc8fa84ecd6");
    let acala_usdc = addr("0x7e3a2fa7e2a9e1a7e2f7a2c0a5aa6e6d44cc1a3a");

    RoutingTables {
        relay: vec![
            RelayTokens {
                target_chain: WORMHOLE_KARURA,
                tokens: tokens(&[
                    // BSC testnet USDT
                    ("0x337610d27c682e347c9cd60bd4b3b107c9d34ddd", 10_000_000),
                    // goerli USDC
                    ("0x07865c6e87b9f70255377e024ace6630c1eaa37f", 10_000_000),
                    // goerli WETH
                    ("0xb4fbf271143f4fbf7b91a5ded31805e42b2208d6", 100_000),
                ]),
            },
            RelayTokens {
                target_chain: WORMHOLE_ACALA,
                tokens: tokens(&[
                    ("0x07865c6e87b9f70255377e024ace6630c1eaa37f", 10_000_000),
                    ("0xb4fbf271143f4fbf7b91a5ded31805e42b2208d6", 100_000),
                ]),
            },
        ],
        xcm: vec![
            XcmRoute {
                dest_para_id: PARA_BASILISK,
                router_chain: "karura".into(),
                tokens: vec![karura_usdc, karura_usdt],
            },
            XcmRoute {
                dest_para_id: PARA_HYDRA,
                router_chain: "acala".into(),
                tokens: vec![acala_usdc],
            },
        ],
        wormhole: vec![
            WormholeRoute {
                origin_para_id: PARA_BASILISK,
                router_chain: "karura".into(),
                tokens: vec![karura_usdc, karura_usdt],
                target_chains: vec![WORMHOLE_ETHEREUM, WORMHOLE_BSC],
            },
            WormholeRoute {
                origin_para_id: PARA_HYDRA,
                router_chain: "acala".into(),
                tokens: vec![acala_usdc],
                target_chains: vec![WORMHOLE_ETHEREUM],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testnet_relay_table_knows_bsc_usdt_on_karura() {
        let tables = routing_tables(true);
        let karura = tables.relay_tokens(WORMHOLE_KARURA).unwrap();
        assert_eq!(
            karura.threshold("0x337610D27C682E347C9CD60BD4B3B107C9D34DDD"),
            Some(10_000_000)
        );
    }

    #[test]
    fn modes_use_different_tables() {
        let mainnet = routing_tables(false);
        let karura = mainnet.relay_tokens(WORMHOLE_KARURA).unwrap();
        assert_eq!(
            karura.threshold("0x337610d27c682e347c9cd60bd4b3b107c9d34ddd"),
            None
        );
        assert!(mainnet.xcm_route(1111).is_none());
        assert_eq!(
            mainnet.xcm_route(PARA_HYDRA).unwrap().router_chain,
            "acala"
        );
    }
}
