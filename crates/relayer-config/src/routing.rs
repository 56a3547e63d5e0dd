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

use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// Static tables deciding what the relayer agrees to relay and route.
///
/// Built-in mainnet and testnet tables live in [`crate::defaults`], a
/// `[routing]` section in the config files replaces them as a whole.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RoutingTables {
    /// Supported tokens and minimum amounts per relay target chain.
    #[serde(default)]
    pub relay: Vec<RelayTokens>,
    /// Destination parachains reachable through xcm routers.
    #[serde(default)]
    pub xcm: Vec<XcmRoute>,
    /// Origin parachains that can route out through the wormhole routers.
    #[serde(default)]
    pub wormhole: Vec<WormholeRoute>,
}

/// Tokens the relayer completes transfers for on one wormhole chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelayTokens {
    /// Wormhole chain id of the target chain.
    #[serde(rename(serialize = "targetChain"))]
    pub target_chain: u16,
    /// Origin token addresses and their thresholds.
    pub tokens: Vec<TokenThreshold>,
}

/// A supported origin token and its minimum transfer amount.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TokenThreshold {
    /// Origin asset address, compared case-insensitively.
    pub address: String,
    /// Minimum amount, in VAA units (at most 8 decimals).
    #[serde(rename(serialize = "minAmount"))]
    pub min_amount: u64,
}

/// An xcm destination served by a router chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct XcmRoute {
    /// Destination parachain id.
    #[serde(rename(serialize = "destParaId"))]
    pub dest_para_id: u32,
    /// Name of the chain hosting the router.
    #[serde(rename(serialize = "routerChain"))]
    pub router_chain: String,
    /// Tokens (on the router chain) that can be routed there.
    pub tokens: Vec<Address>,
}

/// Wormhole exits available from one origin parachain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WormholeRoute {
    /// Origin parachain id.
    #[serde(rename(serialize = "originParaId"))]
    pub origin_para_id: u32,
    /// Name of the chain hosting the router.
    #[serde(rename(serialize = "routerChain"))]
    pub router_chain: String,
    /// Tokens (on the router chain) that can be bridged out.
    pub tokens: Vec<Address>,
    /// Wormhole chain ids the tokens can be sent to.
    #[serde(rename(serialize = "targetChains"))]
    pub target_chains: Vec<u16>,
}

impl RoutingTables {
    /// Token registry of a relay target chain.
    pub fn relay_tokens(&self, target_chain: u16) -> Option<&RelayTokens> {
        self.relay.iter().find(|r| r.target_chain == target_chain)
    }

    /// Route serving an xcm destination parachain.
    pub fn xcm_route(&self, dest_para_id: u32) -> Option<&XcmRoute> {
        self.xcm.iter().find(|r| r.dest_para_id == dest_para_id)
    }

    /// Route serving a wormhole exit from an origin parachain.
    pub fn wormhole_route(&self, origin_para_id: u32) -> Option<&WormholeRoute> {
        self.wormhole
            .iter()
            .find(|r| r.origin_para_id == origin_para_id)
    }
}

impl RelayTokens {
    /// Minimum amount of `asset`, looked up case-insensitively.
    pub fn threshold(&self, asset: &str) -> Option<u64> {
        self.tokens
            .iter()
            .find(|t| t.address.eq_ignore_ascii_case(asset))
            .map(|t| t.min_amount)
    }
}

impl XcmRoute {
    /// Whether `token` can be routed to this destination.
    pub fn supports(&self, token: &Address) -> bool {
        self.tokens.contains(token)
    }
}

impl WormholeRoute {
    /// Whether `token` can be bridged out of this origin.
    pub fn supports(&self, token: &Address) -> bool {
        self.tokens.contains(token)
    }

    /// Whether the wormhole chain `chain` is a valid destination.
    pub fn reaches(&self, chain: u16) -> bool {
        self.target_chains.contains(&chain)
    }
}
