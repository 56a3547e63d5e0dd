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

//! Whether a token bridge transfer is worth relaying.

use ethers::types::U256;
use router_relayer_config::routing::RoutingTables;
use router_relayer_types::vaa::TokenTransfer;
use serde::Serialize;

/// Outcome of [`decide`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayDecision {
    /// Whether the relayer should relay the transfer.
    pub should_relay: bool,
    /// Why not, empty when `should_relay` is true.
    pub msg: String,
}

impl RelayDecision {
    fn relay() -> Self {
        Self {
            should_relay: true,
            msg: String::new(),
        }
    }

    fn reject(msg: impl Into<String>) -> Self {
        Self {
            should_relay: false,
            msg: msg.into(),
        }
    }
}

/// Decides whether a transfer of `amount` (VAA units) of `origin_asset` to
/// the wormhole chain `target_chain` should be relayed.
///
/// Inputs are taken raw, as they come from a query string. The first failing
/// check wins:
///
/// 1. missing target chain
/// 2. missing origin asset
/// 3. missing or zero amount
/// 4. amount that is neither a decimal nor a `0x` hex integer
/// 5. target chain without a token registry
/// 6. origin asset missing from that registry (case-insensitive)
/// 7. amount below the asset's threshold
pub fn decide(
    tables: &RoutingTables,
    target_chain: Option<&str>,
    origin_asset: Option<&str>,
    amount: Option<&str>,
) -> RelayDecision {
    fn present(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|v| !v.is_empty())
    }

    let Some(target_chain) = present(target_chain) else {
        return RelayDecision::reject("missing targetChain");
    };
    let Some(origin_asset) = present(origin_asset) else {
        return RelayDecision::reject("missing originAsset");
    };
    let Some(raw_amount) = present(amount).filter(|a| *a != "0") else {
        return RelayDecision::reject("missing transfer amount");
    };
    let amount = match parse_amount(raw_amount) {
        Some(v) if v.is_zero() => {
            return RelayDecision::reject("missing transfer amount")
        }
        Some(v) => v,
        None => {
            return RelayDecision::reject(format!(
                "failed to parse amount: {raw_amount}"
            ))
        }
    };

    let Some(tokens) = target_chain
        .parse::<u16>()
        .ok()
        .and_then(|chain| tables.relay_tokens(chain))
    else {
        return RelayDecision::reject("target chain not supported");
    };
    let Some(threshold) = tokens.threshold(origin_asset) else {
        return RelayDecision::reject("token not supported");
    };
    if amount < U256::from(threshold) {
        return RelayDecision::reject(format!(
            "transfer amount too small, expect at least {threshold}"
        ));
    }
    RelayDecision::relay()
}

/// [`decide`] applied to a decoded VAA transfer.
pub fn decide_transfer(
    tables: &RoutingTables,
    transfer: &TokenTransfer,
) -> RelayDecision {
    decide(
        tables,
        Some(&transfer.to_chain.to_string()),
        Some(&format!("{:?}", transfer.origin_asset())),
        Some(&transfer.amount.to_string()),
    )
}

fn parse_amount(raw: &str) -> Option<U256> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None => U256::from_dec_str(raw).ok(),
    }
}
