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
//! # Relay and routing
//!
//! Completes wormhole token transfers on Acala style chains (the relay),
//! and moves the received tokens on through one-time router contracts (the
//! route), either as two transactions or as one batch extrinsic.

/// Token amount scaling between VAA units and token decimals.
pub mod amount;
/// Relay then route, sequential or as one batch extrinsic.
pub mod batch;
/// Contract bindings.
pub mod contracts;
/// Checks a VAA against the fee registry of the chain it is relayed to.
pub mod eligibility;
/// Relayer account balances.
pub mod health;
/// Request parameters and their validation.
pub mod params;
/// Static relay policy.
pub mod policy;
/// Relaying signed VAAs.
pub mod relay;
/// Router preview and execution.
pub mod router;

#[cfg(test)]
pub(crate) mod test_utils;
