// Copyright (C) 2022-2024 Webb Technologies Inc.
//
// Tangle is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Tangle is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should receive a copy of the GNU General Public License
// If not, see <http://www.gnu.org/licenses/>.

use derive_more::Display;
/// Target for logger
pub const TARGET: &str = "router_relayer_probe";

/// The Kind of the Probe.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// When the Lifecycle of the Relayer changes, like starting or shutting down.
    #[display(fmt = "lifecycle")]
    Lifecycle,
    /// Relayer Transaction Queue state on a specific chain.
    #[display(fmt = "tx_queue")]
    TxQueue,
    /// Relay of a signed VAA (`completeTransfer`).
    #[display(fmt = "relay")]
    Relay,
    /// Router preview or deploy-and-route execution.
    #[display(fmt = "route")]
    Route,
    /// Relay and route combined into one batch extrinsic.
    #[display(fmt = "batch")]
    Batch,
    /// When the relayer will retry to do something.
    #[display(fmt = "retry")]
    Retry,
}
