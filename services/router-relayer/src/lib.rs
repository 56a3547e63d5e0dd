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

#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # Router Relayer Crate
//!
//! An HTTP service that relays Wormhole token transfers to Acala and Karura,
//! and moves the received tokens on to their final destination through
//! one-time router contracts.
//!
//! #### Relaying
//!
//! Clients hand over a signed VAA. The relayer checks that the transfer is
//! worth relaying (supported token, large enough amount), then completes it
//! on the token bridge of the target chain.
//!
//! #### Routing
//!
//! A router is a contract deployed by a factory at an address derived from
//! its routing instructions, so clients can learn the address up front with
//! the `shouldRoute*` endpoints and have tokens sent there. Once funded, the
//! relayer deploys the router and makes it forward its balance, over xcm to
//! another parachain or through wormhole to another chain.
//!
//! Relay and route can be combined, either as two transactions or as a
//! single batch extrinsic on the router chain.

/// The service that runs the HTTP API.
pub mod service;

/// A type alias for the result for the router relayer.
pub type Result<T> = std::result::Result<T, router_relayer_utils::Error>;
