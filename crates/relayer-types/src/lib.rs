#![warn(missing_docs)]
//! Value types shared by the router relayer crates: secrets and URLs that
//! can be read from the environment, and the signed VAA decoder.

/// Relayer signing key, read from the config or the environment.
pub mod private_key;
/// RPC endpoint that hides its credentials when printed.
pub mod rpc_url;
/// Wormhole VAA and token transfer payload decoding.
pub mod vaa;
