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

use ethers::types::{Address, H256, U256};
use router_relayer_config::chain::ChainConfig;
use router_relayer_context::RelayerContext;
use router_relayer_types::vaa::TokenTransfer;
use router_relayer_utils::{probe, Error, Result};

use crate::amount::normalize;
use crate::contracts::{FeeRegistry, TokenBridge, IERC20};

/// Token facts read from a router chain.
#[async_trait::async_trait]
pub trait TokenInfoSource: Send + Sync {
    /// Local address of the token a wormhole transfer mints on `chain`.
    async fn wrapped_asset(
        &self,
        chain: &str,
        token_bridge: Address,
        token_chain: u16,
        token_address: H256,
    ) -> Result<Address>;

    /// Decimals of `token` on `chain`.
    async fn decimals(&self, chain: &str, token: Address) -> Result<u8>;

    /// Fee the router charges for `token`, zero for unsupported tokens.
    async fn relayer_fee(
        &self,
        chain: &str,
        fee_registry: Address,
        token: Address,
    ) -> Result<U256>;
}

#[async_trait::async_trait]
impl TokenInfoSource for RelayerContext {
    async fn wrapped_asset(
        &self,
        chain: &str,
        token_bridge: Address,
        token_chain: u16,
        token_address: H256,
    ) -> Result<Address> {
        let provider = self.evm_provider(chain)?;
        let addr = TokenBridge::new(token_bridge, provider)
            .wrapped_asset(token_chain, token_address.to_fixed_bytes())
            .call()
            .await?;
        Ok(addr)
    }

    async fn decimals(&self, chain: &str, token: Address) -> Result<u8> {
        let provider = self.evm_provider(chain)?;
        Ok(IERC20::new(token, provider).decimals().call().await?)
    }

    async fn relayer_fee(
        &self,
        chain: &str,
        fee_registry: Address,
        token: Address,
    ) -> Result<U256> {
        let provider = self.evm_provider(chain)?;
        Ok(FeeRegistry::new(fee_registry, provider)
            .get_fee(token)
            .call()
            .await?)
    }
}

/// Makes sure relaying `transfer` to `chain` pays for itself before
/// anything is broadcast.
///
/// Returns the local token the transfer mints, which is what the router
/// will hold once the relay lands.
pub async fn check_should_relay_before_routing<S>(
    source: &S,
    chain: &ChainConfig,
    transfer: &TokenTransfer,
) -> Result<Address>
where
    S: TokenInfoSource + ?Sized,
{
    let token = if transfer.token_chain == chain.wormhole_chain_id {
        // native token, no wrapper
        transfer.origin_asset()
    } else {
        source
            .wrapped_asset(
                &chain.name,
                chain.contracts.token_bridge,
                transfer.token_chain,
                transfer.token_address,
            )
            .await?
    };
    if token.is_zero() {
        return Err(Error::relay("token is not attested on the router chain")
            .with_params(serde_json::json!({
                "tokenChain": transfer.token_chain,
                "tokenAddress": transfer.token_address,
            })));
    }

    let (decimals, fee) = futures::try_join!(
        source.decimals(&chain.name, token),
        source.relayer_fee(&chain.name, chain.contracts.fee_registry, token),
    )?;
    let amount = normalize(transfer.amount, decimals);
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Relay,
        chain = %chain.name,
        ?token,
        decimals,
        %fee,
        %amount,
    );

    let params = || {
        serde_json::json!({
            "token": token,
            "fee": fee.to_string(),
            "amount": amount.to_string(),
        })
    };
    if fee.is_zero() {
        return Err(Error::relay("unsupported token").with_params(params()));
    }
    if fee > amount {
        return Err(
            Error::relay("token amount too small to relay").with_params(params())
        );
    }
    Ok(token)
}
