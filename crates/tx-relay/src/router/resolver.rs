use ethers::contract::ContractError;
use ethers::providers::Middleware;
use ethers::types::Address;
use router_relayer_context::RelayerContext;
use router_relayer_utils::{contract_revert_reason, probe, Result};

use super::{RouteInstructions, RouteRejection};
use crate::contracts::{WormholeRouterFactory, XcmRouterFactory};

/// Computes router addresses.
#[async_trait::async_trait]
pub trait RouterFactory: Send + Sync {
    /// Address of the router `factory` on `chain` would deploy for
    /// `instructions`, computed with a static call.
    ///
    /// Identical inputs always give the same address. A factory revert is a
    /// [`RouteRejection`] carrying the revert reason.
    async fn router_address(
        &self,
        chain: &str,
        factory: Address,
        fee_registry: Address,
        instructions: &RouteInstructions,
    ) -> Result<std::result::Result<Address, RouteRejection>>;
}

#[async_trait::async_trait]
impl RouterFactory for RelayerContext {
    async fn router_address(
        &self,
        chain: &str,
        factory: Address,
        fee_registry: Address,
        instructions: &RouteInstructions,
    ) -> Result<std::result::Result<Address, RouteRejection>> {
        let provider = self.evm_provider(chain)?;
        let outcome = match instructions {
            RouteInstructions::Xcm(inst) => {
                XcmRouterFactory::new(factory, provider)
                    .deploy_xcm_router(fee_registry, inst.clone())
                    .call()
                    .await
            }
            RouteInstructions::Wormhole {
                instructions,
                token_bridge,
            } => {
                WormholeRouterFactory::new(factory, provider)
                    .deploy_wormhole_router(
                        fee_registry,
                        instructions.clone(),
                        *token_bridge,
                    )
                    .call()
                    .await
            }
        };
        let resolved = into_rejection(outcome)?;
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Route,
            chain = %chain,
            ?factory,
            router = ?resolved.as_ref().ok(),
            rejected = resolved.is_err(),
        );
        Ok(resolved)
    }
}

/// Splits contract reverts, which are answers, from transport failures.
fn into_rejection<M: Middleware>(
    outcome: std::result::Result<Address, ContractError<M>>,
) -> std::result::Result<
    std::result::Result<Address, RouteRejection>,
    ContractError<M>,
> {
    match outcome {
        Ok(addr) => Ok(Ok(addr)),
        Err(e) if e.is_revert() => {
            Ok(Err(RouteRejection::new(contract_revert_reason(&e))))
        }
        Err(e) => Err(e),
    }
}
