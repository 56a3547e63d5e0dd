use ethers::types::U256;
use router_relayer_config::RouterRelayerConfig;

use super::{router_chain, RouteFamily, RouteInstructions, RoutePlan, RouteRejection};
use crate::contracts::WormholeInstructions;
use crate::params::{WormholeRouteParams, WormholeRouteRequest};

/// Routes tokens from a parachain out through the wormhole token bridge of
/// Acala/Karura.
#[derive(Debug, Clone, Copy)]
pub struct Wormhole;

impl RouteFamily for Wormhole {
    const NAME: &'static str = "Wormhole";
    type Params = WormholeRouteParams;
    type Request = WormholeRouteRequest;

    fn plan(
        config: &RouterRelayerConfig,
        request: &WormholeRouteRequest,
    ) -> Result<RoutePlan, RouteRejection> {
        let para_id = request.from_para_id;
        let route = config.routing().wormhole_route(para_id).ok_or_else(|| {
            RouteRejection::new(format!(
                "unsupported origin parachain: {para_id}"
            ))
        })?;
        if !route.reaches(request.target_chain_id) {
            return Err(RouteRejection::new(format!(
                "unsupported target chain: {}",
                request.target_chain_id
            )));
        }
        if !route.supports(&request.origin_addr) {
            return Err(RouteRejection::new(format!(
                "unsupported token on origin parachain {para_id}: {:?}",
                request.origin_addr
            )));
        }
        let chain = router_chain(config, &route.router_chain)?;
        let factory =
            chain.contracts.wormhole_router_factory.ok_or_else(|| {
                RouteRejection::new(format!(
                    "wormhole routing is not available on {}",
                    chain.name
                ))
            })?;
        Ok(RoutePlan {
            router_chain: chain.name.clone(),
            router_chain_id: chain.wormhole_chain_id,
            factory,
            fee_registry: chain.contracts.fee_registry,
            instructions: RouteInstructions::Wormhole {
                instructions: WormholeInstructions {
                    recipient_chain: request.target_chain_id,
                    recipient: request.dest_addr.to_fixed_bytes(),
                    nonce: 0,
                    arbiter_fee: U256::zero(),
                },
                token_bridge: chain.contracts.token_bridge,
            },
            token: request.origin_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::{Address, H256};
    use router_relayer_config::defaults::{
        PARA_BASILISK, WORMHOLE_BSC, WORMHOLE_ETHEREUM,
    };

    use super::*;
    use crate::router::preview;
    use crate::router::resolver::tests::Create2Factory;
    use crate::test_utils::{config, KARURA_USDC};

    fn request(from: u32, target: u16) -> WormholeRouteRequest {
        WormholeRouteRequest {
            origin_addr: KARURA_USDC,
            target_chain_id: target,
            dest_addr: H256::from(Address::repeat_byte(0x42)),
            from_para_id: from,
        }
    }

    #[tokio::test]
    async fn previews_in_order_of_checks() {
        let cfg = config();
        let factory = Create2Factory::default();
        let outcome = preview::<Wormhole, _>(&cfg, &factory, &request(1111, 2))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Err(RouteRejection::new("unsupported origin parachain: 1111"))
        );
        let outcome =
            preview::<Wormhole, _>(&cfg, &factory, &request(PARA_BASILISK, 7))
                .await
                .unwrap();
        assert_eq!(outcome, Err(RouteRejection::new("unsupported target chain: 7")));
        let mut unknown_token = request(PARA_BASILISK, WORMHOLE_ETHEREUM);
        unknown_token.origin_addr = Address::repeat_byte(0xaa);
        let outcome = preview::<Wormhole, _>(&cfg, &factory, &unknown_token)
            .await
            .unwrap();
        assert!(outcome
            .unwrap_err()
            .msg
            .starts_with("unsupported token on origin parachain 2090"));
    }

    #[tokio::test]
    async fn router_depends_on_destination() {
        let cfg = config();
        let factory = Create2Factory::default();
        let to_eth = preview::<Wormhole, _>(
            &cfg,
            &factory,
            &request(PARA_BASILISK, WORMHOLE_ETHEREUM),
        )
        .await
        .unwrap()
        .unwrap();
        let again = preview::<Wormhole, _>(
            &cfg,
            &factory,
            &request(PARA_BASILISK, WORMHOLE_ETHEREUM),
        )
        .await
        .unwrap()
        .unwrap();
        let to_bsc = preview::<Wormhole, _>(
            &cfg,
            &factory,
            &request(PARA_BASILISK, WORMHOLE_BSC),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(to_eth, again);
        assert_ne!(to_eth.router_addr, to_bsc.router_addr);
    }

    #[test]
    fn plan_uses_router_chain_contracts() {
        let cfg = config();
        let plan =
            Wormhole::plan(&cfg, &request(PARA_BASILISK, WORMHOLE_ETHEREUM))
                .unwrap();
        let karura = cfg.chain("karura").unwrap();
        assert_eq!(plan.router_chain, "karura");
        assert_eq!(Some(plan.factory), karura.contracts.wormhole_router_factory);
        match plan.instructions {
            RouteInstructions::Wormhole {
                instructions,
                token_bridge,
            } => {
                assert_eq!(token_bridge, karura.contracts.token_bridge);
                assert_eq!(instructions.recipient_chain, WORMHOLE_ETHEREUM);
                assert!(instructions.arbiter_fee.is_zero());
            }
            other => panic!("unexpected instructions {other:?}"),
        }
    }
}
