use router_relayer_config::RouterRelayerConfig;

use super::{router_chain, RouteFamily, RouteInstructions, RoutePlan, RouteRejection};
use crate::contracts::XcmInstructions;
use crate::params::{XcmRouteParams, XcmRouteRequest};

/// `WeightLimit::Unlimited`, SCALE encoded.
const UNLIMITED_WEIGHT: [u8; 1] = [0x00];

/// Routes tokens from Acala/Karura to another parachain over xcm.
#[derive(Debug, Clone, Copy)]
pub struct Xcm;

impl RouteFamily for Xcm {
    const NAME: &'static str = "Xcm";
    type Params = XcmRouteParams;
    type Request = XcmRouteRequest;

    fn plan(
        config: &RouterRelayerConfig,
        request: &XcmRouteRequest,
    ) -> Result<RoutePlan, RouteRejection> {
        let para_id = request.dest_para_id;
        let route = config.routing().xcm_route(para_id).ok_or_else(|| {
            RouteRejection::new(format!("unsupported dest parachain: {para_id}"))
        })?;
        if !route.supports(&request.origin_addr) {
            return Err(RouteRejection::new(format!(
                "unsupported token on dest parachin {para_id}: {:?}",
                request.origin_addr
            )));
        }
        let chain = router_chain(config, &route.router_chain)?;
        let factory = chain.contracts.xcm_router_factory.ok_or_else(|| {
            RouteRejection::new(format!(
                "xcm routing is not available on {}",
                chain.name
            ))
        })?;
        Ok(RoutePlan {
            router_chain: chain.name.clone(),
            router_chain_id: chain.wormhole_chain_id,
            factory,
            fee_registry: chain.contracts.fee_registry,
            instructions: RouteInstructions::Xcm(XcmInstructions {
                dest: request.dest.clone(),
                weight: UNLIMITED_WEIGHT.to_vec().into(),
            }),
            token: request.origin_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::Address;
    use router_relayer_config::defaults::PARA_BASILISK;

    use super::*;
    use crate::router::preview;
    use crate::router::resolver::tests::Create2Factory;
    use crate::test_utils::{config, KARURA_USDC};

    fn request(para_id: u32, token: Address) -> XcmRouteRequest {
        XcmRouteRequest {
            origin_addr: token,
            dest_para_id: para_id,
            dest: vec![0x03, 0x01, 0x02].into(),
        }
    }

    #[tokio::test]
    async fn unsupported_parachain_is_rejected() {
        let outcome = preview::<Xcm, _>(
            &config(),
            &Create2Factory::default(),
            &request(1111, KARURA_USDC),
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            Err(RouteRejection::new("unsupported dest parachain: 1111"))
        );
    }

    #[tokio::test]
    async fn unsupported_token_is_rejected() {
        let outcome = preview::<Xcm, _>(
            &config(),
            &Create2Factory::default(),
            &request(PARA_BASILISK, Address::repeat_byte(0xaa)),
        )
        .await
        .unwrap();
        let rejection = outcome.unwrap_err();
        assert!(rejection
            .msg
            .contains(&format!("unsupported token on dest parachin {PARA_BASILISK}")));
    }

    #[tokio::test]
    async fn router_address_is_deterministic() {
        let factory = Create2Factory::default();
        let cfg = config();
        let first = preview::<Xcm, _>(&cfg, &factory, &request(PARA_BASILISK, KARURA_USDC))
            .await
            .unwrap()
            .unwrap();
        let second = preview::<Xcm, _>(&cfg, &factory, &request(PARA_BASILISK, KARURA_USDC))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.router_chain_id, 11);

        let mut other = request(PARA_BASILISK, KARURA_USDC);
        other.dest = vec![0x03, 0x01, 0x03].into();
        let third = preview::<Xcm, _>(&cfg, &factory, &other)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(first.router_addr, third.router_addr);
    }

    #[tokio::test]
    async fn factory_reverts_are_rejections() {
        let cfg = config();
        let factory = Create2Factory {
            rejected_fee_registry: Some(
                cfg.chain("karura").unwrap().contracts.fee_registry,
            ),
            ..Default::default()
        };
        let outcome =
            preview::<Xcm, _>(&cfg, &factory, &request(PARA_BASILISK, KARURA_USDC))
                .await
                .unwrap();
        assert_eq!(outcome, Err(RouteRejection::new("fee registry not set")));
    }

    #[test]
    fn missing_factory_is_rejected() {
        let mut cfg = config();
        cfg.chains
            .get_mut("karura")
            .unwrap()
            .contracts
            .xcm_router_factory = None;
        let rejection =
            Xcm::plan(&cfg, &request(PARA_BASILISK, KARURA_USDC)).unwrap_err();
        assert_eq!(rejection.msg, "xcm routing is not available on karura");
    }
}
