use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use ethers::types::{Address, H256};
use router_relayer_config::chain::{ChainConfig, ContractsConfig, TxQueueConfig};
use router_relayer_config::defaults::routing_tables;
use router_relayer_config::RouterRelayerConfig;
use router_relayer_context::RelayerContext;
use router_relayer_handlers::build_routes;
use serde_json::{json, Value};
use tower::ServiceExt;

const BSC_USDT: &str = "0x337610d27c682e347c9cd60bd4b3b107c9d34ddd";
const KARURA_USDC: &str = "0xe20683ad1ed8bbeed7e1ae74be10f19d8045b530";

fn chain(name: &str, wormhole_chain_id: u16) -> ChainConfig {
    ChainConfig {
        name: name.into(),
        enabled: true,
        chain_id: 596,
        wormhole_chain_id,
        para_id: None,
        http_endpoint: url::Url::parse("http://127.0.0.1:1").unwrap().into(),
        ws_endpoint: None,
        explorer: None,
        private_key: Some(H256::repeat_byte(0x22).into()),
        contracts: ContractsConfig {
            token_bridge: Address::repeat_byte(1),
            fee_registry: Address::repeat_byte(2),
            xcm_router_factory: Some(Address::repeat_byte(3)),
            wormhole_router_factory: Some(Address::repeat_byte(4)),
        },
        min_balance: 0.0,
        tx_queue: TxQueueConfig::default(),
    }
}

fn app() -> Router {
    let config = RouterRelayerConfig {
        testnet: true,
        chains: HashMap::from([
            ("karura".to_string(), chain("karura", 11)),
            ("acala".to_string(), chain("acala", 12)),
        ]),
        routing: Some(routing_tables(true)),
        ..Default::default()
    };
    build_routes(Arc::new(RelayerContext::new(config).unwrap()))
}

async fn call(req: Request<Body>) -> (StatusCode, Value) {
    let res = app().oneshot(req).await.unwrap();
    let status = res.status();
    let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get(uri: &str) -> (StatusCode, Value) {
    call(Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
    call(
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn unknown_routes_are_not_supported() {
    let (status, body) = get("/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "GET /nope not supported" }));

    let (status, body) = post("/shouldRelay", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "POST /shouldRelay not supported");
}

#[tokio::test]
async fn should_relay_answers_with_a_decision() {
    let (status, body) = get(&format!(
        "/shouldRelay?targetChain=11&originAsset={BSC_USDT}&amount=10000000"
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": { "shouldRelay": true, "msg": "" } }));

    let (status, body) = get(&format!(
        "/shouldRelay?targetChain=11&originAsset={BSC_USDT}&amount=9999999"
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["msg"],
        "transfer amount too small, expect at least 10000000"
    );

    let (_, body) = get("/shouldRelay?originAsset=0x01&amount=1").await;
    assert_eq!(body["data"]["shouldRelay"], false);
    assert_eq!(body["data"]["msg"], "missing targetChain");
}

#[tokio::test]
async fn should_route_rejections_are_ok_responses() {
    let (status, body) = get(&format!(
        "/shouldRouteXcm?originAddr={KARURA_USDC}&destParaId=1111&dest=0x03"
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "data": {
                "shouldRoute": false,
                "msg": "unsupported dest parachain: 1111",
            }
        })
    );

    let dest = format!("0x{}", "42".repeat(20));
    let (status, body) = get(&format!(
        "/shouldRouteWormhole?originAddr={KARURA_USDC}&targetChainId=2&destAddr={dest}&fromParaId=1111"
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["msg"], "unsupported origin parachain: 1111");
}

#[tokio::test]
async fn missing_fields_are_listed() {
    let (status, body) = get("/shouldRouteXcm?destParaId=2090").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "invalid request params!");
    assert_eq!(
        body["error"],
        json!(["originAddr is a required field", "dest is a required field"])
    );

    let (status, body) = post("/routeWormhole", json!({ "fromParaId": 2090 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"].as_array().unwrap().len(), 3);

    let (status, body) =
        post("/relayAndRouteBatch", json!({ "destParaId": 2090 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_array()
        .unwrap()
        .contains(&json!("signedVAA is a required field")));
}

#[tokio::test]
async fn route_rejections_are_route_errors() {
    let (status, body) = post(
        "/routeXcm",
        json!({ "originAddr": KARURA_USDC, "destParaId": 1111, "dest": "0x03" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "RouteError");
    assert_eq!(body["msg"], "unsupported dest parachain: 1111");
    assert_eq!(body["params"]["destParaId"], 1111);
}

#[tokio::test]
async fn undecodable_vaa_is_a_relay_error() {
    let (status, body) = post(
        "/relay",
        json!({ "targetChain": 11, "signedVAA": "0x0102" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "RelayError");
    assert_eq!(body["params"]["targetChain"], 11);
}

#[tokio::test]
async fn version_is_the_crate_version() {
    let (status, body) = get("/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], env!("CARGO_PKG_VERSION"));
}
