//! Request parameters and their validation.
//!
//! Every field arrives as an optional string so a malformed request is
//! answered with the list of offending fields instead of a bare
//! deserialization error.

use std::str::FromStr;

use ethers::types::{Address, Bytes, H256};
use serde::{Deserialize, Serialize};

/// Turns raw request parameters into a typed request.
pub trait Validate {
    /// The typed request.
    type Output;

    /// Returns the typed request, or one message per invalid field.
    fn validate(&self) -> Result<Self::Output, Vec<String>>;
}

/// Collects field errors while reading a request.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    fn present<'a>(
        &mut self,
        field: &str,
        value: &'a Option<String>,
    ) -> Option<&'a str> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.0.push(format!("{field} is a required field"));
                None
            }
        }
    }

    /// A required field parsed with `FromStr`.
    pub fn parsed<T: FromStr>(
        &mut self,
        field: &str,
        value: &Option<String>,
        expected: &str,
    ) -> Option<T> {
        let raw = self.present(field, value)?;
        match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                self.0.push(format!("{field} must be {expected}"));
                None
            }
        }
    }

    /// A required `0x` prefixed hex field.
    pub fn bytes(&mut self, field: &str, value: &Option<String>) -> Option<Bytes> {
        let raw = self.present(field, value)?;
        let decoded = raw
            .strip_prefix("0x")
            .ok_or(())
            .and_then(|h| hex::decode(h).map_err(|_| ()));
        match decoded {
            Ok(v) if !v.is_empty() => Some(v.into()),
            _ => {
                self.0.push(format!("{field} must be a 0x prefixed hex string"));
                None
            }
        }
    }

    /// A required bytes32 field, 20 bytes addresses are left padded.
    pub fn bytes32(&mut self, field: &str, value: &Option<String>) -> Option<H256> {
        let bytes = self.bytes(field, value)?;
        match bytes.len() {
            32 => Some(H256::from_slice(&bytes)),
            20 => Some(H256::from(Address::from_slice(&bytes))),
            _ => {
                self.0.push(format!("{field} must be 20 or 32 bytes"));
                None
            }
        }
    }

    /// Returns `value` when no error was collected.
    pub fn finish<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, Vec<String>> {
        if !self.0.is_empty() {
            return Err(self.0);
        }
        value().ok_or_else(Vec::new)
    }
}

/// Reads a string, a number or nothing as an optional string, JSON bodies
/// tend to carry chain and parachain ids as numbers.
fn lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct LenientVisitor;

    impl<'de> serde::de::Visitor<'de> for LenientVisitor {
        type Value = Option<String>;

        fn expecting(
            &self,
            formatter: &mut std::fmt::Formatter,
        ) -> std::fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: serde::Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(LenientVisitor)
}

/// `GET /shouldRelay` query. Validated by the relay policy itself.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShouldRelayQuery {
    /// Wormhole chain id the transfer targets.
    #[serde(default, deserialize_with = "lenient")]
    pub target_chain: Option<String>,
    /// Token address on the origin chain.
    #[serde(default, deserialize_with = "lenient")]
    pub origin_asset: Option<String>,
    /// Transfer amount in VAA units, decimal or 0x hex.
    #[serde(default, deserialize_with = "lenient")]
    pub amount: Option<String>,
}

/// `POST /relay` body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayParams {
    /// Wormhole chain id the VAA is relayed to.
    #[serde(default, deserialize_with = "lenient")]
    pub target_chain: Option<String>,
    /// Hex encoded signed VAA.
    #[serde(default, deserialize_with = "lenient")]
    #[serde(rename = "signedVAA")]
    pub signed_vaa: Option<String>,
}

/// Typed `POST /relay` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    /// Wormhole chain id the VAA is relayed to.
    pub target_chain: u16,
    /// Signed VAA bytes.
    #[serde(rename = "signedVAA")]
    pub signed_vaa: Bytes,
}

impl Validate for RelayParams {
    type Output = RelayRequest;

    fn validate(&self) -> Result<RelayRequest, Vec<String>> {
        let mut e = FieldErrors::default();
        let target_chain =
            e.parsed("targetChain", &self.target_chain, "a wormhole chain id");
        let signed_vaa = e.bytes("signedVAA", &self.signed_vaa);
        e.finish(|| {
            Some(RelayRequest {
                target_chain: target_chain?,
                signed_vaa: signed_vaa?,
            })
        })
    }
}

/// Xcm route parameters, query of `GET /shouldRouteXcm` and body of
/// `POST /routeXcm`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XcmRouteParams {
    /// Token to route, on the router chain.
    #[serde(default, deserialize_with = "lenient")]
    pub origin_addr: Option<String>,
    /// Destination parachain id.
    #[serde(default, deserialize_with = "lenient")]
    pub dest_para_id: Option<String>,
    /// Hex encoded xcm destination.
    #[serde(default, deserialize_with = "lenient")]
    pub dest: Option<String>,
}

/// Typed xcm route request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XcmRouteRequest {
    /// Token to route, on the router chain.
    pub origin_addr: Address,
    /// Destination parachain id.
    pub dest_para_id: u32,
    /// SCALE encoded xcm `VersionedMultiLocation` of the recipient.
    pub dest: Bytes,
}

impl Validate for XcmRouteParams {
    type Output = XcmRouteRequest;

    fn validate(&self) -> Result<XcmRouteRequest, Vec<String>> {
        let mut e = FieldErrors::default();
        let origin_addr =
            e.parsed("originAddr", &self.origin_addr, "an address");
        let dest_para_id =
            e.parsed("destParaId", &self.dest_para_id, "a parachain id");
        let dest = e.bytes("dest", &self.dest);
        e.finish(|| {
            Some(XcmRouteRequest {
                origin_addr: origin_addr?,
                dest_para_id: dest_para_id?,
                dest: dest?,
            })
        })
    }
}

/// Wormhole route parameters, query of `GET /shouldRouteWormhole` and body
/// of `POST /routeWormhole`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WormholeRouteParams {
    /// Token to route, on the router chain.
    #[serde(default, deserialize_with = "lenient")]
    pub origin_addr: Option<String>,
    /// Wormhole chain id of the final destination.
    #[serde(default, deserialize_with = "lenient")]
    pub target_chain_id: Option<String>,
    /// Recipient on the destination chain.
    #[serde(default, deserialize_with = "lenient")]
    pub dest_addr: Option<String>,
    /// Parachain the transfer comes from.
    #[serde(default, deserialize_with = "lenient")]
    pub from_para_id: Option<String>,
}

/// Typed wormhole route request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WormholeRouteRequest {
    /// Token to route, on the router chain.
    pub origin_addr: Address,
    /// Wormhole chain id of the final destination.
    pub target_chain_id: u16,
    /// Recipient on the destination chain.
    pub dest_addr: H256,
    /// Parachain the transfer comes from.
    pub from_para_id: u32,
}

impl Validate for WormholeRouteParams {
    type Output = WormholeRouteRequest;

    fn validate(&self) -> Result<WormholeRouteRequest, Vec<String>> {
        let mut e = FieldErrors::default();
        let origin_addr =
            e.parsed("originAddr", &self.origin_addr, "an address");
        let target_chain_id = e.parsed(
            "targetChainId",
            &self.target_chain_id,
            "a wormhole chain id",
        );
        let dest_addr = e.bytes32("destAddr", &self.dest_addr);
        let from_para_id =
            e.parsed("fromParaId", &self.from_para_id, "a parachain id");
        e.finish(|| {
            Some(WormholeRouteRequest {
                origin_addr: origin_addr?,
                target_chain_id: target_chain_id?,
                dest_addr: dest_addr?,
                from_para_id: from_para_id?,
            })
        })
    }
}

/// `POST /relayAndRoute` and `POST /relayAndRouteBatch` body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayAndRouteParams {
    /// Xcm route the relayed tokens take.
    #[serde(flatten)]
    pub route: XcmRouteParams,
    /// Hex encoded signed VAA.
    #[serde(default, deserialize_with = "lenient")]
    #[serde(rename = "signedVAA")]
    pub signed_vaa: Option<String>,
}

/// Typed relay and route request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayAndRouteRequest {
    /// Xcm route the relayed tokens take.
    #[serde(flatten)]
    pub route: XcmRouteRequest,
    /// Signed VAA bytes.
    #[serde(rename = "signedVAA")]
    pub signed_vaa: Bytes,
}

impl Validate for RelayAndRouteParams {
    type Output = RelayAndRouteRequest;

    fn validate(&self) -> Result<RelayAndRouteRequest, Vec<String>> {
        let route = self.route.validate();
        let mut e = FieldErrors::default();
        let signed_vaa = e.bytes("signedVAA", &self.signed_vaa);
        match (route, e.finish(|| signed_vaa)) {
            (Ok(route), Ok(signed_vaa)) => {
                Ok(RelayAndRouteRequest { route, signed_vaa })
            }
            (route, vaa) => Err(route
                .err()
                .unwrap_or_default()
                .into_iter()
                .chain(vaa.err().unwrap_or_default())
                .collect()),
        }
    }
}
