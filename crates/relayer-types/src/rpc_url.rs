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

use serde::{Deserialize, Serialize};

/// An RPC URL Wrapper around [`url::Url`] to support the `serde` deserialization
/// from environment variables.
///
/// RPC providers embed API keys in the path or the query, so the `Display`
/// and `Debug` impls only print the scheme, host and port.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct RpcUrl(url::Url);

impl RpcUrl {
    /// Returns the inner [`url::Url`].
    pub fn as_url(&self) -> &url::Url {
        &self.0
    }
}

impl std::fmt::Display for RpcUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://", self.0.scheme())?;
        if let Some(host) = self.0.host_str() {
            write!(f, "{host}")?;
        }
        if let Some(port) = self.0.port() {
            write!(f, ":{port}")?;
        }
        let has_more = self.0.path() != "/" || self.0.query().is_some();
        if has_more {
            write!(f, "/***")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RpcUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RpcUrl({self})")
    }
}

impl From<RpcUrl> for url::Url {
    fn from(rpc_url: RpcUrl) -> Self {
        rpc_url.0
    }
}

impl From<url::Url> for RpcUrl {
    fn from(url: url::Url) -> Self {
        RpcUrl(url)
    }
}

impl std::ops::Deref for RpcUrl {
    type Target = url::Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for RpcUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RpcUrlVistor;
        impl<'de> serde::de::Visitor<'de> for RpcUrlVistor {
            type Value = url::Url;

            fn expecting(
                &self,
                formatter: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                formatter.write_str(
                    "rpc url string or an env var containing a rpc url string in it",
                )
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let raw = match value.strip_prefix('$') {
                    Some(var) => {
                        tracing::trace!("Reading {} from env", var);
                        std::env::var(var).map_err(|e| {
                            serde::de::Error::custom(format!(
                                "error while loading this env {var}: {e}",
                            ))
                        })?
                    }
                    None => value.to_string(),
                };
                url::Url::parse(raw.trim())
                    .map_err(|e| serde::de::Error::custom(format!("{e:?}")))
            }
        }

        let rpc_url = deserializer.deserialize_str(RpcUrlVistor)?;
        Ok(Self(rpc_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_hides_api_key() {
        let url: RpcUrl = serde_json::from_value(serde_json::json!(
            "https://eth-rpc-karura.aca-api.network/v3/s3cr3t"
        ))
        .unwrap();
        assert_eq!(url.to_string(), "https://eth-rpc-karura.aca-api.network/***");
        assert_eq!(url.path(), "/v3/s3cr3t");
    }

    #[test]
    fn reads_url_from_env() {
        std::env::set_var("RR_TEST_RPC", "http://localhost:8545");
        let url: RpcUrl = serde_json::from_value(serde_json::json!(
            "$RR_TEST_RPC"
        ))
        .unwrap();
        assert_eq!(url.to_string(), "http://localhost:8545");
    }

    #[test]
    fn rejects_garbage() {
        let res: Result<RpcUrl, _> =
            serde_json::from_value(serde_json::json!("not a url"));
        assert!(res.is_err());
    }
}
