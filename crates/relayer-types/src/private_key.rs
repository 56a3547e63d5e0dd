use std::str::FromStr;

use ethers::types::H256;
use serde::Deserialize;

/// PrivateKey represents the relayer's EVM signing key.
#[derive(Clone)]
pub struct PrivateKey(H256);

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PrivateKey").finish()
    }
}

impl From<H256> for PrivateKey {
    fn from(secret: H256) -> Self {
        PrivateKey(secret)
    }
}

impl std::ops::Deref for PrivateKey {
    type Target = H256;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn parse_secret<E>(value: &str) -> Result<H256, E>
where
    E: serde::de::Error,
{
    let hex = if value.starts_with("0x") {
        value.to_string()
    } else {
        format!("0x{value}")
    };
    H256::from_str(&hex).map_err(|e| {
        serde::de::Error::custom(format!(
            "{e}\n expected a 66 chars string (including the 0x prefix) but found {} chars",
            hex.len()
        ))
    })
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PrivateKeyVistor;
        impl<'de> serde::de::Visitor<'de> for PrivateKeyVistor {
            type Value = H256;

            fn expecting(
                &self,
                formatter: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                formatter.write_str(
                    "hex string or an env var containing a hex string in it",
                )
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if let Some(var) = value.strip_prefix('$') {
                    tracing::trace!("Reading {} from env", var);
                    let val = std::env::var(var).map_err(|e| {
                        serde::de::Error::custom(format!(
                            "error while loading this env {var}: {e}",
                        ))
                    })?;
                    // keys exported by wallets often come without the prefix
                    parse_secret(val.trim())
                } else if value.starts_with("0x") {
                    parse_secret(value)
                } else {
                    Err(serde::de::Error::custom(
                        "private key must be a 0x prefixed hex string or a $ENV_VAR reference",
                    ))
                }
            }
        }

        let secret = deserializer.deserialize_str(PrivateKeyVistor)?;
        Ok(Self(secret))
    }
}
