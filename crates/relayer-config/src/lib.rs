// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![warn(missing_docs)]

//! # Router Relayer Configuration Module
//!
//! A module for configuring the relayer.
//!
//! ## Overview
//!
//! Possible configuration include:
//! * `port`: The port the relayer will listen on. Defaults to 3111
//! * `testnet`: selects the testnet token and routing tables, the
//!   `TESTNET_MODE` env var (0/1) takes precedence over the files.
//! * `chains`: the chains served by the relayer, keyed by name. See
//!   [config/mainnet](../../config/mainnet) for an example.
//! * `routing`: optional replacement of the built-in routing tables.

/// Chain configuration
pub mod chain;
/// CLI configuration
#[cfg(feature = "cli")]
pub mod cli;
/// Default values of the configuration.
pub mod defaults;
/// Relay and routing tables
pub mod routing;
/// Utils for processing configuration
pub mod utils;

use std::collections::HashMap;
use std::time::Duration;

use chain::ChainConfig;
use routing::RoutingTables;
use router_relayer_utils::retry::RetryOptions;
use serde::{Deserialize, Serialize};

static EMPTY_ROUTING: RoutingTables = RoutingTables {
    relay: Vec::new(),
    xcm: Vec::new(),
    wormhole: Vec::new(),
};

/// RouterRelayerConfig is the configuration for the router relayer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouterRelayerConfig {
    /// Http Server Port number
    ///
    /// default to 3111
    #[serde(default = "defaults::relayer_port", skip_serializing)]
    pub port: u16,
    /// Whether the relayer runs against testnets.
    #[serde(default)]
    pub testnet: bool,
    /// Seconds a request may take before the server gives up on it.
    #[serde(default = "defaults::request_timeout", skip_serializing)]
    pub request_timeout: u64,
    /// The chains the relayer serves.
    ///
    /// a map between chain name and its configuration.
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
    /// Relay and routing tables, the built-in ones for the network mode
    /// are used when absent.
    #[serde(default)]
    pub routing: Option<RoutingTables>,
    /// Retry runner settings.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for RouterRelayerConfig {
    fn default() -> Self {
        Self {
            port: defaults::relayer_port(),
            testnet: false,
            request_timeout: defaults::request_timeout(),
            chains: HashMap::new(),
            routing: None,
            retry: RetryConfig::default(),
        }
    }
}

impl RouterRelayerConfig {
    /// Makes sure that the config is valid, by going
    /// through the whole config and doing some basic checks.
    ///
    /// Every enabled chain broadcasts transactions, so every one of them
    /// needs a private key.
    pub fn verify(&self) -> router_relayer_utils::Result<()> {
        let all_keys = self
            .chains
            .values()
            .filter(|c| c.enabled)
            .all(|c| c.private_key.is_some());
        all_keys
            .then_some(())
            .ok_or(router_relayer_utils::Error::MissingSecrets)
    }

    /// Looks up a chain by its (lower-cased) name.
    pub fn chain(
        &self,
        name: &str,
    ) -> router_relayer_utils::Result<&ChainConfig> {
        self.chains.get(&name.to_lowercase()).ok_or_else(|| {
            router_relayer_utils::Error::ChainNotFound {
                chain_id: name.to_string(),
            }
        })
    }

    /// Looks up a chain by its wormhole chain id.
    pub fn chain_by_wormhole_id(&self, id: u16) -> Option<&ChainConfig> {
        self.chains.values().find(|c| c.wormhole_chain_id == id)
    }

    /// The active relay and routing tables.
    pub fn routing(&self) -> &RoutingTables {
        self.routing.as_ref().unwrap_or(&EMPTY_ROUTING)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// RetryConfig controls the retry runner used around transient RPC reads.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Total attempts.
    #[serde(default = "defaults::retry_times")]
    pub times: usize,
    /// Seconds between attempts.
    #[serde(default = "defaults::retry_interval")]
    pub interval: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            times: defaults::retry_times(),
            interval: defaults::retry_interval(),
        }
    }
}

impl From<RetryConfig> for RetryOptions {
    fn from(c: RetryConfig) -> Self {
        RetryOptions {
            times: c.times,
            interval: Duration::from_secs(c.interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_config_files_are_correct() {
        // Walks every directory of the repo level config dir and parses the
        // config file(s) inside it, using the example env file for secrets.
        let config_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config");
        let config_dirs = std::fs::read_dir(&config_dir)
            .expect("Failed to read config directory")
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect::<Vec<_>>();
        assert!(
            !config_dirs.is_empty(),
            "No config directories found in the config directory"
        );
        let _ = dotenv::from_path(config_dir.join(".env.example"));
        for config_subdir in config_dirs {
            match utils::load(&config_subdir) {
                Ok(config) => {
                    assert!(!config.chains.is_empty());
                    config.verify().unwrap();
                }
                Err(e) => panic!(
                    "Failed to parse config file in directory: {config_subdir:?} with error: {e}"
                ),
            }
        }
    }
}
