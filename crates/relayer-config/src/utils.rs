use config::{Config, File};
use std::path::{Path, PathBuf};

use super::*;

/// Env var switching the relayer between mainnet (`0`) and testnet (`1`) tables.
pub const TESTNET_MODE_ENV: &str = "TESTNET_MODE";

/// A helper function that will search for all config files in the given directory and return them as a vec
/// of the paths.
///
/// Supported file extensions are:
/// - `.toml`.
/// - `.json`.
pub fn search_config_files<P: AsRef<Path>>(
    base_dir: P,
) -> router_relayer_utils::Result<Vec<PathBuf>> {
    // A pattern that covers all toml or json files in the config directory and subdirectories.
    let toml_pattern = format!("{}/**/*.toml", base_dir.as_ref().display());
    let json_pattern = format!("{}/**/*.json", base_dir.as_ref().display());
    tracing::trace!(
        "Loading config files from {} and {}",
        toml_pattern,
        json_pattern
    );
    let toml_files = glob::glob(&toml_pattern)?;
    let json_files = glob::glob(&json_pattern)?;
    toml_files
        .chain(json_files)
        .map(|v| v.map_err(router_relayer_utils::Error::from))
        .collect()
}

/// Reads the `TESTNET_MODE` value, `None` when unset or unreadable.
pub fn parse_testnet_mode(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        "" => None,
        other => {
            tracing::warn!(
                "Ignoring {TESTNET_MODE_ENV}={other}, expected 0 or 1"
            );
            None
        }
    }
}

/// Try to parse the [`RouterRelayerConfig`] from the given config file(s).
///
/// The network mode is read from the `TESTNET_MODE` env var.
pub fn parse_from_files(
    files: &[PathBuf],
) -> router_relayer_utils::Result<RouterRelayerConfig> {
    let testnet_mode = std::env::var(TESTNET_MODE_ENV).ok();
    parse_with_network_mode(files, testnet_mode.as_deref())
}

/// Same as [`parse_from_files`], with the `TESTNET_MODE` value passed in.
pub fn parse_with_network_mode(
    files: &[PathBuf],
    testnet_mode: Option<&str>,
) -> router_relayer_utils::Result<RouterRelayerConfig> {
    let mut builder = Config::builder();
    for config_file in files {
        tracing::trace!("Loading config file: {}", config_file.display());
        // get file extension
        let ext = config_file
            .extension()
            .map(|e| e.to_str().unwrap_or(""))
            .unwrap_or("");
        let format = match ext {
            "toml" => config::FileFormat::Toml,
            "json" => config::FileFormat::Json,
            _ => {
                tracing::warn!("Unknown file extension: {}", ext);
                continue;
            }
        };
        builder = builder
            .add_source(File::from(config_file.as_path()).format(format));
    }

    // also merge in the environment (with a prefix of ROUTER_RELAYER).
    let builder = builder
        .add_source(
            config::Environment::with_prefix("ROUTER_RELAYER").separator("_"),
        )
        .set_override_option(
            "testnet",
            testnet_mode.and_then(parse_testnet_mode),
        )?;
    let cfg = builder.build()?;
    // and finally deserialize the config and post-process it
    let config: Result<
        RouterRelayerConfig,
        serde_path_to_error::Error<config::ConfigError>,
    > = serde_path_to_error::deserialize(cfg);
    match config {
        Ok(c) => postloading_process(c),
        Err(e) => {
            tracing::error!("{}", e);
            Err(e.into())
        }
    }
}

/// Load the configuration files and
///
/// Returns `Ok(RouterRelayerConfig)` on success, or `Err(Error)` on failure.
///
/// # Arguments
///
/// * `path` - The path to the configuration directory
///
/// # Example
///
/// ```no_run
/// use router_relayer_config::utils::load;
///
/// let path = "/path/to/config";
/// load(path);
/// ```
///
/// it is the same as using the [`search_config_files`] and [`parse_from_files`] functions combined.
pub fn load<P: AsRef<Path>>(
    path: P,
) -> router_relayer_utils::Result<RouterRelayerConfig> {
    parse_from_files(&search_config_files(path)?)
}

/// The postloading_process exists to validate configuration and standardize
/// the format of the configuration
pub fn postloading_process(
    mut config: RouterRelayerConfig,
) -> router_relayer_utils::Result<RouterRelayerConfig> {
    tracing::trace!("Checking configration sanity ...");

    // 1. drain everything, and take enabled chains.
    let old_chains = config
        .chains
        .drain()
        .filter(|(_, chain)| chain.enabled)
        .collect::<HashMap<_, _>>();
    // 2. insert them again, keyed by the lower-cased chain name.
    for (_, mut v) in old_chains {
        v.name = v.name.to_lowercase();
        config.chains.insert(v.name.clone(), v);
    }

    let testnet = config.testnet;
    let routing = config
        .routing
        .get_or_insert_with(|| defaults::routing_tables(testnet));

    // routes pointing at chains we do not serve are dead entries.
    let router_chains = routing
        .xcm
        .iter()
        .map(|r| (&r.router_chain, "xcm"))
        .chain(routing.wormhole.iter().map(|r| (&r.router_chain, "wormhole")));
    for (router_chain, family) in router_chains {
        match config.chains.get(router_chain) {
            None => tracing::warn!(
                "!!WARNING!!: {family} route uses router chain {router_chain} which is not configured or not enabled."
            ),
            Some(chain) => {
                let factory = match family {
                    "xcm" => chain.contracts.xcm_router_factory,
                    _ => chain.contracts.wormhole_router_factory,
                };
                if factory.is_none() {
                    tracing::warn!(
                        "!!WARNING!!: {family} route uses router chain {router_chain} which has no {family}-router-factory configured."
                    );
                }
            }
        }
    }

    tracing::trace!(
        "postloaded config: {}",
        serde_json::to_string_pretty(&config)?
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KARURA: &str = r#"
[chains.Karura]
name = "Karura"
chain-id = 686
wormhole-chain-id = 11
para-id = 2000
http-endpoint = "$RR_CFG_KARURA_ETH_RPC"
private-key = "$RR_CFG_KARURA_PRIVATE_KEY"
min-balance = 10.0

[chains.Karura.contracts]
token-bridge = "0xae9d7fe007b3327aa64a32824aaac52c42a6e624"
fee-registry = "0x4f3b9ba8a9f5c1f3b8d3e3b4e8dc0b1a2f4c2d11"
xcm-router-factory = "0x8f7a8c2d4b7e6a1f0c3d5e9b2a4c6d8e0f1a3b5c"

[chains.Karura.tx-queue]
max-pending = 8
receipt-timeout = 30
confirmations = 1

[chains.Disabled]
name = "Disabled"
enabled = false
chain-id = 1
wormhole-chain-id = 2
http-endpoint = "http://localhost:8545"
[chains.Disabled.contracts]
token-bridge = "0x0000000000000000000000000000000000000001"
fee-registry = "0x0000000000000000000000000000000000000002"
"#;

    fn write_config(dir: &Path, content: &str) -> Vec<PathBuf> {
        let path = dir.join("karura.toml");
        std::fs::write(&path, content).unwrap();
        search_config_files(dir).unwrap()
    }

    fn set_env() {
        std::env::set_var(
            "RR_CFG_KARURA_ETH_RPC",
            "https://eth-rpc-karura.aca-api.network",
        );
        std::env::set_var(
            "RR_CFG_KARURA_PRIVATE_KEY",
            "0x8075991ce870b93a8870eca0c0f91913d12f47948ca0fd25b49c6fa7cdbeee8b",
        );
    }

    #[test]
    fn parses_toml_with_env_indirection() {
        set_env();
        let dir = tempfile::tempdir().unwrap();
        let files = write_config(dir.path(), KARURA);
        let config = parse_with_network_mode(&files, None).unwrap();
        config.verify().unwrap();

        // disabled chains are dropped, names are lower-cased
        assert_eq!(config.chains.len(), 1);
        let karura = config.chain("Karura").unwrap();
        assert_eq!(karura.chain_id, 686);
        assert_eq!(karura.wormhole_chain_id, 11);
        assert_eq!(karura.tx_queue.max_pending, 8);
        assert!(karura.contracts.wormhole_router_factory.is_none());
        assert_eq!(
            karura.http_endpoint.host_str(),
            Some("eth-rpc-karura.aca-api.network")
        );
        assert!(config.chain_by_wormhole_id(11).is_some());
        assert!(!config.testnet);
        assert!(config.routing().xcm_route(defaults::PARA_BASILISK).is_some());
    }

    #[test]
    fn missing_private_key_fails_verification() {
        set_env();
        let dir = tempfile::tempdir().unwrap();
        let content =
            KARURA.replace("private-key = \"$RR_CFG_KARURA_PRIVATE_KEY\"\n", "");
        let files = write_config(dir.path(), &content);
        let config = parse_with_network_mode(&files, None).unwrap();
        assert!(matches!(
            config.verify(),
            Err(router_relayer_utils::Error::MissingSecrets)
        ));
    }

    #[test]
    fn testnet_mode_selects_testnet_tables() {
        set_env();
        let dir = tempfile::tempdir().unwrap();
        let files = write_config(dir.path(), KARURA);
        let config = parse_with_network_mode(&files, Some("1")).unwrap();
        assert!(config.testnet);
        let karura = config
            .routing()
            .relay_tokens(defaults::WORMHOLE_KARURA)
            .unwrap();
        assert_eq!(
            karura.threshold("0x337610d27c682e347c9cd60bd4b3b107c9d34ddd"),
            Some(10_000_000)
        );

        let config = parse_with_network_mode(&files, Some("0")).unwrap();
        assert!(!config.testnet);
    }

    #[test]
    fn testnet_mode_values() {
        assert_eq!(parse_testnet_mode("1"), Some(true));
        assert_eq!(parse_testnet_mode(" 0 "), Some(false));
        assert_eq!(parse_testnet_mode(""), None);
        assert_eq!(parse_testnet_mode("maybe"), None);
    }
}
