use crate::RouterRelayerConfig;
use anyhow::Context;
use directories_next::ProjectDirs;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

/// Package identifier, where the default configuration is defined.
/// If the user does not start the relayer with the `--config-dir`
/// it will default to read from the default location depending on the OS.
pub const PACKAGE_ID: [&str; 3] = ["network", "asset-router", "router-relayer"];

/// The Router Relayer Command-line tool
///
/// Start the relayer from a config directory:
///
/// $ router-relayer -vvv -c <CONFIG_DIR_PATH>
#[derive(StructOpt)]
#[structopt(name = "Router Relayer")]
pub struct Opts {
    /// A level of verbosity, and can be used multiple times
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: i32,
    /// Directory that contains configration files.
    #[structopt(
        short = "c",
        long = "config-dir",
        value_name = "PATH",
        parse(from_os_str)
    )]
    pub config_dir: Option<PathBuf>,
    /// Overrides the port from the config files.
    #[structopt(short, long)]
    pub port: Option<u16>,
}

/// Loads the configuration from the given directory.
///
/// Returns `Ok(Config)` on success, or `Err(anyhow::Error)` on failure.
///
/// # Arguments
///
/// * `config_dir` - An optional `PathBuf` representing the directory that contains the configuration.
///
/// # Example
///
/// ```no_run
/// # use std::path::PathBuf;
/// # use router_relayer_config::cli::load_config;
/// let arg = Some(PathBuf::from("/tmp/config"));
/// let config = load_config(arg).unwrap();
/// ```
pub fn load_config<P>(
    config_dir: Option<P>,
) -> Result<RouterRelayerConfig, anyhow::Error>
where
    P: AsRef<Path>,
{
    tracing::debug!("Getting default dirs for router relayer");
    let dirs = ProjectDirs::from(PACKAGE_ID[0], PACKAGE_ID[1], PACKAGE_ID[2])
        .context("failed to get config")?;
    let path = match config_dir {
        Some(p) => p.as_ref().to_path_buf(),
        None => dirs.config_dir().to_path_buf(),
    };
    // return an error if the path is not a directory.
    if !path.is_dir() {
        return Err(anyhow::anyhow!("{} is not a directory", path.display()));
    }
    tracing::trace!("Loading Config from {} ..", path.display());
    let v = crate::utils::load(path)?;
    tracing::trace!("Config loaded..");
    Ok(v)
}

/// Log level picked by the number of `-v` flags.
fn log_level(verbosity: i32) -> tracing::Level {
    use tracing::Level;
    match verbosity {
        i32::MIN..=0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Filter directives of the relayer's own targets at `verbosity`.
///
/// `router_relayer` covers every workspace crate and the
/// `router_relayer_probe` events, which are emitted at `DEBUG` and so show
/// up from `-vvv`. `tower_http` carries the request traces of the server.
fn log_directives(verbosity: i32) -> [String; 2] {
    let level = log_level(verbosity);
    [format!("router_relayer={level}"), format!("tower_http={level}")]
}

/// Installs the global `tracing` subscriber.
///
/// No flag logs errors only, `-v` adds warnings, `-vv` the relay and route
/// outcomes, `-vvv` the probe events and request traces, `-vvvv` everything.
/// `RUST_LOG` directives are applied on top. Output is pretty printed, or
/// one JSON object per line with the `integration-tests` feature.
pub fn setup_logger(verbosity: i32) -> anyhow::Result<()> {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in log_directives(verbosity) {
        env_filter = env_filter.add_directive(
            directive.parse().context("invalid log directive")?,
        );
    }
    let logger = tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(log_level(verbosity))
        .with_env_filter(env_filter);
    #[cfg(not(feature = "integration-tests"))]
    let logger = logger.pretty();
    #[cfg(feature = "integration-tests")]
    let logger = logger.json().flatten_event(true).with_current_span(false);

    logger.init();
    Ok(())
}
