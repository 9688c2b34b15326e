//! CLI utilities for binaries
//!
//! Handles configuration path lookup and command line arguments
//! for all binary executables.

use std::path::PathBuf;

/// Environment variable overriding the session config path
pub const CONFIG_PATH_ENV_VAR: &str = "SWAN_SOCKET_CONFIG_PATH";

/// Default session config path
pub const DEFAULT_CONFIG_PATH: &str = "config/swan_socket.yaml";

/// Where to find the configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigType {
    /// `SWAN_SOCKET_CONFIG_PATH`, falling back to `config/swan_socket.yaml`
    Session,
    /// Explicit path from `--config`; the environment is not consulted
    Custom(String),
}

/// Load configuration path from environment or use default
///
/// # Examples
/// ```
/// use swan_socket::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Session);
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    resolve_config_path(config_type, std::env::var(CONFIG_PATH_ENV_VAR).ok())
}

/// Resolve the config path given the value of `SWAN_SOCKET_CONFIG_PATH`
pub fn resolve_config_path(config_type: ConfigType, env_value: Option<String>) -> PathBuf {
    match config_type {
        ConfigType::Session => env_value
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
            .into(),
        ConfigType::Custom(path) => path.into(),
    }
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// Pull `--config <path>` out of `args`
///
/// Returns the config source and the remaining arguments in order.
pub fn split_config_arg(args: Vec<String>) -> (ConfigType, Vec<String>) {
    let mut config_type = ConfigType::Session;
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        if arg == "--config" {
            if let Some(path) = iter.next() {
                config_type = ConfigType::Custom(path);
            }
        } else {
            rest.push(arg);
        }
    }

    (config_type, rest)
}
