//! swan-socket - Main Library
//!
//! Re-exports the socket.io-style client from the workspace and adds the
//! setup helpers shared by the binaries.
//!
//! ## Architecture
//!
//! - **swansocket**: protocol core, transports and configuration (re-exported from workspace)
//! - **bin_common**: Common utilities for binary executables (config path, logging)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use swan_socket::bin_common::{init_tracing, load_config_from_env, ConfigType};
//! use swan_socket::swansocket::{SessionBuilder, SessionConfig};
//! ```

// Re-export workspace libraries for convenience
pub use swansocket;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod logging;

    pub use cli::{
        load_config_from_env, parse_args, resolve_config_path, split_config_arg, ConfigType,
    };
    pub use logging::{format_event, init_tracing, init_tracing_with_default};
}
