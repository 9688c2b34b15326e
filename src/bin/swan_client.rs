//! Command line socket.io-style client
//!
//! Connects with the session configuration and logs every listed event.
//!
//! Usage: `swan_client [--config <path>] [event ...]`
//!
//! Without `--config` the path comes from `SWAN_SOCKET_CONFIG_PATH`
//! (default `config/swan_socket.yaml`).

use anyhow::{Context, Result};
use swan_socket::bin_common::{
    format_event, init_tracing, load_config_from_env, parse_args, split_config_arg,
};
use swan_socket::swansocket::{SessionBuilder, SessionConfig, TungsteniteTransport};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let (config_type, events) = split_config_arg(parse_args());
    let config_path = load_config_from_env(config_type);
    let config = SessionConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    config.log();

    let session = SessionBuilder::from_config(&config)
        .on_fail(|e| error!("Could not connect: {}", e))
        .transport(TungsteniteTransport::new())
        .build();

    session
        .on("connect", |_| info!("Connected"))
        .on("disconnect", |_| info!("Disconnected"))
        .on("error", |args| warn!("Error event: {:?}", args));

    for event in events {
        let name = event.clone();
        session.on(event, move |args| {
            let line = format_event(&name, args);
            info!("{}", line);
        });
    }

    session.connect().await?;
    info!("Press Ctrl+C to stop");

    tokio::select! {
        result = session.join() => {
            result.context("Session ended with an error")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal (Ctrl+C)");
            session.close().await?;
        }
    }

    let metrics = session.metrics();
    info!(
        "Frames sent: {}, received: {}, probes: {}",
        metrics.frames_sent, metrics.frames_received, metrics.probes_sent
    );
    Ok(())
}
