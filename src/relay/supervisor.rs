use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use tokio::io::BufReader;

use super::follower::LogFollower;
use super::logger::{RelayLogger, configure_log_relay};
use super::pump::{StreamKind, pump_stream};
use crate::config::RelayConfig;
use crate::shutdown::ShutdownSignal;

/// Capacity of each in-memory pipe between the follower and a pump.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Only output produced after the relay attaches; no history replay.
const FOLLOW_FROM_NOW: i32 = 0;

const SHORT_ID_LEN: usize = 12;

fn short_id(container_id: &str) -> &str {
    container_id.get(..SHORT_ID_LEN).unwrap_or(container_id)
}

/// Relays a container's stdout and stderr until `shutdown` fires.
///
/// The process exits if the syslog sink cannot be set up. Pumps are not
/// joined: returning only means shutdown was requested.
pub async fn relay_logs<F>(
    config: &RelayConfig,
    follower: &F,
    shutdown: ShutdownSignal,
    container_id: &str,
    labels: &HashMap<String, String>,
    output: Box<dyn Write + Send>,
) where
    F: LogFollower,
{
    let logger = match configure_log_relay(config, labels, output).await {
        Ok(logger) => Arc::new(logger),
        Err(e) => {
            log::error!("Error adding syslog hook for {}: {e}", config.syslog_addr);
            std::process::exit(1);
        }
    };

    run_relay(logger, follower, shutdown, container_id).await;
}

async fn run_relay<F>(
    logger: Arc<RelayLogger>,
    follower: &F,
    shutdown: ShutdownSignal,
    container_id: &str,
) where
    F: LogFollower,
{
    log::info!("log-relay starting log pump for '{}'", short_id(container_id));
    log::info!("Started syslog log pump");

    let (out_wr, out_rd) = tokio::io::duplex(PIPE_CAPACITY);
    let (err_wr, err_rd) = tokio::io::duplex(PIPE_CAPACITY);

    follower.follow_logs(container_id, FOLLOW_FROM_NOW, out_wr, err_wr);

    for (kind, reader) in [(StreamKind::Stdout, out_rd), (StreamKind::Stderr, err_rd)] {
        let logger = Arc::clone(&logger);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let exit = pump_stream(shutdown, kind.as_ref(), &logger, BufReader::new(reader)).await;
            log::debug!("Pump for '{}' finished: {exit:?}", kind.as_ref());
        });
    }

    shutdown.fired().await;
    log::info!("Log relay for '{}' shutting down", short_id(container_id));
}
