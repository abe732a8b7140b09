use std::process::ExitCode;
use std::time::Duration;

use config::RelayConfig;
use relay::DockerLogFollower;
use shutdown::ShutdownSignal;

mod cli;
mod config;
mod docker;
mod relay;
mod shutdown;
mod signals;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logger
    env_logger::init();

    if let Err(e) = dotenv::dotenv() {
        log::debug!("No .env file loaded: {e}");
    }

    let args = cli::get_cli_args();

    let mut config = match RelayConfig::try_init(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Unable to read config {:?}: {e}", args.config);
            return ExitCode::FAILURE;
        }
    };
    config.apply_env_overrides(|key| std::env::var(key).ok());
    if let Some(addr) = &args.syslog_addr {
        config.syslog_addr = addr.clone();
    }

    let docker = match docker::connect() {
        Ok(docker) => docker,
        Err(e) => {
            log::error!("Failed to connect to Docker daemon: {e}");
            return ExitCode::FAILURE;
        }
    };

    let container = match docker::inspect_container(&docker, &args.container).await {
        Ok(container) => container,
        Err(e) => {
            log::error!("Unable to inspect container {}: {e}", args.container);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = ShutdownSignal::new();
    if let Err(e) = signals::handle_shutdown(shutdown.clone()) {
        log::error!("Unable to install signal handlers: {e}");
        return ExitCode::FAILURE;
    }

    // Stop relaying once the container is gone and its last output had
    // time to drain.
    {
        let docker = docker.clone();
        let shutdown = shutdown.clone();
        let container_id = container.id.clone();
        let drain = Duration::from_secs(config.exit_drain_secs);
        tokio::spawn(async move {
            docker::wait_for_exit(&docker, &container_id).await;
            tokio::time::sleep(drain).await;
            shutdown.fire();
        });
    }

    let _ = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]);

    let follower = DockerLogFollower::new(docker);
    relay::relay_logs(
        &config,
        &follower,
        shutdown,
        &container.id,
        &container.labels,
        config.output.writer(),
    )
    .await;

    log::info!("Log relay stopped");
    ExitCode::SUCCESS
}
