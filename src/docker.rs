//! Docker client helpers using bollard.
//!
//! Everything the relay needs from the Docker daemon besides the log
//! stream itself: connecting, resolving a container and waiting for it to
//! stop.

use std::collections::HashMap;

use bollard::Docker;
use bollard::query_parameters::{
    InspectContainerOptions, InspectContainerOptionsBuilder, WaitContainerOptions,
    WaitContainerOptionsBuilder,
};
use futures_util::StreamExt;

/// Connects using the default method (Unix socket on Linux/macOS, named
/// pipe on Windows).
pub fn connect() -> Result<Docker, bollard::errors::Error> {
    Docker::connect_with_local_defaults()
}

/// What the relay needs to know about a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerContext {
    pub id: String,
    pub labels: HashMap<String, String>,
}

/// Resolves `container` (name or id) to its full id and labels.
pub async fn inspect_container(
    docker: &Docker,
    container: &str,
) -> Result<ContainerContext, bollard::errors::Error> {
    let options: InspectContainerOptions = InspectContainerOptionsBuilder::new().build();
    let info = docker.inspect_container(container, Some(options)).await?;

    let id = info.id.unwrap_or_else(|| container.to_string());
    let labels = info
        .config
        .and_then(|config| config.labels)
        .unwrap_or_default();

    Ok(ContainerContext { id, labels })
}

/// Resolves once the container is no longer running.
pub async fn wait_for_exit(docker: &Docker, container_id: &str) {
    let options: WaitContainerOptions = WaitContainerOptionsBuilder::new()
        .condition("not-running")
        .build();
    let mut stream = std::pin::pin!(docker.wait_container(container_id, Some(options)));

    match stream.next().await {
        Some(Ok(response)) => {
            log::info!(
                "Container {container_id} exited with status {}",
                response.status_code
            );
        }
        // Non-zero exits are reported as errors by bollard.
        Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => {
            log::info!("Container {container_id} exited with status {code}");
        }
        Some(Err(e)) => log::warn!("Failed waiting on container {container_id}: {e}"),
        None => log::warn!("Wait stream for container {container_id} ended without a status"),
    }
}
