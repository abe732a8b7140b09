use bollard::Docker;
use bollard::container::LogOutput;
use bollard::query_parameters::{LogsOptions, LogsOptionsBuilder};
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Starts copying a container's output into two byte sinks.
///
/// `since` is a Unix timestamp; 0 means only output produced from now on.
/// Implementations return immediately and keep copying in the background
/// until both sinks are closed by their readers or the log source ends.
/// Both sinks are shut down when copying stops.
pub trait LogFollower {
    fn follow_logs<O, E>(&self, container_id: &str, since: i32, stdout: O, stderr: E)
    where
        O: AsyncWrite + Send + Unpin + 'static,
        E: AsyncWrite + Send + Unpin + 'static;
}

/// Follows logs through the Docker API.
#[derive(Debug, Clone)]
pub struct DockerLogFollower {
    docker: Docker,
}

impl DockerLogFollower {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

fn logs_options(since: i32) -> LogsOptions {
    let builder = LogsOptionsBuilder::new()
        .follow(true)
        .stdout(true)
        .stderr(true);
    // Docker treats since=0 as "no filter" and replays the whole history.
    if since == 0 {
        builder.tail("0").build()
    } else {
        builder.since(since).build()
    }
}

impl LogFollower for DockerLogFollower {
    fn follow_logs<O, E>(&self, container_id: &str, since: i32, stdout: O, stderr: E)
    where
        O: AsyncWrite + Send + Unpin + 'static,
        E: AsyncWrite + Send + Unpin + 'static,
    {
        let docker = self.docker.clone();
        let container_id = container_id.to_string();

        tokio::spawn(async move {
            let frames = std::pin::pin!(docker.logs(&container_id, Some(logs_options(since))));
            copy_log_frames(&container_id, frames, stdout, stderr).await;
        });
    }
}

/// Writes one frame to a sink that is still open. A failed write means the
/// reader went away, so the sink is marked closed and skipped from then on.
async fn forward<W>(
    open: &mut bool,
    sink: &mut W,
    message: &[u8],
    stream: &str,
    container_id: &str,
) where
    W: AsyncWrite + Unpin,
{
    if !*open {
        return;
    }
    if let Err(e) = sink.write_all(message).await {
        log::debug!("Log reader for {stream} of container {container_id} went away: {e}");
        *open = false;
    }
}

/// Routes log frames to the sink of their stream.
///
/// Copying stops when the source ends, when it yields an error, or once
/// both sinks are closed. A closed sink does not affect the other one.
pub async fn copy_log_frames<S, Err, O, E>(
    container_id: &str,
    mut frames: S,
    mut stdout: O,
    mut stderr: E,
) where
    S: Stream<Item = Result<LogOutput, Err>> + Unpin,
    Err: std::fmt::Display,
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        let Some(result) = frames.next().await else {
            break;
        };
        match result {
            Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                forward(&mut stdout_open, &mut stdout, &message, "stdout", container_id).await;
            }
            Ok(LogOutput::StdErr { message }) => {
                forward(&mut stderr_open, &mut stderr, &message, "stderr", container_id).await;
            }
            Ok(LogOutput::StdIn { .. }) => {}
            Err(e) => {
                log::error!("Error following logs for container {container_id}: {e}");
                break;
            }
        }
    }

    let _ = stdout.shutdown().await;
    let _ = stderr.shutdown().await;
    log::info!("Stopped following logs for container {container_id}");
}
