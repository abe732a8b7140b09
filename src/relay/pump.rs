use std::io;
use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::logger::RelayLogger;
use super::record::Severity;
use crate::shutdown::ShutdownSignal;

/// Longest line a pump accepts before giving up on the stream.
pub const MAX_LINE_LEN: usize = 64 * 1024 - 1;

const PUMP_FUNC: &str = "relay::pump_stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl AsRef<str> for StreamKind {
    fn as_ref(&self) -> &str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl FromStr for StreamKind {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            other => Err(other.to_string()),
        }
    }
}

impl StreamKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::Stdout => Severity::Info,
            Self::Stderr => Severity::Error,
        }
    }
}

/// Why a pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    Exhausted,
    ReadError,
    UnknownStream,
    Shutdown,
}

/// Reads one line without its terminator. `None` means end of stream.
async fn read_line<R>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = MAX_LINE_LEN as u64 + 1;
    let n = (&mut *input).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > MAX_LINE_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line longer than {MAX_LINE_LEN} bytes"),
        ));
    }

    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Drains `input` line by line into `logger` at the severity of the
/// stream named `name`.
///
/// The pump stops at end of stream, on a read error, or once `shutdown`
/// has fired. A stalled read does not delay shutdown. A line that was read
/// completely is always relayed before shutdown is observed again.
pub async fn pump_stream<R>(
    shutdown: ShutdownSignal,
    name: &str,
    logger: &RelayLogger,
    mut input: R,
) -> PumpExit
where
    R: AsyncBufRead + Unpin,
{
    let kind = match name.parse::<StreamKind>() {
        Ok(kind) => kind,
        Err(name) => {
            log::error!("pump_stream(): Unknown stream type '{name}'. Exiting log pump.");
            return PumpExit::UnknownStream;
        }
    };
    let severity = kind.severity();
    let mut buf = Vec::new();

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.fired() => return PumpExit::Shutdown,
            line = read_line(&mut input, &mut buf) => line,
        };

        match line {
            Ok(Some(text)) => {
                log::debug!("docker: {text}");
                logger.log(severity, Some(PUMP_FUNC), &text);
            }
            Ok(None) => break,
            Err(e) => {
                log::error!(
                    "pump_stream() error reading Docker log input: '{e}'. Exiting log pump '{name}'."
                );
                log::warn!("Log pump exited for '{name}'");
                return PumpExit::ReadError;
            }
        }
    }

    log::warn!("Log pump exited for '{name}'");
    PumpExit::Exhausted
}
