//! Fire-and-forget delivery of serialized records.
//!
//! Records are relayed over UDP because the collector is expected to
//! live on the same host and UDP has no backpressure to deal with. A
//! datagram that cannot be sent is dropped; nothing is retried.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

/// Largest payload a single IPv4 UDP datagram can carry.
pub const MAX_DATAGRAM_LEN: usize = 65_507;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Address {0:?} did not resolve to any socket address")]
    NoAddress(String),
}

/// A destination that receives each record at most once.
pub trait BestEffortSink: Send + Sync {
    /// Hands one serialized record to the transport. Never blocks and
    /// never reports failure to the caller.
    fn deliver(&self, record: &[u8]);
}

#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpSink {
    /// Resolves `addr` and connects a non-blocking socket to the first
    /// address it yields.
    pub async fn connect(addr: &str) -> Result<Self, SinkError> {
        let peer = tokio::net::lookup_host(addr)
            .await?
            .next()
            .ok_or_else(|| SinkError::NoAddress(addr.to_string()))?;

        let local: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(peer)?;
        socket.set_nonblocking(true)?;

        Ok(Self { socket, peer })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl BestEffortSink for UdpSink {
    fn deliver(&self, record: &[u8]) {
        if record.len() > MAX_DATAGRAM_LEN {
            log::warn!(
                "Dropped {} byte record for syslog at {}: larger than one datagram",
                record.len(),
                self.peer
            );
            return;
        }
        if let Err(e) = self.socket.send(record) {
            log::debug!("Dropped record for syslog at {}: {}", self.peer, e);
        }
    }
}
