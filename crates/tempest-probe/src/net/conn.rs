//! The connection primitive shared by all probes.
//!
//! Each probe (or flood task) owns exactly one `ProbeConn` for its
//! lifetime. Open/close accounting runs through a drop guard so the
//! close side is counted exactly once on every exit path, error paths
//! included.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ProbeError;
use crate::net::deadline::{drain_with_deadline, read_with_deadline, Drained};

pub static OPENED_CONNECTIONS: AtomicUsize = AtomicUsize::new(0);
pub static CLOSED_CONNECTIONS: AtomicUsize = AtomicUsize::new(0);
pub static ACTIVE_CONNECTIONS: AtomicUsize = AtomicUsize::new(0);

struct ConnGuard;

impl ConnGuard {
    fn new() -> Self {
        OPENED_CONNECTIONS.fetch_add(1, Ordering::SeqCst);
        ACTIVE_CONNECTIONS.fetch_add(1, Ordering::SeqCst);
        Self
    }
}

impl Drop for ConnGuard {
    fn drop(&mut self) {
        CLOSED_CONNECTIONS.fetch_add(1, Ordering::SeqCst);
        ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::SeqCst);
    }
}

/// What a deadline-bounded receive observed.
#[derive(Debug)]
pub enum Received {
    Data(Bytes),
    /// Zero-byte read: the peer closed its side of the stream.
    Closed,
    /// Neither data nor close arrived within the deadline.
    NoReply,
}

/// One TCP connection to the target, exclusively owned by a single probe
/// or flood task.
pub struct ProbeConn {
    stream: TcpStream,
    _guard: ConnGuard,
}

impl ProbeConn {
    /// Connects to `addr`, bounded by `connect_timeout`.
    pub async fn open(addr: &str, connect_timeout: Duration) -> Result<Self, ProbeError> {
        match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                debug!(addr, "connected");
                Ok(Self {
                    stream,
                    _guard: ConnGuard::new(),
                })
            }
            Ok(Err(e)) => Err(ProbeError::Connect {
                addr: addr.to_string(),
                source: e,
            }),
            Err(_) => Err(ProbeError::Connect {
                addr: addr.to_string(),
                source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
            }),
        }
    }

    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), ProbeError> {
        self.stream.write_all(bytes).await.map_err(ProbeError::Send)
    }

    /// Performs one receive of at most `max` bytes, bounded by `deadline`.
    pub async fn recv(&mut self, max: usize, deadline: Duration) -> Result<Received, ProbeError> {
        let mut buf = vec![0u8; max];
        match read_with_deadline(&mut self.stream, &mut buf, deadline).await {
            Ok(0) => Ok(Received::Closed),
            Ok(n) => Ok(Received::Data(Bytes::copy_from_slice(&buf[..n]))),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(Received::NoReply),
            Err(e) => Err(ProbeError::Receive(e)),
        }
    }

    /// Reads the target's reply until close, deadline, or `max_bytes`.
    pub async fn drain(
        &mut self,
        max_bytes: usize,
        idle_deadline: Duration,
        total_deadline: Duration,
    ) -> Result<Drained, ProbeError> {
        drain_with_deadline(&mut self.stream, max_bytes, idle_deadline, total_deadline)
            .await
            .map_err(ProbeError::Receive)
    }

    /// Gracefully shuts the connection down. Accounting-wise this is
    /// equivalent to dropping the connection; either way the close is
    /// counted exactly once.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "shutdown failed, peer already gone");
        }
    }
}
