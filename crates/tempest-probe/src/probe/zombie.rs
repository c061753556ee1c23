//! Zombie probe: holds a silent connection past the target's idle
//! timeout and checks that the target hangs up.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::sleep;
use tracing::{info, warn};

use tempest_common::Config;

use crate::error::ProbeError;
use crate::metrics;
use crate::net::{ProbeConn, Received};
use crate::wire;

const RECV_MAX: usize = 1024;

#[derive(Debug)]
pub enum ZombieOutcome {
    /// End-of-stream after the hold: the target enforced its idle timeout.
    TimeoutEnforced,
    /// The target sent data to a connection that never asked for anything.
    UnexpectedData(Bytes),
    /// Neither data nor close within the receive deadline: the idle
    /// timeout was not observed inside the hold margin.
    StillOpen,
    /// Connect or receive failed at the socket level. A reset is also
    /// evidence the target tore the connection down.
    ConnectionError(ProbeError),
}

impl fmt::Display for ZombieOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeoutEnforced => write!(f, "connection closed by server (idle timeout enforced)"),
            Self::UnexpectedData(bytes) => write!(
                f,
                "received {} unexpected byte(s): {}",
                bytes.len(),
                wire::preview(bytes, 64)
            ),
            Self::StillOpen => write!(
                f,
                "connection still open after hold (no data, no close within deadline)"
            ),
            Self::ConnectionError(e) => write!(f, "socket error (expected if server closed): {e}"),
        }
    }
}

/// Opens a connection, sends nothing, sleeps past the target's idle
/// timeout, then performs one deadline-bounded receive.
pub async fn run(config: &Config) -> ZombieOutcome {
    let addr = config.target_addr();
    let connect_timeout = Duration::from_secs(config.target.connect_timeout_secs);

    let mut conn = match ProbeConn::open(&addr, connect_timeout).await {
        Ok(conn) => conn,
        Err(e) => {
            info!(error = %e, "zombie connect failed before hold");
            return ZombieOutcome::ConnectionError(e);
        }
    };

    info!(hold_secs = config.zombie.hold_secs, "connected, holding silent");
    sleep(Duration::from_secs(config.zombie.hold_secs)).await;

    let deadline = Duration::from_secs(config.zombie.recv_deadline_secs);
    let outcome = match conn.recv(RECV_MAX, deadline).await {
        Ok(Received::Closed) => ZombieOutcome::TimeoutEnforced,
        Ok(Received::Data(bytes)) => {
            warn!(len = bytes.len(), "target sent data to a silent connection");
            metrics::PROBE_ANOMALIES.inc();
            ZombieOutcome::UnexpectedData(bytes)
        }
        Ok(Received::NoReply) => {
            warn!(
                hold_secs = config.zombie.hold_secs,
                "target left the idle connection open"
            );
            metrics::PROBE_ANOMALIES.inc();
            ZombieOutcome::StillOpen
        }
        Err(e) => {
            info!(error = %e, "receive after hold failed");
            ZombieOutcome::ConnectionError(e)
        }
    };

    conn.close().await;
    outcome
}
