//! Invalid-handshake probe: sends a plausible-looking request for a
//! resource the target cannot know, then watches what comes back.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use tempest_common::Config;

use crate::error::ProbeError;
use crate::net::ProbeConn;
use crate::wire::{self, ReplyKind, DECOY_REQUEST};

/// Cap on how much of a reply is retained for the report.
const REPLY_MAX: usize = 4096;

#[derive(Debug)]
pub enum HandshakeOutcome {
    /// The target closed without replying.
    ClosedOnInvalid,
    /// The target replied; informational, not a failure. Servers may
    /// legitimately answer with an error response before closing.
    Replied { bytes: Bytes, kind: ReplyKind },
    /// Neither reply nor close within the deadline.
    NoReply,
    /// Send or receive failed at the socket level; expected-possible,
    /// not escalated.
    SocketError(ProbeError),
}

impl fmt::Display for HandshakeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClosedOnInvalid => write!(f, "connection closed on invalid input (success)"),
            Self::Replied { bytes, kind } => match kind {
                ReplyKind::HttpStatus { code } => write!(
                    f,
                    "server replied with HTTP status {code}: {}",
                    wire::preview(bytes, 128)
                ),
                ReplyKind::Raw => {
                    write!(f, "server replied: {}", wire::preview(bytes, 128))
                }
            },
            Self::NoReply => write!(f, "no reply and no close within deadline"),
            Self::SocketError(e) => write!(f, "socket error (expected-possible): {e}"),
        }
    }
}

/// Opens a connection, sends the decoy request, then drains the reply
/// under idle and total deadlines.
pub async fn run(config: &Config) -> HandshakeOutcome {
    let addr = config.target_addr();
    let connect_timeout = Duration::from_secs(config.target.connect_timeout_secs);

    let mut conn = match ProbeConn::open(&addr, connect_timeout).await {
        Ok(conn) => conn,
        Err(e) => {
            info!(error = %e, "handshake connect failed");
            return HandshakeOutcome::SocketError(e);
        }
    };

    debug!(request = %wire::preview(&DECOY_REQUEST, 64), "sending decoy request");
    if let Err(e) = conn.send(&DECOY_REQUEST).await {
        info!(error = %e, "decoy send failed");
        conn.close().await;
        return HandshakeOutcome::SocketError(e);
    }

    let idle = Duration::from_secs(config.handshake.idle_deadline_secs);
    let total = Duration::from_secs(config.handshake.recv_deadline_secs);
    let outcome = match conn.drain(REPLY_MAX, idle, total).await {
        Ok(drained) if drained.bytes.is_empty() && drained.eof => HandshakeOutcome::ClosedOnInvalid,
        Ok(drained) if drained.bytes.is_empty() => HandshakeOutcome::NoReply,
        Ok(drained) => {
            let kind = wire::classify_reply(&drained.bytes);
            debug!(
                len = drained.bytes.len(),
                eof = drained.eof,
                timed_out = drained.timed_out,
                "reply drained"
            );
            HandshakeOutcome::Replied {
                bytes: drained.bytes,
                kind,
            }
        }
        Err(e) => {
            info!(error = %e, "reply receive failed");
            HandshakeOutcome::SocketError(e)
        }
    };

    conn.close().await;
    outcome
}
