//! Flood driver: a burst of concurrent connect/close cycles against the
//! target, with a join-all barrier before reporting.

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use tempest_common::Config;

use crate::metrics;
use crate::net::ProbeConn;

/// Spawn stagger: after every `STAGGER_EVERY` launches, pause briefly so
/// large bursts do not exhaust local ephemeral ports.
const STAGGER_EVERY: usize = 100;
const STAGGER_PAUSE: Duration = Duration::from_millis(10);

/// Aggregate outcome of one flood run. Individual connect failures are
/// never surfaced; whether the *target* survives the burst is the point.
#[derive(Debug)]
pub struct FloodReport {
    pub launched: usize,
    pub connected: usize,
    pub refused: usize,
}

impl fmt::Display for FloodReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "completed: {} launched, {} connected, {} refused",
            self.launched, self.connected, self.refused
        )
    }
}

/// Launches `flood.count` concurrent connect/close tasks and waits for
/// every one of them to finish before returning.
///
/// Tasks share nothing but the target address. A task that fails to
/// connect counts toward `refused` and affects nothing else.
pub async fn run(config: &Config) -> FloodReport {
    let count = config.flood.count;
    let addr = config.target_addr();
    let connect_timeout = Duration::from_secs(config.target.connect_timeout_secs);

    info!(count, target = %addr, "starting flood");

    let mut handles = Vec::with_capacity(count);
    for i in 0..count {
        let addr = addr.clone();
        handles.push(tokio::spawn(async move {
            match ProbeConn::open(&addr, connect_timeout).await {
                Ok(conn) => {
                    conn.close().await;
                    true
                }
                Err(e) => {
                    debug!(task = i, error = %e, "flood connect failed");
                    false
                }
            }
        }));

        if i != 0 && i % STAGGER_EVERY == 0 {
            sleep(STAGGER_PAUSE).await;
        }
    }

    // Join-all barrier: nothing past this point runs until every task
    // has reached a terminal state.
    let mut connected = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await {
            Ok(true) => connected += 1,
            Ok(false) => refused += 1,
            Err(e) => {
                warn!(error = %e, "flood task join failed");
                refused += 1;
            }
        }
    }

    metrics::FLOOD_REFUSED.inc_by(refused as u64);

    FloodReport {
        launched: count,
        connected,
        refused,
    }
}
