use thiserror::Error;

/// Socket-level failures a probe can observe against the target.
///
/// Every variant is caught at its probe's boundary and folded into that
/// probe's outcome; none of them ever reaches the harness runner.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),

    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),
}
