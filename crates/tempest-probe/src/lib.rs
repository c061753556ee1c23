pub mod error;
pub mod metrics;
pub mod net;
pub mod probe;
pub mod runner;
pub mod wire;

pub use error::ProbeError;
pub use net::{ProbeConn, Received, ACTIVE_CONNECTIONS};
pub use runner::{run_harness, HarnessReport};
