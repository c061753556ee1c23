pub mod conn;
pub mod deadline;

pub use conn::{ProbeConn, Received, ACTIVE_CONNECTIONS, CLOSED_CONNECTIONS, OPENED_CONNECTIONS};
pub use deadline::{drain_with_deadline, read_with_deadline, DeadlineReader, Drained};
