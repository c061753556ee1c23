pub mod flood;
pub mod handshake;
pub mod zombie;

pub use flood::FloodReport;
pub use handshake::HandshakeOutcome;
pub use zombie::ZombieOutcome;
