use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub zombie: ZombieConfig,
    pub handshake: HandshakeConfig,
    pub flood: FloodConfig,
    pub metrics: MetricsConfig,
}

impl Config {
    /// The `host:port` string every probe connects to.
    pub fn target_addr(&self) -> String {
        format!("{}:{}", self.target.host, self.target.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            connect_timeout_secs: 5,
        }
    }
}

/// Idle-connection probe settings. `hold_secs` must exceed the target's
/// documented idle timeout; the margin is what the probe measures.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ZombieConfig {
    pub hold_secs: u64,
    pub recv_deadline_secs: u64,
}

impl Default for ZombieConfig {
    fn default() -> Self {
        // Target servers under test document a 5s idle timeout; hold for 7s.
        Self {
            hold_secs: 7,
            recv_deadline_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Total time allowed for the target's reply to arrive.
    pub recv_deadline_secs: u64,
    /// Maximum silence between reply fragments before the read is abandoned.
    pub idle_deadline_secs: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            recv_deadline_secs: 5,
            idle_deadline_secs: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FloodConfig {
    /// Number of concurrent connect/close cycles to generate.
    pub count: usize,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self { count: 100 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9095,
        }
    }
}
