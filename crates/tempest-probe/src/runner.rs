//! Fixed-order probe sequencing and the human-readable report.
//!
//! The runner always executes zombie, then invalid handshake, then
//! flood; no outcome gates the next probe and the process exits
//! successfully regardless of what was observed.

use tempest_common::Config;

use crate::probe::{flood, handshake, zombie};

/// One executed probe, in execution order.
#[derive(Debug)]
pub struct ProbeRecord {
    pub name: &'static str,
    pub summary: String,
}

#[derive(Debug)]
pub struct HarnessReport {
    pub records: Vec<ProbeRecord>,
}

/// Runs all three probes against the configured target and prints the
/// labeled progress and outcome lines.
pub async fn run_harness(config: &Config) -> HarnessReport {
    let mut records = Vec::with_capacity(3);

    println!("--- Starting Tempest resilience probes ---");

    println!(
        "\n1. Testing zombie connection (expect close within {}s hold)",
        config.zombie.hold_secs
    );
    let outcome = zombie::run(config).await;
    println!("[Zombie] {outcome}");
    records.push(ProbeRecord {
        name: "zombie",
        summary: outcome.to_string(),
    });

    println!("\n2. Testing invalid handshake (expect immediate close)");
    let outcome = handshake::run(config).await;
    println!("[Invalid] {outcome}");
    records.push(ProbeRecord {
        name: "invalid-handshake",
        summary: outcome.to_string(),
    });

    println!("\n3. Testing connection flood");
    println!("[Flood] Starting {} connections...", config.flood.count);
    let report = flood::run(config).await;
    println!("[Flood] {report}");
    records.push(ProbeRecord {
        name: "flood",
        summary: report.to_string(),
    });

    println!("\nProbes finished.");

    HarnessReport { records }
}
