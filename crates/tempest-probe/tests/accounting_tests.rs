//! Open/close parity for the connection accounting.
//!
//! Runs alone in its own test binary so the process-wide counters see
//! no traffic other than what this file generates.

use std::sync::atomic::Ordering;
use std::time::Duration;

use tempest_common::Config;
use tempest_probe::net::{ACTIVE_CONNECTIONS, CLOSED_CONNECTIONS, OPENED_CONNECTIONS};
use tempest_probe::probe::{flood, handshake, zombie};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn test_config(port: u16) -> Config {
    let mut cfg = Config::default();
    cfg.target.port = port;
    cfg.target.connect_timeout_secs = 1;
    cfg.zombie.hold_secs = 0;
    cfg.zombie.recv_deadline_secs = 1;
    cfg.handshake.recv_deadline_secs = 1;
    cfg.handshake.idle_deadline_secs = 1;
    cfg.flood.count = 10;
    cfg
}

#[tokio::test]
async fn every_opened_connection_is_closed_exactly_once() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Target that answers the decoy request and closes everything else
    // on sight.
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let mut chunk = [0u8; 256];
                match socket.read(&mut chunk).await {
                    Ok(n) if n > 0 => {
                        let _ = socket.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await;
                    }
                    _ => {}
                }
                drop(socket);
            });
        }
    });

    let cfg = test_config(addr.port());

    let _ = zombie::run(&cfg).await;
    assert_parity("zombie");

    let _ = handshake::run(&cfg).await;
    assert_parity("handshake");

    let report = flood::run(&cfg).await;
    assert_eq!(report.connected + report.refused, report.launched);
    assert_parity("flood");

    // Error path: nothing listening. Failed connects open nothing, so
    // parity must be untouched.
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_port = dead.local_addr().unwrap().port();
    drop(dead);

    let _ = zombie::run(&test_config(dead_port)).await;
    let _ = handshake::run(&test_config(dead_port)).await;
    assert_parity("unreachable target");
}

fn assert_parity(stage: &str) {
    let opened = OPENED_CONNECTIONS.load(Ordering::SeqCst);
    let closed = CLOSED_CONNECTIONS.load(Ordering::SeqCst);
    let active = ACTIVE_CONNECTIONS.load(Ordering::SeqCst);
    assert_eq!(opened, closed, "open/close parity after {stage}");
    assert_eq!(active, 0, "no connection may outlive its probe ({stage})");
}
