use std::net::SocketAddr;
use std::time::Duration;

use tempest_common::Config;
use tempest_probe::probe::{flood, handshake, zombie, HandshakeOutcome, ZombieOutcome};
use tempest_probe::runner;
use tempest_probe::wire::ReplyKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

/// Config pointed at a local mock target, with short deadlines so the
/// suite stays fast.
fn test_config(port: u16) -> Config {
    let mut cfg = Config::default();
    cfg.target.port = port;
    cfg.target.connect_timeout_secs = 1;
    cfg.zombie.hold_secs = 1;
    cfg.zombie.recv_deadline_secs = 1;
    cfg.handshake.recv_deadline_secs = 1;
    cfg.handshake.idle_deadline_secs = 1;
    cfg.flood.count = 25;
    cfg
}

async fn local_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Binds a port and immediately frees it, leaving nothing listening.
async fn unreachable_port() -> u16 {
    let (listener, addr) = local_listener().await;
    drop(listener);
    addr.port()
}

#[tokio::test]
async fn zombie_reports_enforced_timeout() {
    let (listener, addr) = local_listener().await;

    // Target that drops idle connections well inside the hold.
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        sleep(Duration::from_millis(100)).await;
        drop(socket);
    });

    let outcome = zombie::run(&test_config(addr.port())).await;
    assert!(matches!(outcome, ZombieOutcome::TimeoutEnforced));
}

#[tokio::test]
async fn zombie_reports_unexpected_data() {
    let (listener, addr) = local_listener().await;

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(b"unsolicited").await.unwrap();
        // Hold the socket open past the probe's receive.
        sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    match zombie::run(&test_config(addr.port())).await {
        ZombieOutcome::UnexpectedData(bytes) => assert_eq!(&bytes[..], b"unsolicited"),
        other => panic!("expected UnexpectedData, got {other:?}"),
    }
}

#[tokio::test]
async fn zombie_reports_still_open_when_target_never_closes() {
    let (listener, addr) = local_listener().await;

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        // Neither data nor close for longer than hold + deadline.
        sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    let outcome = zombie::run(&test_config(addr.port())).await;
    assert!(matches!(outcome, ZombieOutcome::StillOpen));
}

#[tokio::test]
async fn zombie_treats_unreachable_target_as_expected_error() {
    let port = unreachable_port().await;
    let outcome = zombie::run(&test_config(port)).await;
    assert!(matches!(outcome, ZombieOutcome::ConnectionError(_)));
}

#[tokio::test]
async fn handshake_reports_close_without_reply() {
    let (listener, addr) = local_listener().await;

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 256];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        drop(socket);
    });

    let outcome = handshake::run(&test_config(addr.port())).await;
    assert!(matches!(outcome, HandshakeOutcome::ClosedOnInvalid));
}

#[tokio::test]
async fn handshake_reports_well_formed_error_reply() {
    let (listener, addr) = local_listener().await;
    let reply = b"HTTP/1.1 400 Bad Request\r\n\r\n";

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut chunk = [0u8; 256];
        let _ = socket.read(&mut chunk).await.unwrap();
        socket.write_all(reply).await.unwrap();
        drop(socket);
    });

    match handshake::run(&test_config(addr.port())).await {
        HandshakeOutcome::Replied { bytes, kind } => {
            assert_eq!(&bytes[..], reply);
            assert_eq!(kind, ReplyKind::HttpStatus { code: 400 });
        }
        other => panic!("expected Replied, got {other:?}"),
    }
}

#[tokio::test]
async fn handshake_reports_raw_reply_bytes() {
    let (listener, addr) = local_listener().await;

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut chunk = [0u8; 256];
        let _ = socket.read(&mut chunk).await.unwrap();
        socket.write_all(b"\xff\xfe not http").await.unwrap();
        drop(socket);
    });

    match handshake::run(&test_config(addr.port())).await {
        HandshakeOutcome::Replied { bytes, kind } => {
            assert_eq!(&bytes[..], b"\xff\xfe not http");
            assert_eq!(kind, ReplyKind::Raw);
        }
        other => panic!("expected Replied, got {other:?}"),
    }
}

#[tokio::test]
async fn flood_accounts_for_every_task() {
    let (listener, addr) = local_listener().await;

    tokio::spawn(async move {
        loop {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        }
    });

    let report = flood::run(&test_config(addr.port())).await;
    assert_eq!(report.launched, 25);
    assert_eq!(report.connected + report.refused, 25);
    assert!(report.connected > 0);
}

#[tokio::test]
async fn flood_with_zero_count_returns_immediately() {
    let mut cfg = test_config(1); // port never dialed
    cfg.flood.count = 0;

    let report = timeout(Duration::from_secs(1), flood::run(&cfg))
        .await
        .expect("flood with count 0 must not block");
    assert_eq!(report.launched, 0);
    assert_eq!(report.connected, 0);
    assert_eq!(report.refused, 0);
}

#[tokio::test]
async fn flood_survives_total_refusal() {
    let port = unreachable_port().await;
    let report = flood::run(&test_config(port)).await;

    assert_eq!(report.launched, 25);
    assert_eq!(report.connected, 0);
    assert_eq!(report.refused, 25);
}

#[tokio::test]
async fn harness_runs_probes_in_fixed_order() {
    let (listener, addr) = local_listener().await;

    // Target that closes every connection on sight; every probe still runs.
    tokio::spawn(async move {
        loop {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        }
    });

    let mut cfg = test_config(addr.port());
    cfg.zombie.hold_secs = 0;
    cfg.flood.count = 5;

    let report = runner::run_harness(&cfg).await;
    let names: Vec<&str> = report.records.iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["zombie", "invalid-handshake", "flood"]);
}
