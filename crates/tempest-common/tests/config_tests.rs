use tempest_common::Config;

#[test]
fn defaults_match_documented_target() {
    let cfg = Config::default();
    assert_eq!(cfg.target_addr(), "127.0.0.1:8080");
    assert!(cfg.zombie.hold_secs > 5, "hold must clear the idle timeout");
    assert_eq!(cfg.flood.count, 100);
    assert!(!cfg.metrics.enabled);
}

#[test]
fn partial_yaml_fills_in_defaults() {
    let cfg: Config = serde_yaml::from_str("target:\n  port: 9000\nflood:\n  count: 25\n").unwrap();
    assert_eq!(cfg.target_addr(), "127.0.0.1:9000");
    assert_eq!(cfg.flood.count, 25);
    assert_eq!(cfg.zombie.hold_secs, 7);
}

#[test]
fn empty_yaml_is_a_full_config() {
    let cfg: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(cfg.target.connect_timeout_secs, 5);
    assert_eq!(cfg.handshake.recv_deadline_secs, 5);
}
