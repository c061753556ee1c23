use crate::net::{ACTIVE_CONNECTIONS, CLOSED_CONNECTIONS, OPENED_CONNECTIONS};
use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::atomic::Ordering;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref CONNECTION_GAUGE: Gauge = Gauge::new(
        "tempest_active_connections",
        "Number of currently open probe connections"
    )
    .expect("metric can be created");
    pub static ref OPENED_GAUGE: IntGauge = IntGauge::new(
        "tempest_connections_opened",
        "Total probe connections opened since start"
    )
    .expect("metric can be created");
    pub static ref CLOSED_GAUGE: IntGauge = IntGauge::new(
        "tempest_connections_closed",
        "Total probe connections closed since start"
    )
    .expect("metric can be created");
    /// Count of flood connect attempts the target refused or reset
    pub static ref FLOOD_REFUSED: IntCounter = IntCounter::new(
        "tempest_flood_refused_total",
        "Total flood connect attempts that failed"
    )
    .expect("metric can be created");
    /// Count of anomalous probe observations (unexpected data, idle timeout not enforced)
    pub static ref PROBE_ANOMALIES: IntCounter = IntCounter::new(
        "tempest_probe_anomalies_total",
        "Total anomalous observations across probes"
    )
    .expect("metric can be created");
}

pub fn register_metrics() {
    let _ = REGISTRY.register(Box::new(CONNECTION_GAUGE.clone()));
    let _ = REGISTRY.register(Box::new(OPENED_GAUGE.clone()));
    let _ = REGISTRY.register(Box::new(CLOSED_GAUGE.clone()));
    let _ = REGISTRY.register(Box::new(FLOOD_REFUSED.clone()));
    let _ = REGISTRY.register(Box::new(PROBE_ANOMALIES.clone()));
}

fn update_metrics() {
    CONNECTION_GAUGE.set(ACTIVE_CONNECTIONS.load(Ordering::SeqCst) as f64);
    OPENED_GAUGE.set(OPENED_CONNECTIONS.load(Ordering::SeqCst) as i64);
    CLOSED_GAUGE.set(CLOSED_CONNECTIONS.load(Ordering::SeqCst) as i64);
}

pub fn render_metrics() -> String {
    update_metrics();

    let metric_families = REGISTRY.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|_| "# Error: Invalid UTF8".to_string())
}
