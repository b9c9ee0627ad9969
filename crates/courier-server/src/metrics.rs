//! Prometheus metrics recorder and metric name constants.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at process startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

// Metric name constants to avoid typos across modules.

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Frames written to connections total (counter).
pub const WS_FRAMES_SENT_TOTAL: &str = "ws_frames_sent_total";
/// Connections pruned after a failed write (counter).
pub const WS_PRUNES_TOTAL: &str = "ws_prunes_total";
/// Commands dispatched total (counter, labels: action).
pub const ACTIONS_TOTAL: &str = "actions_total";
/// Commands that produced an error reply (counter, labels: action).
pub const ACTION_ERRORS_TOTAL: &str = "action_errors_total";
/// Feed events consumed total (counter).
pub const BRIDGE_EVENTS_TOTAL: &str = "bridge_events_total";
/// Feed events skipped as redeliveries (counter).
pub const BRIDGE_DUPLICATES_TOTAL: &str = "bridge_duplicates_total";
/// Device deliveries that hit the timeout bound (counter).
pub const BRIDGE_DELIVERY_TIMEOUTS_TOTAL: &str = "bridge_delivery_timeouts_total";
/// Ledger rows removed by the cleanup sweep (counter).
pub const LEDGER_PURGED_TOTAL: &str = "ledger_purged_total";
/// Completion requests total (counter).
pub const PROVIDER_REQUESTS_TOTAL: &str = "provider_requests_total";
/// Completion requests that failed (counter).
pub const PROVIDER_ERRORS_TOTAL: &str = "provider_errors_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_snake_case_and_suffixed() {
        for name in [
            WS_CONNECTIONS_TOTAL,
            WS_DISCONNECTIONS_TOTAL,
            WS_FRAMES_SENT_TOTAL,
            WS_PRUNES_TOTAL,
            ACTIONS_TOTAL,
            ACTION_ERRORS_TOTAL,
            BRIDGE_EVENTS_TOTAL,
            BRIDGE_DUPLICATES_TOTAL,
            BRIDGE_DELIVERY_TIMEOUTS_TOTAL,
            LEDGER_PURGED_TOTAL,
            PROVIDER_REQUESTS_TOTAL,
            PROVIDER_ERRORS_TOTAL,
        ] {
            assert!(name.ends_with("_total"), "{name} missing _total suffix");
            assert!(!name.contains('-'));
        }
        assert_eq!(WS_CONNECTIONS_ACTIVE, "ws_connections_active");
    }
}
