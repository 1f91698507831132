//! Telemetry boundary.

use log::info;
use serde_json::{Map, Value};

/// Flat key/value event payload.
pub type TelemetryPayload = Map<String, Value>;

/// Analytics sink. Implementations must not block and must swallow their own
/// failures.
pub trait TelemetrySink: Send + Sync {
    fn log_event(&self, name: &str, payload: &TelemetryPayload);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn log_event(&self, _name: &str, _payload: &TelemetryPayload) {}
}

/// Forwards events to the log file. Only payload keys are written, never
/// values, since values can carry user text.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn log_event(&self, name: &str, payload: &TelemetryPayload) {
        let keys = payload.keys().map(String::as_str).collect::<Vec<_>>();
        info!(
            "event=telemetry module=telemetry status=ok name={} keys={}",
            name,
            keys.join(",")
        );
    }
}
