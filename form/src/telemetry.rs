//! Telemetry events and the default `tracing` + `metrics` sink.

use dynform_core::environment::{Clock, Telemetry, TelemetryDetail, TelemetryEvent};

/// Reported after a successful submission; target is the submission URL.
pub const FORM_SUBMIT: &str = "form:submit";

/// Reported after a failed submission; target is the error message.
pub const FORM_ERROR: &str = "form:error";

/// Build a timestamped event.
#[must_use]
pub fn event(
    name: &str,
    source: &str,
    target: impl Into<String>,
    clock: &dyn Clock,
) -> TelemetryEvent {
    TelemetryEvent {
        name: name.to_string(),
        detail: TelemetryDetail {
            source: source.to_string(),
            target: target.into(),
        },
        at: clock.now(),
    }
}

/// Logs events through `tracing` and counts them with `metrics`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn report(&self, event: TelemetryEvent) {
        tracing::info!(
            event = %event.name,
            source = %event.detail.source,
            event_target = %event.detail.target,
            at = %event.at,
            "Telemetry event"
        );
        metrics::counter!("dynform.telemetry.events", "event" => event.name).increment(1);
    }
}
