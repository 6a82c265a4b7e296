use tracing::trace;

// Trace-level metric events. The Prometheus endpoint only renders what a
// recorder has collected; these stay on the tracing side.

pub fn inc_requests(route: &'static str) {
    trace!(
        target = "listing_quality.metrics",
        route = route,
        "requests_total_inc"
    );
}

pub fn event_handled(outcome: &'static str, elapsed_ms: u128) {
    trace!(
        target = "listing_quality.metrics",
        outcome = outcome,
        elapsed_ms = elapsed_ms as u64,
        "events_total_inc"
    );
}

pub fn dependency_elapsed(service: &'static str, ok: bool, elapsed_ms: u128) {
    trace!(
        target = "listing_quality.metrics",
        service = service,
        ok = ok,
        elapsed_ms = elapsed_ms as u64,
        "dependency_elapsed"
    );
}
