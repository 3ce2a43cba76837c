//! Metrics/tracing hooks.
//!
//! Controller events are emitted as trace-level events so a subscriber can
//! count them; nothing here aggregates.

pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::trace_span!("dsrows", event);
    let _entered = span.enter();
    for (k, v) in key_values {
        tracing::trace!(%event, %k, %v, "metric");
    }
}
