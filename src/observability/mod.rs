//! Observability for the adapter
//!
//! Structured JSON logging of provisioning and query lifecycle events.
//!
//! # Usage
//!
//! ```ignore
//! use aerodoc::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ProvisionComplete, &[("db", "test"), ("table", "users")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event_severity(event), event.as_str(), fields);
}

/// Failures are ERROR, everything else INFO
fn event_severity(event: Event) -> Severity {
    if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event at TRACE level
pub fn trace_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(Severity::Trace, event.as_str(), fields);
}
