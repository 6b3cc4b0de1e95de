//! Observability setup for Oilan: tracing subscriber installation and
//! optional OpenTelemetry export.

pub mod tracing_setup;
