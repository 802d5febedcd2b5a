//! # Observability
//!
//! Prometheus metrics for the controller. Structured logging is configured in
//! `runtime::initialization`.

pub mod metrics;
