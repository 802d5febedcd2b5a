//! # Metrics Module
//!
//! Prometheus metrics for monitoring the controller, organized by responsibility.
//!
//! ## Sub-modules
//!
//! - `registry` - Metrics registry setup and registration
//! - `controller_metrics` - Reconcile passes, errors and requeues
//! - `generation_metrics` - Generated fields and Secret writes

pub mod controller_metrics;
pub mod generation_metrics;
pub mod registry;

pub use controller_metrics::*;
pub use generation_metrics::*;
pub use registry::*;
