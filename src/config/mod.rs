//! # Controller Configuration
//!
//! Controller-level configuration loaded from environment variables (populated from ConfigMap).
//!
//! All configuration has sensible defaults and can be overridden via environment variables.
//! Environment variables are populated from a ConfigMap using `envFrom` in the deployment.

mod controller;
mod server;

pub use controller::ControllerConfig;
pub use server::ServerConfig;

use crate::controller::generator::ResolveError;

/// Load configuration from environment variables with defaults
///
/// # Errors
///
/// Returns an error if the default length or encoding taken from the
/// environment cannot be resolved.
pub fn load_config() -> Result<(ControllerConfig, ServerConfig), ResolveError> {
    Ok((ControllerConfig::from_env()?, ServerConfig::from_env()))
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
