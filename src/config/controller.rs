//! # Generation Configuration
//!
//! Deployment-wide generation defaults and regeneration policy.

use super::env_var_or_default;
use crate::constants::*;
use crate::controller::generator::{GenerationDefaults, ResolveError};
use std::time::Duration;

/// Controller configuration shared by every reconcile pass
///
/// The configuration is read once at startup and is immutable afterwards.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Length and encoding used when a resource or annotation omits them
    pub defaults: GenerationDefaults,
    /// Regenerate annotated Secrets that lack the secure marker
    pub regenerate_insecure: bool,
    /// Fixed delay before retrying after a random-source failure
    pub generation_error_requeue: Duration,
    /// Delay before retrying after a conflict or already-exists error
    pub conflict_requeue: Duration,
    /// Run the controller for annotation-driven Secrets
    pub watch_annotated_secrets: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            defaults: GenerationDefaults::default(),
            regenerate_insecure: false,
            generation_error_requeue: Duration::from_secs(DEFAULT_GENERATION_ERROR_REQUEUE_SECS),
            conflict_requeue: Duration::from_secs(DEFAULT_CONFLICT_REQUEUE_SECS),
            watch_annotated_secrets: true,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    ///
    /// Unparseable numeric or boolean values fall back to their defaults.
    /// An invalid `SECRET_LENGTH` or `SECRET_ENCODING` is an error: every
    /// pass depends on them, so the controller refuses to start.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] when the default length or encoding is invalid.
    pub fn from_env() -> Result<Self, ResolveError> {
        let length =
            std::env::var("SECRET_LENGTH").unwrap_or_else(|_| DEFAULT_SECRET_LENGTH.to_string());
        let encoding = std::env::var("SECRET_ENCODING")
            .unwrap_or_else(|_| DEFAULT_SECRET_ENCODING.to_string());

        Ok(Self {
            defaults: GenerationDefaults::parse(&length, &encoding)?,
            regenerate_insecure: env_var_or_default("REGENERATE_INSECURE", false),
            generation_error_requeue: Duration::from_secs(env_var_or_default(
                "GENERATION_ERROR_REQUEUE_SECS",
                DEFAULT_GENERATION_ERROR_REQUEUE_SECS,
            )),
            conflict_requeue: Duration::from_secs(env_var_or_default(
                "CONFLICT_REQUEUE_SECS",
                DEFAULT_CONFLICT_REQUEUE_SECS,
            )),
            watch_annotated_secrets: env_var_or_default("WATCH_ANNOTATED_SECRETS", true),
        })
    }
}
