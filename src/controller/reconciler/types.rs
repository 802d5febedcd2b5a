//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::constants::{BACKOFF_MAX_MINUTES, BACKOFF_MIN_MINUTES};
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::generator::{GenerationError, ResolveError, ValueGenerator};
use crate::controller::policy::DuplicateKeyError;
use crate::controller::store::{ObjectKey, SecretStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Failures of a reconcile pass
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("invalid length '{value}': {reason}")]
    InvalidLength { value: String, reason: String },
    #[error("invalid encoding '{value}'")]
    InvalidEncoding { value: String },
    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),
    #[error("failed to generate value for key '{key}': {source}")]
    Generation {
        key: String,
        #[source]
        source: GenerationError,
    },
    #[error("{0} was modified concurrently")]
    Conflict(ObjectKey),
    #[error("{0} not found")]
    NotFound(ObjectKey),
    #[error("{0} already exists")]
    AlreadyExists(ObjectKey),
    #[error("cannot reference {0}")]
    ReferenceResolution(String),
    #[error("Kubernetes API error: {0}")]
    Store(#[source] kube::Error),
}

/// How the error policy schedules the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Fixed delay (random source failure)
    Delayed,
    /// Short delay (lost a write race)
    Immediate,
    /// Wait for the resource to change
    NonRetryable,
    /// Per-resource Fibonacci backoff
    Backoff,
}

impl RetryClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RetryClass::Delayed => "generation-error",
            RetryClass::Immediate => "conflict",
            RetryClass::NonRetryable => "invalid-spec",
            RetryClass::Backoff => "error-backoff",
        }
    }
}

impl ReconcilerError {
    #[must_use]
    pub fn retry_class(&self) -> RetryClass {
        match self {
            ReconcilerError::Generation { .. } => RetryClass::Delayed,
            ReconcilerError::Conflict(_) | ReconcilerError::AlreadyExists(_) => {
                RetryClass::Immediate
            }
            ReconcilerError::InvalidLength { .. }
            | ReconcilerError::InvalidEncoding { .. }
            | ReconcilerError::DuplicateKey(_) => RetryClass::NonRetryable,
            ReconcilerError::NotFound(_)
            | ReconcilerError::ReferenceResolution(_)
            | ReconcilerError::Store(_) => RetryClass::Backoff,
        }
    }

    /// Label value for the error metrics
    #[must_use]
    pub fn metric_label(&self) -> &'static str {
        match self {
            ReconcilerError::InvalidLength { .. } => "invalid_length",
            ReconcilerError::InvalidEncoding { .. } => "invalid_encoding",
            ReconcilerError::DuplicateKey(_) => "duplicate_key",
            ReconcilerError::Generation { .. } => "generation",
            ReconcilerError::Conflict(_) => "conflict",
            ReconcilerError::NotFound(_) => "not_found",
            ReconcilerError::AlreadyExists(_) => "already_exists",
            ReconcilerError::ReferenceResolution(_) => "reference_resolution",
            ReconcilerError::Store(_) => "store",
        }
    }
}

impl From<ResolveError> for ReconcilerError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::InvalidLength { value, reason } => {
                ReconcilerError::InvalidLength { value, reason }
            }
            ResolveError::InvalidEncoding { value } => ReconcilerError::InvalidEncoding { value },
        }
    }
}

impl From<StoreError> for ReconcilerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(key) => ReconcilerError::NotFound(key),
            StoreError::AlreadyExists(key) => ReconcilerError::AlreadyExists(key),
            StoreError::Conflict(key) => ReconcilerError::Conflict(key),
            StoreError::Api(e) => ReconcilerError::Store(e),
        }
    }
}

/// What a successful pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The triggering object no longer exists
    ResourceGone,
    /// A new Secret was created with `fields` generated values
    Created { fields: usize },
    /// An existing Secret was rewritten; `regenerated` keys got new values
    Updated { regenerated: usize },
    /// Nothing to write
    Unchanged,
    /// A Secret with the same name exists but is not managed by a `String`
    SkippedNotOwned,
}

/// Backoff state for a specific resource
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl Default for BackoffState {
    fn default() -> Self {
        Self {
            backoff: FibonacciBackoff::new(BACKOFF_MIN_MINUTES, BACKOFF_MAX_MINUTES),
            error_count: 0,
        }
    }
}

impl BackoffState {
    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}

/// Shared reconciler context
///
/// Holds no per-pass state: each pass reads a fresh snapshot through `store`.
/// `backoff_states` belongs to the error policy and is keyed by
/// `kind/namespace/name`.
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn SecretStore>,
    pub generator: ValueGenerator,
    pub config: ControllerConfig,
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(store: Arc<dyn SecretStore>, generator: ValueGenerator, config: ControllerConfig) -> Self {
        Self {
            store,
            generator,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Forget accumulated backoff after a successful pass
    ///
    /// The entry is dropped so deleted objects do not linger in the map.
    pub fn reset_backoff(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }

    /// Record one more failure for `resource_key` and return the delay in seconds
    /// together with the consecutive error count
    pub fn next_backoff(&self, resource_key: &str) -> Option<(u64, u32)> {
        let mut states = self.backoff_states.lock().ok()?;
        let state = states.entry(resource_key.to_string()).or_default();
        state.increment_error();
        Some((state.backoff.next_backoff_seconds(), state.error_count))
    }
}
