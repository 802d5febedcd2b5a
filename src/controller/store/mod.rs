//! # Object Store
//!
//! The narrow contract the reconciler uses to read and write cluster objects.
//!
//! - [`KubeStore`] talks to the API server through `kube::Api`
//! - [`InMemoryStore`] keeps objects in memory and enforces the same
//!   optimistic-concurrency rules; scenario tests drive the reconciler with it
//!
//! Writes are conditioned on `metadata.resourceVersion` of the object passed in.
//! A stale version surfaces as [`StoreError::Conflict`].

mod cluster;
mod memory;

pub use cluster::KubeStore;
pub use memory::InMemoryStore;

use crate::crd::{StringSecret, StringSecretStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use std::fmt;
use thiserror::Error;

/// Namespaced object name used in store errors
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub(crate) fn of(meta: &kube::api::ObjectMeta) -> Self {
        Self::new(
            meta.namespace.clone().unwrap_or_default(),
            meta.name.clone().unwrap_or_default(),
        )
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Failures reported by a [`SecretStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(ObjectKey),
    #[error("{0} already exists")]
    AlreadyExists(ObjectKey),
    #[error("{0} was modified concurrently")]
    Conflict(ObjectKey),
    #[error("Kubernetes API error: {0}")]
    Api(#[source] kube::Error),
}

/// Classify a kube error for `key`
pub(crate) fn map_kube_error(error: kube::Error, key: ObjectKey) -> StoreError {
    match error {
        kube::Error::Api(api_err) if api_err.code == 404 => StoreError::NotFound(key),
        kube::Error::Api(api_err) if api_err.code == 409 && api_err.reason == "AlreadyExists" => {
            StoreError::AlreadyExists(key)
        }
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict(key),
        other => StoreError::Api(other),
    }
}

/// Get/create/update primitives against the cluster
#[async_trait]
pub trait SecretStore: Send + Sync + fmt::Debug {
    /// Fetch a `StringSecret`, `None` if it does not exist
    async fn get_string_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StringSecret>, StoreError>;

    /// Replace the status of a `StringSecret`
    ///
    /// When `resource_version` is set the write fails with
    /// [`StoreError::Conflict`] unless it matches the stored version.
    async fn update_string_secret_status(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        status: &StringSecretStatus,
    ) -> Result<(), StoreError>;

    /// Fetch a Secret, `None` if it does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError>;

    /// Create a Secret; fails with [`StoreError::AlreadyExists`] if the name is taken
    async fn create_secret(&self, secret: &Secret) -> Result<Secret, StoreError>;

    /// Replace a Secret conditioned on its `resourceVersion`
    async fn update_secret(&self, secret: &Secret) -> Result<Secret, StoreError>;
}
