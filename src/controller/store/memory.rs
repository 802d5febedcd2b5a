//! In-memory [`SecretStore`] with API-server-like versioning.
//!
//! Every write bumps a store-wide `resourceVersion`. Updates carrying a stale
//! version fail with [`StoreError::Conflict`], creates on a taken name fail with
//! [`StoreError::AlreadyExists`].

use super::{ObjectKey, SecretStore, StoreError};
use crate::crd::{StringSecret, StringSecretStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    string_secrets: BTreeMap<ObjectKey, StringSecret>,
    secrets: BTreeMap<ObjectKey, Secret>,
    last_resource_version: u64,
    secret_writes: usize,
    status_writes: usize,
    pending_secret_conflicts: usize,
    pending_status_conflicts: usize,
}

impl State {
    fn next_resource_version(&mut self) -> String {
        self.last_resource_version += 1;
        self.last_resource_version.to_string()
    }
}

/// Store holding objects in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

fn check_version(
    key: &ObjectKey,
    requested: Option<&str>,
    stored: Option<&str>,
) -> Result<(), StoreError> {
    match requested {
        Some(rv) if Some(rv) != stored => Err(StoreError::Conflict(key.clone())),
        _ => Ok(()),
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a `StringSecret` as if a user had applied it
    ///
    /// Assigns uid, resourceVersion and generation 1.
    pub fn insert_string_secret(&self, mut resource: StringSecret) -> StringSecret {
        let mut state = self.lock();
        resource.metadata.uid = Some(uuid::Uuid::new_v4().to_string());
        resource.metadata.resource_version = Some(state.next_resource_version());
        resource.metadata.generation = Some(1);
        state
            .string_secrets
            .insert(ObjectKey::of(&resource.metadata), resource.clone());
        resource
    }

    /// Edit a stored `StringSecret` spec, bumping generation and resourceVersion
    pub fn modify_string_secret(
        &self,
        namespace: &str,
        name: &str,
        edit: impl FnOnce(&mut StringSecret),
    ) -> Option<StringSecret> {
        let mut state = self.lock();
        let rv = state.next_resource_version();
        let resource = state
            .string_secrets
            .get_mut(&ObjectKey::new(namespace, name))?;
        edit(resource);
        resource.metadata.generation = Some(resource.metadata.generation.unwrap_or(0) + 1);
        resource.metadata.resource_version = Some(rv);
        Some(resource.clone())
    }

    pub fn string_secret(&self, namespace: &str, name: &str) -> Option<StringSecret> {
        self.lock()
            .string_secrets
            .get(&ObjectKey::new(namespace, name))
            .cloned()
    }

    /// Add a Secret directly, bypassing write accounting
    pub fn insert_secret(&self, mut secret: Secret) -> Secret {
        let mut state = self.lock();
        secret.metadata.uid = Some(uuid::Uuid::new_v4().to_string());
        secret.metadata.resource_version = Some(state.next_resource_version());
        state
            .secrets
            .insert(ObjectKey::of(&secret.metadata), secret.clone());
        secret
    }

    /// Mutate a stored Secret as another writer would
    pub fn modify_secret(
        &self,
        namespace: &str,
        name: &str,
        edit: impl FnOnce(&mut Secret),
    ) -> Option<Secret> {
        let mut state = self.lock();
        let rv = state.next_resource_version();
        let secret = state.secrets.get_mut(&ObjectKey::new(namespace, name))?;
        edit(secret);
        secret.metadata.resource_version = Some(rv);
        Some(secret.clone())
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.lock()
            .secrets
            .get(&ObjectKey::new(namespace, name))
            .cloned()
    }

    /// Successful Secret creates and updates issued through the store contract
    pub fn secret_writes(&self) -> usize {
        self.lock().secret_writes
    }

    /// Successful status writes issued through the store contract
    pub fn status_writes(&self) -> usize {
        self.lock().status_writes
    }

    /// Make the next `count` Secret creates/updates fail with a conflict
    pub fn inject_secret_conflicts(&self, count: usize) {
        self.lock().pending_secret_conflicts = count;
    }

    /// Make the next `count` status writes fail with a conflict
    pub fn inject_status_conflicts(&self, count: usize) {
        self.lock().pending_status_conflicts = count;
    }

    fn take_injected_conflict(pending: &mut usize, key: &ObjectKey) -> Result<(), StoreError> {
        if *pending > 0 {
            *pending -= 1;
            return Err(StoreError::Conflict(key.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for InMemoryStore {
    async fn get_string_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StringSecret>, StoreError> {
        Ok(self.string_secret(namespace, name))
    }

    async fn update_string_secret_status(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        status: &StringSecretStatus,
    ) -> Result<(), StoreError> {
        let key = ObjectKey::new(namespace, name);
        let mut state = self.lock();
        Self::take_injected_conflict(&mut state.pending_status_conflicts, &key)?;
        let rv = state.next_resource_version();
        let resource = state
            .string_secrets
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        check_version(
            &key,
            resource_version,
            resource.metadata.resource_version.as_deref(),
        )?;
        resource.status = Some(status.clone());
        resource.metadata.resource_version = Some(rv);
        state.status_writes += 1;
        Ok(())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        Ok(self.secret(namespace, name))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let key = ObjectKey::of(&secret.metadata);
        let mut state = self.lock();
        Self::take_injected_conflict(&mut state.pending_secret_conflicts, &key)?;
        if state.secrets.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }

        let mut created = secret.clone();
        created.metadata.uid = Some(uuid::Uuid::new_v4().to_string());
        created.metadata.resource_version = Some(state.next_resource_version());
        state.secrets.insert(key, created.clone());
        state.secret_writes += 1;
        Ok(created)
    }

    async fn update_secret(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let key = ObjectKey::of(&secret.metadata);
        let mut state = self.lock();
        Self::take_injected_conflict(&mut state.pending_secret_conflicts, &key)?;
        let stored = state
            .secrets
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        check_version(
            &key,
            secret.metadata.resource_version.as_deref(),
            stored.metadata.resource_version.as_deref(),
        )?;

        let mut updated = secret.clone();
        updated.metadata.uid.clone_from(&stored.metadata.uid);
        updated.metadata.resource_version = Some(state.next_resource_version());
        state.secrets.insert(key, updated.clone());
        state.secret_writes += 1;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn secret(name: &str) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_duplicate_create() {
        let store = InMemoryStore::new();
        let created = store.create_secret(&secret("db")).await.unwrap();
        assert!(created.metadata.uid.is_some());
        assert!(created.metadata.resource_version.is_some());

        let err = store.create_secret(&secret("db")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.secret_writes(), 1);
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let store = InMemoryStore::new();
        let created = store.create_secret(&secret("db")).await.unwrap();
        store.modify_secret("default", "db", |s| {
            s.metadata.labels = Some(BTreeMap::from([("team".to_string(), "a".to_string())]));
        });

        let err = store.update_secret(&created).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let fresh = store.secret("default", "db").unwrap();
        let updated = store.update_secret(&fresh).await.unwrap();
        assert_ne!(
            updated.metadata.resource_version,
            fresh.metadata.resource_version
        );
        assert_eq!(updated.metadata.uid, created.metadata.uid);
    }

    #[tokio::test]
    async fn test_update_missing_secret() {
        let store = InMemoryStore::new();
        let err = store.update_secret(&secret("ghost")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_injected_conflicts_are_consumed() {
        let store = InMemoryStore::new();
        store.inject_secret_conflicts(1);
        assert!(matches!(
            store.create_secret(&secret("db")).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(store.create_secret(&secret("db")).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_status_conflict() {
        let store = InMemoryStore::new();
        let mut resource = StringSecret::new("db", Default::default());
        resource.metadata.namespace = Some("default".to_string());
        store.insert_string_secret(resource);
        store.inject_status_conflicts(1);

        let status = StringSecretStatus::default();
        assert!(matches!(
            store
                .update_string_secret_status("default", "db", None, &status)
                .await,
            Err(StoreError::Conflict(_))
        ));
        assert!(store
            .update_string_secret_status("default", "db", None, &status)
            .await
            .is_ok());
        assert_eq!(store.status_writes(), 1);
    }
}
