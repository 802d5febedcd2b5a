//! Kubernetes-backed [`SecretStore`].

use super::{map_kube_error, ObjectKey, SecretStore, StoreError};
use crate::constants::FIELD_MANAGER;
use crate::crd::{StringSecret, StringSecretStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::json;
use std::fmt;

/// Store that reads and writes through the API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PostParams::default()
        }
    }
}

#[async_trait]
impl SecretStore for KubeStore {
    async fn get_string_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StringSecret>, StoreError> {
        let api: Api<StringSecret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .map_err(|e| map_kube_error(e, ObjectKey::new(namespace, name)))
    }

    async fn update_string_secret_status(
        &self,
        namespace: &str,
        name: &str,
        resource_version: Option<&str>,
        status: &StringSecretStatus,
    ) -> Result<(), StoreError> {
        let api: Api<StringSecret> = Api::namespaced(self.client.clone(), namespace);

        // A resourceVersion in a merge patch makes the API server reject stale writes
        let patch = match resource_version {
            Some(rv) => json!({ "metadata": { "resourceVersion": rv }, "status": status }),
            None => json!({ "status": status }),
        };

        api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(patch))
            .await
            .map_err(|e| map_kube_error(e, ObjectKey::new(namespace, name)))?;
        Ok(())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .map_err(|e| map_kube_error(e, ObjectKey::new(namespace, name)))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let key = ObjectKey::of(&secret.metadata);
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &key.namespace);
        api.create(&Self::post_params(), secret)
            .await
            .map_err(|e| map_kube_error(e, key))
    }

    async fn update_secret(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let key = ObjectKey::of(&secret.metadata);
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &key.namespace);
        let name = key.name.clone();
        api.replace(&name, &Self::post_params(), secret)
            .await
            .map_err(|e| map_kube_error(e, key))
    }
}
