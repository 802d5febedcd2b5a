//! Shared fixtures for reconciler scenario tests

#![allow(dead_code, reason = "each test binary uses a different subset")]

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use secret_generator_controller::config::ControllerConfig;
use secret_generator_controller::controller::generator::{
    GenerationError, RandomSource, ValueGenerator,
};
use secret_generator_controller::controller::reconciler::Reconciler;
use secret_generator_controller::controller::store::InMemoryStore;
use secret_generator_controller::crd::{StringSecret, StringSecretSpec};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const NAMESPACE: &str = "default";

/// Random source that always fails
#[derive(Debug)]
pub struct FailingSource;

impl RandomSource for FailingSource {
    fn fill(&self, _buf: &mut [u8]) -> Result<(), GenerationError> {
        Err(GenerationError::new("entropy pool unavailable"))
    }
}

pub fn setup(config: ControllerConfig) -> (Arc<InMemoryStore>, Reconciler) {
    setup_with_generator(config, ValueGenerator::default())
}

pub fn setup_with_generator(
    config: ControllerConfig,
    generator: ValueGenerator,
) -> (Arc<InMemoryStore>, Reconciler) {
    let store = Arc::new(InMemoryStore::new());
    let reconciler = Reconciler::new(store.clone(), generator, config);
    (store, reconciler)
}

pub fn spec(fields: &[&str]) -> StringSecretSpec {
    StringSecretSpec {
        field_names: fields.iter().map(|f| (*f).to_string()).collect(),
        secret_type: "Opaque".to_string(),
        ..StringSecretSpec::default()
    }
}

pub fn string_secret(name: &str, spec: StringSecretSpec) -> StringSecret {
    let mut resource = StringSecret::new(name, spec);
    resource.metadata.namespace = Some(NAMESPACE.to_string());
    resource
}

pub fn data(entries: &[(&str, &str)]) -> BTreeMap<String, ByteString> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
        .collect()
}

pub fn annotations(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

pub fn secret(
    name: &str,
    annotations: BTreeMap<String, String>,
    data: BTreeMap<String, ByteString>,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            annotations: Some(annotations),
            ..ObjectMeta::default()
        },
        data: Some(data),
        ..Secret::default()
    }
}

/// Secret carrying an owner reference of the given kind
pub fn owned_secret(name: &str, owner_kind: &str, data: BTreeMap<String, ByteString>) -> Secret {
    let mut secret = secret(name, BTreeMap::new(), data);
    secret.metadata.owner_references = Some(vec![OwnerReference {
        api_version: "secretgenerator.microscaler.io/v1alpha1".to_string(),
        kind: owner_kind.to_string(),
        name: name.to_string(),
        uid: "owner-uid".to_string(),
        controller: Some(true),
        ..OwnerReference::default()
    }]);
    secret
}

pub fn value(secret: &Secret, key: &str) -> Option<Vec<u8>> {
    secret.data.as_ref()?.get(key).map(|v| v.0.clone())
}

pub fn text(secret: &Secret, key: &str) -> String {
    String::from_utf8(value(secret, key).unwrap_or_default()).expect("value should be UTF-8")
}
