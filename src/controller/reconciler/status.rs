//! # Status Management
//!
//! Writes the outcome of a pass to the `StringSecret` status.
//!
//! Status writes produce watch events for the resource, so a write only happens
//! when state, Secret reference, reason or observed generation actually change.

use super::types::{Reconciler, ReconcilerError};
use crate::crd::{ReconcilerState, SecretReference, StringSecret, StringSecretStatus};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tracing::debug;

/// Reference to a stored Secret
pub fn secret_reference(secret: &Secret) -> SecretReference {
    SecretReference {
        api_version: Some("v1".to_string()),
        kind: Some("Secret".to_string()),
        namespace: secret.metadata.namespace.clone(),
        name: secret.metadata.name.clone(),
        uid: secret.metadata.uid.clone(),
        resource_version: secret.metadata.resource_version.clone(),
    }
}

fn unchanged(current: Option<&StringSecretStatus>, desired: &StringSecretStatus) -> bool {
    current.is_some_and(|c| {
        c.state == desired.state
            && c.secret == desired.secret
            && c.reason == desired.reason
            && c.observed_generation == desired.observed_generation
    })
}

async fn write_status(
    reconciler: &Reconciler,
    resource: &StringSecret,
    mut desired: StringSecretStatus,
) -> Result<bool, ReconcilerError> {
    if unchanged(resource.status.as_ref(), &desired) {
        debug!(state = ?desired.state, "Skipping status update - status unchanged");
        return Ok(false);
    }

    desired.last_update = Some(chrono::Utc::now().to_rfc3339());
    let namespace = resource.namespace().unwrap_or_default();
    reconciler
        .store
        .update_string_secret_status(
            &namespace,
            &resource.name_any(),
            resource.metadata.resource_version.as_deref(),
            &desired,
        )
        .await?;
    debug!(state = ?desired.state, "Status updated");
    Ok(true)
}

/// Record a successful pass pointing at `secret`
///
/// Returns whether a status write was issued.
pub async fn mark_completed(
    reconciler: &Reconciler,
    resource: &StringSecret,
    secret: &Secret,
) -> Result<bool, ReconcilerError> {
    let desired = StringSecretStatus {
        state: ReconcilerState::Completed,
        last_update: None,
        secret: Some(secret_reference(secret)),
        reason: None,
        observed_generation: resource.metadata.generation,
    };
    write_status(reconciler, resource, desired).await
}

/// Record a pass rejected because of its spec
///
/// The previous Secret reference is kept.
pub async fn mark_failed(
    reconciler: &Reconciler,
    resource: &StringSecret,
    error: &ReconcilerError,
) -> Result<bool, ReconcilerError> {
    let desired = StringSecretStatus {
        state: ReconcilerState::Failed,
        last_update: None,
        secret: resource.status.as_ref().and_then(|s| s.secret.clone()),
        reason: Some(error.to_string()),
        observed_generation: resource.metadata.generation,
    };
    write_status(reconciler, resource, desired).await
}

/// The spec generation was already applied by an earlier pass
pub fn generation_observed(resource: &StringSecret) -> bool {
    let observed = resource
        .status
        .as_ref()
        .and_then(|s| s.observed_generation);
    observed.is_some() && observed == resource.metadata.generation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::StringSecretSpec;
    use kube::api::ObjectMeta;

    fn completed(rv: &str, generation: i64) -> StringSecretStatus {
        StringSecretStatus {
            state: ReconcilerState::Completed,
            last_update: Some("2024-01-01T00:00:00Z".to_string()),
            secret: Some(SecretReference {
                name: Some("db".to_string()),
                resource_version: Some(rv.to_string()),
                ..Default::default()
            }),
            reason: None,
            observed_generation: Some(generation),
        }
    }

    #[test]
    fn test_unchanged_ignores_last_update() {
        let mut desired = completed("5", 1);
        desired.last_update = None;
        assert!(unchanged(Some(&completed("5", 1)), &desired));
        assert!(!unchanged(Some(&completed("4", 1)), &desired));
        assert!(!unchanged(Some(&completed("5", 2)), &desired));
        assert!(!unchanged(None, &desired));
    }

    #[test]
    fn test_secret_reference() {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("db".to_string()),
                namespace: Some("apps".to_string()),
                uid: Some("u-1".to_string()),
                resource_version: Some("42".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let reference = secret_reference(&secret);
        assert_eq!(reference.kind.as_deref(), Some("Secret"));
        assert_eq!(reference.api_version.as_deref(), Some("v1"));
        assert_eq!(reference.namespace.as_deref(), Some("apps"));
        assert_eq!(reference.uid.as_deref(), Some("u-1"));
        assert_eq!(reference.resource_version.as_deref(), Some("42"));
    }

    #[test]
    fn test_generation_observed() {
        let mut resource = StringSecret::new("db", StringSecretSpec::default());
        resource.metadata.generation = Some(2);
        assert!(!generation_observed(&resource));

        resource.status = Some(completed("1", 1));
        assert!(!generation_observed(&resource));

        resource.status = Some(completed("1", 2));
        assert!(generation_observed(&resource));
    }
}
