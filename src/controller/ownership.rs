//! # Ownership Validator
//!
//! A Secret is only ever updated when one of its owner references points at a
//! resource of kind `String`. Hand-written Secrets that merely share a name are
//! left alone.

use crate::crd::StringSecret;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;

/// True iff at least one reference names `kind`
pub fn is_owned_by_kind(owner_references: &[OwnerReference], kind: &str) -> bool {
    owner_references.iter().any(|r| r.kind == kind)
}

/// True iff the Secret is managed by a `StringSecret`
pub fn is_owned(secret: &Secret) -> bool {
    let kind = StringSecret::kind(&());
    secret
        .metadata
        .owner_references
        .as_deref()
        .is_some_and(|refs| is_owned_by_kind(refs, &kind))
}

/// Controller owner reference pointing at `resource`
///
/// `None` when the resource has no uid yet (never persisted).
pub fn owner_reference(resource: &StringSecret) -> Option<OwnerReference> {
    Some(OwnerReference {
        block_owner_deletion: Some(true),
        ..resource.controller_owner_ref(&())?
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::StringSecretSpec;
    use kube::api::ObjectMeta;

    fn reference(kind: &str) -> OwnerReference {
        OwnerReference {
            api_version: "v1".to_string(),
            kind: kind.to_string(),
            name: "owner".to_string(),
            uid: "1234".to_string(),
            ..Default::default()
        }
    }

    fn secret_with(refs: Option<Vec<OwnerReference>>) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some("db".to_string()),
                owner_references: refs,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_owned_by_string_kind() {
        let secret = secret_with(Some(vec![reference("Deployment"), reference("String")]));
        assert!(is_owned(&secret));
    }

    #[test]
    fn test_not_owned_without_references() {
        assert!(!is_owned(&secret_with(None)));
        assert!(!is_owned(&secret_with(Some(vec![]))));
    }

    #[test]
    fn test_not_owned_by_other_kind() {
        let secret = secret_with(Some(vec![reference("SealedSecret")]));
        assert!(!is_owned(&secret));
        // kind comparison is exact
        assert!(!is_owned_by_kind(&[reference("string")], "String"));
    }

    #[test]
    fn test_owner_reference_is_controller() {
        let mut resource = StringSecret::new("db", StringSecretSpec::default());
        resource.metadata.namespace = Some("default".to_string());
        assert!(owner_reference(&resource).is_none());

        resource.metadata.uid = Some("abc-123".to_string());
        let owner = owner_reference(&resource).expect("uid is set");
        assert_eq!(owner.kind, "String");
        assert_eq!(owner.name, "db");
        assert_eq!(owner.uid, "abc-123");
        assert_eq!(owner.api_version, "secretgenerator.microscaler.io/v1alpha1");
        assert_eq!(owner.controller, Some(true));
        assert_eq!(owner.block_owner_deletion, Some(true));
    }
}
