//! # StringSecret Reconciliation
//!
//! Resource-driven pass: makes the Secret named after a `StringSecret` hold
//! every declared field.
//!
//! | Secret state       | Action                                          |
//! |--------------------|-------------------------------------------------|
//! | absent             | generate all fields, create with owner reference |
//! | present, owned     | generate missing fields (all with forceRecreate) |
//! | present, not owned | leave untouched                                  |
//!
//! Literal `spec.data` entries are written on both paths for keys that are not
//! also declared in `fieldNames`.

use super::fields::generate_fields;
use super::status::{generation_observed, mark_completed, mark_failed};
use super::types::{ReconcileOutcome, Reconciler, ReconcilerError, RetryClass};
use crate::constants::DEFAULT_SECRET_TYPE;
use crate::controller::generator::resolve;
use crate::controller::ownership::{is_owned, owner_reference};
use crate::controller::policy::{ensure_unique, resource_regeneration};
use crate::crd::StringSecret;
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Run one pass for the `StringSecret` `namespace/name`
///
/// Non-retryable spec errors are also recorded on the resource status as
/// `Failed` before being returned.
///
/// # Errors
///
/// Returns a [`ReconcilerError`] for invalid specs, random source failures and
/// store failures. Nothing is written to the Secret when a pass fails.
pub async fn reconcile_string_secret(
    reconciler: &Reconciler,
    namespace: &str,
    name: &str,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let Some(resource) = reconciler.store.get_string_secret(namespace, name).await? else {
        info!("StringSecret no longer exists, nothing to do");
        return Ok(ReconcileOutcome::ResourceGone);
    };

    match apply(reconciler, &resource).await {
        Err(e) if e.retry_class() == RetryClass::NonRetryable => {
            warn!(error = %e, "Rejecting StringSecret spec");
            if let Err(status_err) = mark_failed(reconciler, &resource, &e).await {
                warn!(error = %status_err, "Failed to record Failed status");
            }
            Err(e)
        }
        result => result,
    }
}

async fn apply(
    reconciler: &Reconciler,
    resource: &StringSecret,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let spec = &resource.spec;
    ensure_unique(&spec.field_names)?;
    let request = resolve(
        Some(&spec.length),
        Some(&spec.encoding),
        &reconciler.config.defaults,
    )?;

    let namespace = resource.metadata.namespace.clone().unwrap_or_default();
    let name = resource.metadata.name.clone().unwrap_or_default();

    let Some(existing) = reconciler.store.get_secret(&namespace, &name).await? else {
        let decision = resource_regeneration(&spec.field_names, None, spec.force_recreate)?;
        let generated = generate_fields(&reconciler.generator, &decision, &request)?;
        let owner = owner_reference(resource).ok_or_else(|| {
            ReconcilerError::ReferenceResolution(format!("StringSecret {namespace}/{name} has no uid"))
        })?;

        let mut data = literal_data(resource);
        data.extend(generated);
        let secret_type = if spec.secret_type.is_empty() {
            DEFAULT_SECRET_TYPE.to_string()
        } else {
            spec.secret_type.clone()
        };
        let desired = Secret {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(namespace.clone()),
                owner_references: Some(vec![owner]),
                ..ObjectMeta::default()
            },
            data: Some(data),
            type_: Some(secret_type),
            ..Secret::default()
        };

        let created = reconciler.store.create_secret(&desired).await?;
        metrics::increment_secrets_created();
        info!(fields = decision.len(), "✅ Created Secret");

        mark_completed(reconciler, resource, &created).await?;
        return Ok(ReconcileOutcome::Created {
            fields: decision.len(),
        });
    };

    if !is_owned(&existing) {
        warn!("Secret exists but is not managed by a String resource, skipping");
        metrics::increment_secrets_skipped();
        return Ok(ReconcileOutcome::SkippedNotOwned);
    }

    // forceRecreate applies once per spec generation; later passes see the
    // generation in status and only fill gaps
    let force = spec.force_recreate && !generation_observed(resource);
    let current = existing.data.clone().unwrap_or_default();
    let decision = resource_regeneration(&spec.field_names, Some(&current), force)?;
    let generated = generate_fields(&reconciler.generator, &decision, &request)?;

    let mut merged = current.clone();
    merged.extend(literal_data(resource));
    merged.extend(generated);

    let (secret, outcome) = if merged == current {
        (existing, ReconcileOutcome::Unchanged)
    } else {
        let mut target = existing;
        target.data = Some(merged);
        let updated = reconciler.store.update_secret(&target).await?;
        metrics::increment_secrets_updated();
        info!(regenerated = decision.len(), "✅ Updated Secret");
        (
            updated,
            ReconcileOutcome::Updated {
                regenerated: decision.len(),
            },
        )
    };

    mark_completed(reconciler, resource, &secret).await?;
    Ok(outcome)
}

fn literal_data(resource: &StringSecret) -> BTreeMap<String, ByteString> {
    resource
        .spec
        .data
        .iter()
        .filter(|(key, _)| !resource.spec.field_names.contains(key))
        .map(|(key, value)| (key.clone(), ByteString(value.as_bytes().to_vec())))
        .collect()
}
