//! # Annotated Secret Reconciliation
//!
//! Annotation-driven pass for existing Secrets that opt in with
//! `secret-generator.microscaler.io/autogenerate: key1,key2`.
//!
//! Generated values, removal of a consumed regenerate directive and the secure
//! marker all land in a single update, so a redelivered event after a
//! successful write finds the directive already gone.

use super::fields::generate_fields;
use super::types::{ReconcileOutcome, Reconciler, ReconcilerError};
use crate::constants::{ANNOTATION_REGENERATE, ANNOTATION_SECURE, SECURE_MARKER_VALUE};
use crate::controller::generator::resolve;
use crate::controller::policy::{annotation_regeneration, GenerationAnnotations};
use crate::observability::metrics;
use tracing::{debug, info};

/// Run one pass for the Secret `namespace/name`
///
/// Secrets without a non-empty autogenerate annotation are left alone.
///
/// # Errors
///
/// Returns a [`ReconcilerError`] for duplicate keys, invalid length/encoding
/// annotations, random source failures and store failures. Nothing is written
/// when a pass fails.
pub async fn reconcile_annotated_secret(
    reconciler: &Reconciler,
    namespace: &str,
    name: &str,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let Some(secret) = reconciler.store.get_secret(namespace, name).await? else {
        info!("Secret no longer exists, nothing to do");
        return Ok(ReconcileOutcome::ResourceGone);
    };

    let annotations = secret.metadata.annotations.clone().unwrap_or_default();
    let Some(parsed) = GenerationAnnotations::parse(&annotations)? else {
        debug!("Secret has no autogenerate keys");
        return Ok(ReconcileOutcome::Unchanged);
    };
    let request = resolve(
        parsed.length.as_deref(),
        parsed.encoding.as_deref(),
        &reconciler.config.defaults,
    )?;

    let current = secret.data.clone().unwrap_or_default();
    let plan = annotation_regeneration(&parsed, &current, reconciler.config.regenerate_insecure);
    debug!(
        reason = ?plan.reason,
        keys = ?plan.decision.keys(),
        consume_directive = plan.consume_directive,
        "Regeneration plan"
    );
    let generated = generate_fields(&reconciler.generator, &plan.decision, &request)?;

    let mut data = current.clone();
    data.extend(generated);

    let mut updated_annotations = annotations.clone();
    if plan.consume_directive {
        updated_annotations.remove(ANNOTATION_REGENERATE);
    }
    if plan.marks_secure() {
        updated_annotations.insert(
            ANNOTATION_SECURE.to_string(),
            SECURE_MARKER_VALUE.to_string(),
        );
    }

    if data == current && updated_annotations == annotations {
        return Ok(ReconcileOutcome::Unchanged);
    }

    let mut target = secret;
    target.data = Some(data);
    target.metadata.annotations = Some(updated_annotations);
    reconciler.store.update_secret(&target).await?;
    metrics::increment_secrets_updated();
    info!(
        regenerated = plan.decision.len(),
        secure = plan.marks_secure(),
        "✅ Updated annotated Secret"
    );

    Ok(ReconcileOutcome::Updated {
        regenerated: plan.decision.len(),
    })
}
