//! # Reconciler
//!
//! Orchestrates resolver, ownership check, regeneration policy and value
//! generator against a [`SecretStore`](crate::controller::store::SecretStore).
//!
//! - `string` - resource-driven pass for `StringSecret`
//! - `annotated` - annotation-driven pass for opted-in Secrets
//! - `fields` - all-or-nothing value generation
//! - `status` - `StringSecret` status writes
//! - `types` - context, errors, outcomes
//!
//! [`reconcile`] and [`reconcile_secret`] adapt the passes to
//! `kube_runtime::Controller`: they open the per-pass span, record metrics and
//! reset backoff on success. Errors go to the error policy in `runtime`.

mod annotated;
mod fields;
mod status;
mod string;
mod types;

pub use annotated::reconcile_annotated_secret;
pub use fields::generate_fields;
pub use status::{mark_completed, mark_failed, secret_reference};
pub use string::reconcile_string_secret;
pub use types::{
    BackoffState, ReconcileOutcome, Reconciler, ReconcilerError, RetryClass,
};

use crate::constants::ANNOTATION_AUTOGENERATE;
use crate::crd::StringSecret;
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Secret;
use kube::{Resource, ResourceExt};
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info_span, Instrument};

/// Backoff key of an object: `kind/namespace/name`
pub fn resource_key<K: Resource<DynamicType = ()>>(obj: &K) -> String {
    format!(
        "{}/{}/{}",
        K::kind(&()),
        obj.namespace().unwrap_or_default(),
        obj.name_any()
    )
}

async fn run_pass<F>(kind: &'static str, key: String, pass: F) -> Result<ReconcileOutcome, ReconcilerError>
where
    F: std::future::Future<Output = Result<ReconcileOutcome, ReconcilerError>>,
{
    let start = Instant::now();
    metrics::increment_reconciliations(kind);
    let result = pass.await;
    metrics::observe_reconciliation_duration(kind, start.elapsed().as_secs_f64());
    if let Ok(outcome) = &result {
        tracing::debug!(resource.key = %key, outcome = ?outcome, "Pass complete");
    }
    result
}

/// Controller entry point for `StringSecret`
///
/// # Errors
///
/// Propagates the [`ReconcilerError`] of the pass to the error policy.
pub async fn reconcile(
    resource: Arc<StringSecret>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    let key = resource_key(resource.as_ref());
    let span = info_span!(
        "reconcile",
        resource.kind = "String",
        resource.namespace = %namespace,
        resource.name = %name
    );

    async move {
        run_pass(
            "String",
            key.clone(),
            reconcile_string_secret(&ctx, &namespace, &name),
        )
        .await?;
        ctx.reset_backoff(&key);
        Ok(Action::await_change())
    }
    .instrument(span)
    .await
}

/// Controller entry point for annotated Secrets
///
/// Secrets without the autogenerate annotation return immediately without
/// touching the store.
///
/// # Errors
///
/// Propagates the [`ReconcilerError`] of the pass to the error policy.
pub async fn reconcile_secret(
    secret: Arc<Secret>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    if !secret.annotations().contains_key(ANNOTATION_AUTOGENERATE) {
        return Ok(Action::await_change());
    }

    let namespace = secret.namespace().unwrap_or_default();
    let name = secret.name_any();
    let key = resource_key(secret.as_ref());
    let span = info_span!(
        "reconcile",
        resource.kind = "Secret",
        resource.namespace = %namespace,
        resource.name = %name
    );

    async move {
        run_pass(
            "Secret",
            key.clone(),
            reconcile_annotated_secret(&ctx, &namespace, &name),
        )
        .await?;
        ctx.reset_backoff(&key);
        Ok(Action::await_change())
    }
    .instrument(span)
    .await
}
