//! # Error Policy
//!
//! Maps a failed pass to the next attempt.
//!
//! | Retry class    | Action                                              |
//! |----------------|-----------------------------------------------------|
//! | `Delayed`      | requeue after `GENERATION_ERROR_REQUEUE_SECS`       |
//! | `Immediate`    | requeue after `CONFLICT_REQUEUE_SECS`               |
//! | `NonRetryable` | wait for the object to change                       |
//! | `Backoff`      | per-resource Fibonacci backoff, reset on success    |

use crate::constants;
use crate::controller::reconciler::{resource_key, Reconciler, ReconcilerError, RetryClass};
use crate::observability;
use kube::Resource;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Delay before the next attempt, `None` to wait for a change
pub fn requeue_after(error: &ReconcilerError, ctx: &Reconciler, resource_key: &str) -> Option<Duration> {
    match error.retry_class() {
        RetryClass::Delayed => Some(ctx.config.generation_error_requeue),
        RetryClass::Immediate => Some(ctx.config.conflict_requeue),
        RetryClass::NonRetryable => None,
        RetryClass::Backoff => {
            let seconds = match ctx.next_backoff(resource_key) {
                Some((seconds, error_count)) => {
                    let next_trigger_time = chrono::Utc::now()
                        + chrono::Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX));
                    info!(
                        "🔄 Retrying with Fibonacci backoff: {}s (error count: {}, next retry: {})",
                        seconds,
                        error_count,
                        next_trigger_time.to_rfc3339()
                    );
                    seconds
                }
                None => {
                    warn!("Failed to lock backoff_states, using default backoff");
                    constants::DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS
                }
            };
            Some(Duration::from_secs(seconds))
        }
    }
}

/// Error policy shared by every controller
pub fn handle_reconciliation_error<K>(
    obj: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action
where
    K: Resource<DynamicType = ()>,
{
    let key = resource_key(obj.as_ref());
    let kind = K::kind(&());

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.key = %key,
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}: {}", key, error);
    observability::metrics::increment_reconciliation_errors(&kind, error.metric_label());

    let class = error.retry_class();
    match requeue_after(error, &ctx, &key) {
        Some(delay) => {
            observability::metrics::increment_requeues_total(class.as_str());
            Action::requeue(delay)
        }
        None => {
            warn!("Not retrying until {} changes", key);
            Action::await_change()
        }
    }
}
