//! # Watch Loop
//!
//! Runs one `kube_runtime::Controller` per watched kind:
//!
//! - `String` resources, also triggered by changes to the Secrets they own
//! - Secrets carrying the autogenerate annotation (unless disabled)
//!
//! Both stop on SIGINT/SIGTERM.

use crate::controller::reconciler::{reconcile, reconcile_secret, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::StringSecret;
use crate::runtime::error_policy::handle_reconciliation_error;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::Client;
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Run the controllers until a shutdown signal arrives
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) {
    let strings: Api<StringSecret> = Api::all(client.clone());
    let secrets: Api<Secret> = Api::all(client);

    let watch_span = tracing::span!(
        tracing::Level::INFO,
        "controller.watch",
        operation = "watch_loop"
    );

    async move {
        info!("Starting String controller...");
        let string_controller = Controller::new(strings, watcher::Config::default())
            .owns(secrets.clone(), watcher::Config::default())
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, reconciler.clone())
            .for_each(|result| {
                match result {
                    Ok((obj, _action)) => debug!(resource.name = %obj.name, "String reconciled"),
                    Err(e) => warn!(error = %e, "String controller event failed"),
                }
                futures::future::ready(())
            });

        if reconciler.config.watch_annotated_secrets {
            info!("Starting annotated Secret controller...");
            let secret_controller = Controller::new(secrets, watcher::Config::default())
                .shutdown_on_signal()
                .run(reconcile_secret, handle_reconciliation_error, reconciler.clone())
                .for_each(|result| {
                    match result {
                        Ok((obj, _action)) => debug!(resource.name = %obj.name, "Secret reconciled"),
                        Err(e) => warn!(error = %e, "Secret controller event failed"),
                    }
                    futures::future::ready(())
                });
            futures::join!(string_controller, secret_controller);
        } else {
            info!("Annotated Secret controller disabled (WATCH_ANNOTATED_SECRETS=false)");
            string_controller.await;
        }
    }
    .instrument(watch_span)
    .await;

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
}
