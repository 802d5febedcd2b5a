//! # SGCTL CLI
//!
//! Command-line interface for the Secret Generator Controller.
//!
//! ## Usage
//!
//! ```bash
//! # Regenerate every auto-generated key of an annotated Secret
//! sgctl regenerate --namespace default --name db-credentials
//!
//! # Regenerate selected keys only
//! sgctl regenerate --namespace default --name db-credentials --keys password,token
//!
//! # List String resources
//! sgctl list
//!
//! # Show status of a String resource
//! sgctl status --namespace default --name db-credentials
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{Api, ListParams, Patch, PatchParams},
    Client,
};
use secret_generator_controller::constants::{
    ANNOTATION_AUTOGENERATE, ANNOTATION_REGENERATE, REGENERATE_ALL,
};
use secret_generator_controller::controller::policy::{ensure_unique, split_key_list};
use secret_generator_controller::crd::StringSecret;
use serde_json::json;

/// Secret Generator Controller CLI
#[derive(Debug, Parser)]
#[command(name = "sgctl")]
#[command(about = "Secret Generator Controller CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace (defaults to "default")
    #[arg(short, long, global = true)]
    namespace: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Request regeneration of an annotated Secret's values
    Regenerate {
        /// Name of the Secret
        #[arg(long)]
        name: String,

        /// Comma-separated keys to regenerate (defaults to all auto-generated keys)
        #[arg(short, long)]
        keys: Option<String>,
    },
    /// List String resources
    List {
        /// List resources across all namespaces
        #[arg(long)]
        all_namespaces: bool,
    },
    /// Show status of a String resource
    Status {
        /// Name of the String resource
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sgctl=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let namespace = cli.namespace.unwrap_or_else(|| "default".to_string());

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;

    match cli.command {
        Commands::Regenerate { name, keys } => {
            regenerate_command(client, &namespace, &name, keys.as_deref()).await
        }
        Commands::List { all_namespaces } => {
            list_command(client, (!all_namespaces).then_some(namespace.as_str())).await
        }
        Commands::Status { name } => status_command(client, &namespace, &name).await,
    }
}

/// Directive value for `--keys`: `yes` when absent, otherwise the normalized key list
fn directive_value(keys: Option<&str>) -> Result<String> {
    let Some(raw) = keys else {
        return Ok(REGENERATE_ALL.to_string());
    };
    let keys = split_key_list(raw);
    if keys.is_empty() {
        bail!("--keys must name at least one key");
    }
    ensure_unique(&keys)?;
    Ok(keys.join(","))
}

/// Set the one-shot regenerate annotation; the controller removes it once applied
async fn regenerate_command(
    client: Client,
    namespace: &str,
    name: &str,
    keys: Option<&str>,
) -> Result<()> {
    let value = directive_value(keys)?;
    let api: Api<Secret> = Api::namespaced(client, namespace);

    let secret = api
        .get(name)
        .await
        .with_context(|| format!("Failed to get Secret '{namespace}/{name}'"))?;
    let opted_in = secret
        .metadata
        .annotations
        .as_ref()
        .is_some_and(|a| a.contains_key(ANNOTATION_AUTOGENERATE));
    if !opted_in {
        bail!("Secret '{namespace}/{name}' has no {ANNOTATION_AUTOGENERATE} annotation");
    }

    let patch = json!({
        "metadata": {
            "annotations": {
                ANNOTATION_REGENERATE: value
            }
        }
    });
    let patch_params = PatchParams {
        field_manager: Some("sgctl".to_string()),
        ..PatchParams::default()
    };

    api.patch(name, &patch_params, &Patch::Merge(patch))
        .await
        .with_context(|| format!("Failed to request regeneration for '{namespace}/{name}'"))?;

    println!("✅ Regeneration requested");
    println!("   Secret: {namespace}/{name}");
    println!("   Keys: {value}");

    Ok(())
}

/// List String resources
async fn list_command(client: Client, namespace: Option<&str>) -> Result<()> {
    let api: Api<StringSecret> = match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };

    let resources = api
        .list(&ListParams::default())
        .await
        .context("Failed to list String resources")?;

    if resources.items.is_empty() {
        println!("No String resources found.");
        return Ok(());
    }

    println!(
        "{:<30} {:<20} {:<12} {:<30}",
        "NAME", "NAMESPACE", "STATE", "FIELDS"
    );
    println!("{}", "-".repeat(92));

    for resource in resources.items {
        let name = resource.metadata.name.as_deref().unwrap_or("<unknown>");
        let ns = resource.metadata.namespace.as_deref().unwrap_or("<unknown>");
        let state = resource
            .status
            .as_ref()
            .map_or_else(|| "-".to_string(), |s| format!("{:?}", s.state));
        let fields = resource.spec.field_names.join(",");

        println!("{name:<30} {ns:<20} {state:<12} {fields:<30}");
    }

    Ok(())
}

/// Show detailed status of a String resource
async fn status_command(client: Client, namespace: &str, name: &str) -> Result<()> {
    let api: Api<StringSecret> = Api::namespaced(client, namespace);

    let resource = api
        .get(name)
        .await
        .with_context(|| format!("Failed to get String '{namespace}/{name}'"))?;

    println!("Status for String '{namespace}/{name}':\n");

    println!("Spec:");
    println!("  Fields: {}", resource.spec.field_names.join(", "));
    println!(
        "  Length: {}",
        if resource.spec.length.is_empty() {
            "<default>"
        } else {
            &resource.spec.length
        }
    );
    println!(
        "  Encoding: {}",
        if resource.spec.encoding.is_empty() {
            "<default>"
        } else {
            &resource.spec.encoding
        }
    );
    println!("  Type: {}", resource.spec.secret_type);
    println!("  Force Recreate: {}", resource.spec.force_recreate);
    if let Some(generation) = resource.metadata.generation {
        println!("  Generation: {generation}");
    }

    let Some(status) = resource.status else {
        println!("\nStatus: No status available (resource may not have been reconciled yet)");
        return Ok(());
    };

    println!("\nStatus:");
    println!("  State: {:?}", status.state);
    if let Some(generation) = status.observed_generation {
        println!("  Observed Generation: {generation}");
    }
    if let Some(time) = &status.last_update {
        println!("  Last Update: {time}");
    }
    if let Some(reason) = &status.reason {
        println!("  Reason: {reason}");
    }
    if let Some(secret) = &status.secret {
        println!(
            "  Secret: {}/{} (resourceVersion {})",
            secret.namespace.as_deref().unwrap_or("-"),
            secret.name.as_deref().unwrap_or("-"),
            secret.resource_version.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_value() {
        assert_eq!(directive_value(None).unwrap(), "yes");
        assert_eq!(directive_value(Some(" a, b ")).unwrap(), "a,b");
        assert!(directive_value(Some(" , ")).is_err());
        assert!(directive_value(Some("a,a")).is_err());
    }
}
