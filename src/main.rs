//! # Secret Generator Controller
//!
//! A Kubernetes controller that fills Secret fields with cryptographically
//! random values.
//!
//! ## Overview
//!
//! 1. **`String` resources** - declare `fieldNames`; the controller creates a
//!    Secret of the same name owned by the resource and fills missing fields
//! 2. **Annotated Secrets** - existing Secrets list keys in the
//!    `secret-generator.microscaler.io/autogenerate` annotation and receive
//!    generated values, with one-shot regeneration through the `regenerate`
//!    annotation
//!
//! ## Features
//!
//! - **Length modes**: character count (`"32"`) or random byte count (`"32b"`)
//! - **Encodings**: base64, base64url, base32, hex, raw
//! - **Ownership safety**: Secrets not owned by a `String` are never touched
//! - **Prometheus metrics** and health probes on port 5000

use anyhow::Result;
use secret_generator_controller::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init_result = initialize().await?;

    run_watch_loop(
        init_result.client,
        init_result.reconciler,
        init_result.server_state,
    )
    .await;

    Ok(())
}
