//! # Custom Resource Definitions
//!
//! CRD types for the Secret Generator Controller.
//!
//! The `String` resource declares a set of fields that must exist on a Secret of
//! the same name and be filled with cryptographically random values.

mod status;

pub use status::{ReconcilerState, SecretReference, StringSecretStatus};

use crate::constants::DEFAULT_SECRET_TYPE;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// StringSecret Custom Resource Definition
///
/// The resource kind is `String`; the Rust type is named `StringSecret` so it
/// does not shadow `std::string::String`.
///
/// # Example
///
/// ```yaml
/// apiVersion: secretgenerator.microscaler.io/v1alpha1
/// kind: String
/// metadata:
///   name: database-credentials
///   namespace: default
/// spec:
///   fieldNames:
///     - password
///   length: "32"
///   encoding: base64url
///   data:
///     username: app
/// ```
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    kind = "String",
    root = "StringSecret",
    group = "secretgenerator.microscaler.io",
    version = "v1alpha1",
    namespaced,
    status = "StringSecretStatus",
    shortname = "strsec",
    printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}, {"name":"Secret", "type":"string", "jsonPath":".status.secret.name"}, {"name":"Last Update", "type":"string", "jsonPath":".status.lastUpdate"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StringSecretSpec {
    /// Secret keys to fill with generated values
    /// Names must be unique; a duplicate rejects the whole resource
    #[serde(default)]
    pub field_names: Vec<String>,
    /// Generated length, e.g. "32" (characters) or "32b" (random bytes before encoding)
    /// Empty uses the controller default
    #[serde(default)]
    pub length: String,
    /// One of base64, base64url, base32, hex, raw
    /// Empty uses the controller default
    #[serde(default)]
    pub encoding: String,
    /// Literal values written alongside the generated fields
    /// Keys also listed in fieldNames are ignored here
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    /// Secret type of the produced Secret
    #[serde(default = "default_secret_type", rename = "type")]
    pub secret_type: String,
    /// Regenerate every field on each pass, even when it already has a value
    #[serde(default)]
    pub force_recreate: bool,
}

fn default_secret_type() -> String {
    DEFAULT_SECRET_TYPE.to_string()
}
