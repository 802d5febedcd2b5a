//! # StringSecret Status
//!
//! Status types recording the outcome of the last reconcile pass.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status of the StringSecret resource
#[derive(Debug, Clone, Deserialize, Serialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StringSecretStatus {
    /// Outcome of the last pass
    #[serde(default)]
    pub state: ReconcilerState,
    /// Time of the last status change (RFC3339)
    #[serde(default)]
    pub last_update: Option<String>,
    /// Reference to the produced Secret
    #[serde(default)]
    pub secret: Option<SecretReference>,
    /// Why the last pass failed
    /// Only set when state is Failed
    #[serde(default)]
    pub reason: Option<String>,
    /// Generation of the spec the status describes
    #[serde(default)]
    pub observed_generation: Option<i64>,
}

/// Reconciliation state reported on the resource
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, JsonSchema, PartialEq, Eq)]
pub enum ReconcilerState {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Reference to the Secret produced for a StringSecret
#[derive(Debug, Clone, Deserialize, Serialize, Default, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub resource_version: Option<String>,
}
