//! Secret Generator Controller Library
//!
//! Core functionality of the Secret Generator Controller: the `String` CRD,
//! value generation, regeneration policy, ownership checks and the reconcile
//! passes, plus the runtime that wires them to `kube_runtime`.
//!
//! The reconcile passes only talk to the cluster through
//! [`controller::store::SecretStore`], so they run unchanged against
//! [`controller::store::InMemoryStore`] in tests.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod runtime;
