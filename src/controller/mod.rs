//! # Controller
//!
//! - `generator` - length/encoding resolution and random value generation
//! - `policy` - which keys to (re)generate in a pass
//! - `ownership` - owner-reference checks
//! - `store` - object store contract and implementations
//! - `reconciler` - reconcile passes and their kube-runtime adapters
//! - `backoff` - Fibonacci backoff for the error policy
//! - `server` - metrics and probe endpoints

pub mod backoff;
pub mod generator;
pub mod ownership;
pub mod policy;
pub mod reconciler;
pub mod server;
pub mod store;
