//! # Field Generation
//!
//! Produces every value a pass needs before anything is written, so a random
//! source failure on any key leaves the store untouched.

use super::types::ReconcilerError;
use crate::controller::generator::{ResolvedGenerationRequest, ValueGenerator};
use crate::controller::policy::RegenerationDecision;
use crate::observability::metrics;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Generate a value for every key in `decision`
///
/// # Errors
///
/// Returns [`ReconcilerError::Generation`] naming the first key whose value
/// could not be produced. No values are returned in that case.
pub fn generate_fields(
    generator: &ValueGenerator,
    decision: &RegenerationDecision,
    request: &ResolvedGenerationRequest,
) -> Result<BTreeMap<String, ByteString>, ReconcilerError> {
    let mut staged = BTreeMap::new();
    for key in decision.keys() {
        let value = generator.generate(request).map_err(|source| {
            error!(key = %key, error = %source, "Random source failed, aborting pass");
            metrics::increment_generation_errors();
            ReconcilerError::Generation {
                key: key.clone(),
                source,
            }
        })?;
        debug!(key = %key, bytes = value.len(), encoding = %request.encoding, "Generated value");
        staged.insert(key.clone(), ByteString(value));
    }
    metrics::increment_fields_generated(staged.len());
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::generator::{Encoding, GenerationError, RandomSource};
    use crate::controller::policy::resource_regeneration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Succeeds `remaining` times, then fails
    #[derive(Debug)]
    struct FlakySource {
        remaining: AtomicUsize,
    }

    impl RandomSource for FlakySource {
        fn fill(&self, buf: &mut [u8]) -> Result<(), GenerationError> {
            if self.remaining.load(Ordering::SeqCst) == 0 {
                return Err(GenerationError::new("exhausted"));
            }
            self.remaining.fetch_sub(1, Ordering::SeqCst);
            buf.fill(7);
            Ok(())
        }
    }

    fn request() -> ResolvedGenerationRequest {
        ResolvedGenerationRequest {
            length: 12,
            is_byte_length: false,
            encoding: Encoding::Hex,
        }
    }

    fn decision(keys: &[&str]) -> RegenerationDecision {
        let names: Vec<String> = keys.iter().map(|k| (*k).to_string()).collect();
        resource_regeneration(&names, None, false).unwrap()
    }

    #[test]
    fn test_generates_every_key() {
        let values =
            generate_fields(&ValueGenerator::default(), &decision(&["a", "b"]), &request()).unwrap();
        assert_eq!(values.len(), 2);
        assert!(values.values().all(|v| v.0.len() == 12));
    }

    #[test]
    fn test_failure_on_later_key_returns_nothing() {
        let generator = ValueGenerator::new(Arc::new(FlakySource {
            remaining: AtomicUsize::new(1),
        }));
        let err = generate_fields(&generator, &decision(&["a", "b", "c"]), &request()).unwrap_err();
        match err {
            ReconcilerError::Generation { key, .. } => assert_eq!(key, "b"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
