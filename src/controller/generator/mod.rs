//! # Value Generation
//!
//! Resolves a declared length/encoding pair into a generation request and
//! produces random values that satisfy it.

mod request;
mod value;

pub use request::{
    parse_length, resolve, Encoding, GenerationDefaults, ResolveError, ResolvedGenerationRequest,
};
pub use value::{GenerationError, OsRandom, RandomSource, ValueGenerator};
