//! Deterministic pseudo-embedding generator.
//!
//! Every displayed number in the diagram comes from this module. The pipeline is
//! `seed string -> FNV-1a 64 -> SplitMix64 stream -> [-1, 1)`. It uses integer arithmetic up
//! to a single exact `u64 -> f64` conversion, so results are bit-identical across platforms.
//! Changing any constant here changes every rendered value and must bump
//! [`VECTOR_HASH_VERSION`].

use crate::foundation::math::{Fnv1a64, SplitMix64};

/// Version of the seed-to-vector pipeline.
pub const VECTOR_HASH_VERSION: u32 = 1;

/// Variant tag of the token-only outer embedding.
pub const OUTER_VARIANT: &str = "outer";

/// 64-bit hash of a seed string.
pub fn seed_hash(seed: &str) -> u64 {
    let mut h = Fnv1a64::new_default();
    h.write_bytes(seed.as_bytes());
    h.finish()
}

/// Pseudo-random vector of `len` values in `[-1, 1)` for `seed`.
pub fn vector(seed: &str, len: usize) -> Vec<f64> {
    let mut rng = SplitMix64::new(seed_hash(seed));
    (0..len).map(|_| rng.next_f64_01() * 2.0 - 1.0).collect()
}

/// Single reproducible value in `[0, 1)` for `seed`.
pub fn unit_hash(seed: &str) -> f64 {
    SplitMix64::new(seed_hash(seed)).next_f64_01()
}

/// Seed of a stage-local vector: `"<variant>|<stepId>|<token>"`.
pub fn stage_seed(variant: &str, step_id: u64, token: &str) -> String {
    format!("{variant}|{step_id}|{token}")
}

/// Seed of the outer embedding: `"outer|<token>"`. Independent of the step, so a token
/// always starts from the same point.
pub fn outer_seed(token: &str) -> String {
    format!("{OUTER_VARIANT}|{token}")
}

#[cfg(test)]
#[path = "../../tests/unit/vectors/generator.rs"]
mod tests;
