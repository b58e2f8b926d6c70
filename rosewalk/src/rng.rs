//! Seed handling and RNG construction.
//!
//! Every check runs on a concrete seed so a failure can always be repeated: a configured seed
//! is used as-is, otherwise a fresh one is drawn from entropy and reported.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The seed a run uses: the configured one, or a freshly drawn one.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::thread_rng().r#gen())
}

/// Create a deterministic RNG from a seed
pub fn create_seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
