//! Reproducible start vectors for the Krylov iteration.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed of the default start vector. Fixed so repeated runs on the same input agree.
pub const DEFAULT_SEED: u64 = 0x5eed_cafe;

/// A length-`n` vector with entries uniform in [-0.5, 0.5), drawn from a ChaCha8 stream
/// seeded with `seed`.
pub fn start_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-0.5..0.5)).collect()
}
