/// Stochastic mechanics: bounded jitter for randomized search.
/// Callers own the generator (`bevy_prng::WyRand` in this crate) and seed it
/// explicitly, so every perturbation sequence is reproducible.
use rand_core::RngCore;

/// Uniform [0, 1) from the top 53 bits.
#[inline]
pub fn unit<R: RngCore>(rng: &mut R) -> f64 {
    ((rng.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Uniform real jitter in [-delta, delta).
#[inline]
pub fn jitter<R: RngCore>(rng: &mut R, delta: f64) -> f64 {
    let delta = delta.abs();
    -delta + 2.0 * delta * unit(rng)
}

/// Uniform integer jitter in [-delta, delta] (inclusive).
#[inline]
pub fn int_jitter<R: RngCore>(rng: &mut R, delta: u32) -> i64 {
    let span = 2 * u64::from(delta) + 1;
    (rng.next_u64() % span) as i64 - i64::from(delta)
}
