//! Randomised selection helpers over an injectable `Rng`.
//!
//! Every random decision in the engine goes through these functions with a
//! caller-owned generator, so tests seed a `StdRng` instead of relying on
//! thread-local randomness.

use std::time::Duration;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

/// Pick one candidate with probability proportional to its weight.
///
/// Returns `None` when the slices are empty, their lengths differ, or every
/// weight is zero.
pub fn weighted_choice<'a, T, R>(candidates: &'a [T], weights: &[u32], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    if candidates.is_empty() || candidates.len() != weights.len() {
        return None;
    }
    let index = WeightedIndex::new(weights).ok()?;
    candidates.get(index.sample(rng))
}

/// Independent coin flip. Probabilities outside `[0, 1]` are clamped.
pub fn chance<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> bool {
    if probability.is_nan() {
        return false;
    }
    rng.random_bool(probability.clamp(0.0, 1.0))
}

/// Uniform duration in `[low, high]`.
pub fn duration_between<R: Rng + ?Sized>(low: Duration, high: Duration, rng: &mut R) -> Duration {
    if high <= low {
        return low;
    }
    rng.random_range(low..=high)
}

/// Scale a duration by a factor drawn uniformly from `[low, high]`.
pub fn jitter<R: Rng + ?Sized>(value: Duration, low: f64, high: f64, rng: &mut R) -> Duration {
    let factor = if high > low { rng.random_range(low..=high) } else { low };
    value.mul_f64(factor.max(0.0))
}

#[cfg(test)]
#[path = "random_test.rs"]
mod tests;
