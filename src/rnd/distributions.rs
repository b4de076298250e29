//! Random distributions used by the topology and attribute generators.
//!
//! All sampling goes through an explicitly passed [`Rng`]; nothing in this
//! module touches a process-wide generator.

use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Exp1, LogNormal};

use crate::error::GeneratorError;
use crate::utils::amount::float_round;

/// Generator type owned by every instantiation step
pub type GeneratorRng = ChaCha8Rng;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Derive an independent seed from a run seed and a path of names.
///
/// The same `(seed, parts)` always yields the same value, so every subnetwork
/// and nation gets a stream of its own regardless of generation order.
pub fn derive_seed(seed: u64, parts: &[&str]) -> u64 {
    let mut hash = FNV_OFFSET;
    for part in parts {
        for byte in part.bytes().chain(std::iter::once(0xff)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    // splitmix64 finaliser over the combined value
    let mut z = seed ^ hash;
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Seeded generator for one generation step
pub fn seeded_rng(seed: u64, parts: &[&str]) -> GeneratorRng {
    ChaCha8Rng::seed_from_u64(derive_seed(seed, parts))
}

/// Partition `items` into `k` consecutive groups whose sizes follow a
/// lognormal law.
///
/// Group sizes are proportional to `k` lognormal samples sorted in descending
/// order, rounded and then corrected one unit at a time until they add up to
/// `items.len()`. Every group is non-empty whenever `k <= items.len()`.
pub fn lognormal_set_partition<T: Clone, R: Rng + ?Sized>(
    items: &[T],
    k: usize,
    mean: f64,
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<Vec<T>>, GeneratorError> {
    if k == 0 {
        return Ok(Vec::new());
    }
    let lognormal = LogNormal::new(mean, sigma).map_err(|e| {
        GeneratorError::InvalidDistribution(format!(
            "lognormal(mean={}, sigma={}): {}",
            mean, sigma, e
        ))
    })?;

    let mut samples: Vec<f64> = (0..k).map(|_| lognormal.sample(rng)).collect();
    samples.sort_by(|a, b| b.total_cmp(a));
    let samples_sum: f64 = samples.iter().sum();

    let n = items.len();
    let floor = if k <= n { 1 } else { 0 };
    let mut sizes: Vec<usize> = samples
        .iter()
        .map(|x| {
            let share = (x * n as f64 / samples_sum).round_ties_even();
            if share.is_finite() && share > 0.0 {
                (share as usize).max(floor)
            } else {
                floor
            }
        })
        .collect();

    let mut total: usize = sizes.iter().sum();
    while total != n {
        for size in sizes.iter_mut() {
            if total > n && *size > floor {
                *size -= 1;
                total -= 1;
            } else if total < n {
                *size += 1;
                total += 1;
            }
            if total == n {
                break;
            }
        }
    }
    debug!("Lognormal partition of {} items into {} groups: {:?}", n, k, sizes);

    let mut rest = items;
    let groups = sizes
        .into_iter()
        .map(|size| {
            let (group, tail) = rest.split_at(size.min(rest.len()));
            rest = tail;
            group.to_vec()
        })
        .collect();
    Ok(groups)
}

/// Solve the Beta shape parameters `(alpha, beta)` matching the given
/// moments on `[min, max]`.
pub fn beta_shape_parameters(min: f64, max: f64, mean: f64, dev: f64) -> Result<(f64, f64), GeneratorError> {
    let infeasible = || GeneratorError::InfeasibleBeta { min, max, mean, dev };
    let scale = max - min;
    if !(scale > 0.0) {
        return Err(infeasible());
    }
    let unscaled_mean = (mean - min) / scale;
    let unscaled_var = (dev / scale).powi(2);
    let t = unscaled_mean / (1.0 - unscaled_mean);
    let beta = (t / unscaled_var - t * t - 2.0 * t - 1.0) / (t * t * t + 3.0 * t * t + 3.0 * t + 1.0);
    let alpha = beta * t;
    if !(alpha.is_finite() && beta.is_finite() && alpha > 0.0 && beta > 0.0) {
        return Err(infeasible());
    }
    Ok((alpha, beta))
}

/// Beta law moved to `[min, max]`
#[derive(Debug, Clone)]
pub struct ScaledBeta {
    beta: Beta<f64>,
    min: f64,
    scale: f64,
}

impl ScaledBeta {
    pub fn new(min: f64, max: f64, mean: f64, dev: f64) -> Result<Self, GeneratorError> {
        let (alpha, beta) = beta_shape_parameters(min, max, mean, dev)?;
        let beta = Beta::new(alpha, beta).map_err(|_| GeneratorError::InfeasibleBeta { min, max, mean, dev })?;
        Ok(Self {
            beta,
            min,
            scale: max - min,
        })
    }
}

impl Distribution<f64> for ScaledBeta {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.min + self.scale * self.beta.sample(rng)
    }
}

/// Exponential sample with the given mean, floored at `low_cap` and rounded
/// to `digits` decimal places.
pub fn capped_exponential<R: Rng + ?Sized>(rng: &mut R, mean: f64, digits: u32, low_cap: f64) -> f64 {
    let sample: f64 = Exp1.sample(rng);
    float_round((sample * mean).max(low_cap), digits)
}

/// Uniform sample between `min` and `max`, truncated to cents
pub fn cent_rounded_uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    let cents = if max > min {
        rng.gen_range(100.0 * min..100.0 * max)
    } else {
        100.0 * min
    };
    cents.trunc() / 100.0
}

/// Sampler over the indices of `probabilities`.
///
/// Outcomes of weight zero are never drawn.
pub fn discrete_distribution(probabilities: &[f64]) -> Result<WeightedIndex<f64>, GeneratorError> {
    WeightedIndex::new(probabilities)
        .map_err(|e| GeneratorError::InvalidDiscreteDistribution(format!("{:?}: {}", probabilities, e)))
}
