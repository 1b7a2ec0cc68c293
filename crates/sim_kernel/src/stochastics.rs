//! Seeded randomness for components ([Stochastics]) and for configuration sampling ([Sampler]).

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shared, seeded random source. Clones draw from the same stream.
#[derive(Debug, Clone)]
pub struct Stochastics {
    rng: Arc<Mutex<StdRng>>,
}

impl Stochastics {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Uniform sample in `[min, max)`. Returns `min` for an empty range.
    pub fn uniform(&self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        self.rng.lock().gen_range(min..max)
    }

    /// Exponential sample with the given rate (events per unit).
    pub fn exponential(&self, rate: f64) -> f64 {
        if rate <= 0.0 {
            return f64::INFINITY;
        }
        let u: f64 = self.rng.lock().gen();
        let u = u.max(1e-10);
        -u.ln() / rate
    }

    /// `true` with probability `p` (clamped to `[0, 1]`).
    pub fn roll_for(&self, p: f64) -> bool {
        let p = p.clamp(0.0, 1.0);
        self.rng.lock().gen_bool(p)
    }

    /// Fresh seed for a derived generator.
    pub fn next_seed(&self) -> u64 {
        self.rng.lock().gen()
    }

    /// Index drawn proportionally to `weights`. `None` if no weight is positive
    /// or any weight is not finite.
    pub fn weighted_index(&self, weights: &[f64]) -> Option<usize> {
        if weights.iter().any(|w| !w.is_finite()) {
            return None;
        }
        // Scale by the largest weight so the sum stays finite near f64::MAX.
        let largest = weights.iter().copied().fold(0.0_f64, f64::max);
        if largest <= 0.0 {
            return None;
        }
        let scaled: Vec<f64> = weights.iter().map(|w| (w / largest).max(0.0)).collect();
        let total: f64 = scaled.iter().sum();
        let mut roll = self.rng.lock().gen_range(0.0..total);
        for (index, weight) in scaled.iter().enumerate() {
            if *weight <= 0.0 {
                continue;
            }
            if roll < *weight {
                return Some(index);
            }
            roll -= weight;
        }
        scaled.iter().rposition(|w| *w > 0.0)
    }
}

/// Samples configuration alternatives (spawn point profiles, agent profiles).
#[derive(Debug, Clone)]
pub struct Sampler {
    stochastics: Stochastics,
}

impl Sampler {
    pub fn new(seed: u64) -> Self {
        Self {
            stochastics: Stochastics::new(seed),
        }
    }

    /// Pick one of `items` with probability proportional to `weight`.
    pub fn sample_weighted<'a, T>(&self, items: &'a [T], weight: impl Fn(&T) -> f64) -> Option<&'a T> {
        let weights: Vec<f64> = items.iter().map(weight).collect();
        self.stochastics.weighted_index(&weights).map(|i| &items[i])
    }

    /// Pick one of `items` uniformly.
    pub fn sample_uniform<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        self.sample_weighted(items, |_| 1.0)
    }

    pub fn next_seed(&self) -> u64 {
        self.stochastics.next_seed()
    }

    pub fn stochastics(&self) -> &Stochastics {
        &self.stochastics
    }
}
