//! Inter-arrival time distributions for runtime spawn points.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::parameters::ParameterSet;

/// Samples the gap until the next spawn, in milliseconds.
pub trait InterArrivalDistribution: Send + Sync + std::fmt::Debug {
    /// `spawn_count` is the number of agents spawned so far by the owning spawn point.
    fn sample_ms(&self, spawn_count: u64, current_time_ms: u64) -> f64;
}

/// Constant gap.
#[derive(Debug, Clone)]
pub struct UniformInterArrival {
    pub interval_ms: f64,
}

impl UniformInterArrival {
    pub fn new(interval_ms: f64) -> Self {
        Self { interval_ms }
    }

    /// Gap for `rate_per_sec` agents per second. A non-positive rate never spawns.
    pub fn from_rate(rate_per_sec: f64) -> Self {
        if rate_per_sec <= 0.0 {
            return Self {
                interval_ms: f64::INFINITY,
            };
        }
        Self {
            interval_ms: 1000.0 / rate_per_sec,
        }
    }
}

impl InterArrivalDistribution for UniformInterArrival {
    fn sample_ms(&self, _spawn_count: u64, _current_time_ms: u64) -> f64 {
        self.interval_ms
    }
}

/// Poisson arrivals at `rate_per_sec`.
///
/// Each draw is seeded from `seed` and the spawn count, so a run replays identically.
#[derive(Debug, Clone)]
pub struct ExponentialInterArrival {
    pub rate_per_sec: f64,
    pub seed: u64,
}

impl ExponentialInterArrival {
    pub fn new(rate_per_sec: f64, seed: u64) -> Self {
        Self {
            rate_per_sec: rate_per_sec.max(0.0),
            seed,
        }
    }
}

impl InterArrivalDistribution for ExponentialInterArrival {
    fn sample_ms(&self, spawn_count: u64, _current_time_ms: u64) -> f64 {
        if self.rate_per_sec <= 0.0 {
            return f64::INFINITY;
        }
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(spawn_count));
        let u: f64 = rng.gen();
        let u = u.max(1e-10);
        -u.ln() / self.rate_per_sec * 1000.0
    }
}

/// Build a distribution from spawn point parameters.
///
/// `Distribution` is `Uniform` or `Exponential` (default). `Uniform` reads `IntervalMs`,
/// or `Rate` in agents per second; `Exponential` reads `Rate`.
pub fn from_parameters(
    parameters: &ParameterSet,
    seed: u64,
) -> Result<Box<dyn InterArrivalDistribution>, String> {
    let kind = parameters.get_string("Distribution").unwrap_or("Exponential");
    let rate = parameters.get_double("Rate");
    match kind {
        "Uniform" => match (parameters.get_double("IntervalMs"), rate) {
            (Some(interval_ms), _) if interval_ms > 0.0 => {
                Ok(Box::new(UniformInterArrival::new(interval_ms)))
            }
            (Some(interval_ms), _) => Err(format!("IntervalMs must be positive, got {}", interval_ms)),
            (None, Some(rate)) => Ok(Box::new(UniformInterArrival::from_rate(rate))),
            (None, None) => Err("Uniform distribution needs IntervalMs or Rate".to_string()),
        },
        "Exponential" => rate
            .map(|rate| Box::new(ExponentialInterArrival::new(rate, seed)) as Box<dyn InterArrivalDistribution>)
            .ok_or_else(|| "Exponential distribution needs Rate".to_string()),
        other => Err(format!("unknown distribution '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_from_rate() {
        let dist = UniformInterArrival::from_rate(4.0);
        assert_eq!(dist.sample_ms(0, 0), 250.0);
        assert!(UniformInterArrival::from_rate(0.0).sample_ms(0, 0).is_infinite());
    }

    #[test]
    fn exponential_is_reproducible_per_spawn_count() {
        let a = ExponentialInterArrival::new(2.0, 11);
        let b = ExponentialInterArrival::new(2.0, 11);
        assert_eq!(a.sample_ms(3, 0), b.sample_ms(3, 1000));
        assert!(a.sample_ms(0, 0) > 0.0);
    }

    #[test]
    fn exponential_mean_follows_rate() {
        let dist = ExponentialInterArrival::new(1.0, 5);
        let n = 2000;
        let mean = (0..n).map(|i| dist.sample_ms(i, 0)).sum::<f64>() / n as f64;
        assert!((mean - 1000.0).abs() < 150.0, "mean was {}", mean);
    }

    #[test]
    fn builds_from_parameters() {
        let uniform = ParameterSet::new()
            .with("Distribution", "Uniform")
            .with("IntervalMs", 500_i64);
        assert_eq!(from_parameters(&uniform, 0).unwrap().sample_ms(0, 0), 500.0);

        let exponential = ParameterSet::new().with("Rate", 0.5);
        assert!(from_parameters(&exponential, 0).unwrap().sample_ms(0, 0) > 0.0);

        assert!(from_parameters(&ParameterSet::new(), 0).is_err());
        assert!(from_parameters(&ParameterSet::new().with("Distribution", "Gamma"), 0).is_err());
    }
}
