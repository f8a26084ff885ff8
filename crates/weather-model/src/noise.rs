//! Randomness injected into the state model.
//!
//! The model never reaches for a process-global generator. Callers pass a
//! [`NoiseSource`]; production code wraps a real RNG in [`RandomNoise`] and
//! tests substitute scripted sequences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Supplier of the two kinds of draws the model consumes.
pub trait NoiseSource {
    /// A draw from the standard normal distribution N(0, 1).
    fn standard_normal(&mut self) -> f64;

    /// A uniform draw in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// A draw from N(0, `std_dev`²).
    fn gaussian(&mut self, std_dev: f64) -> f64 {
        std_dev * self.standard_normal()
    }
}

/// [`NoiseSource`] backed by any [`rand::Rng`].
#[derive(Debug, Clone)]
pub struct RandomNoise<R> {
    rng: R,
}

impl<R: Rng> RandomNoise<R> {
    /// Wrap an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomNoise<StdRng> {
    /// Generator seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Reproducible generator for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> NoiseSource for RandomNoise<R> {
    fn standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }

    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_draws_stay_in_half_open_interval() {
        let mut noise = RandomNoise::seeded(7);
        for _ in 0..10_000 {
            let u = noise.unit();
            assert!((0.0..1.0).contains(&u), "unit draw {u} out of range");
        }
    }

    #[test]
    fn same_seed_gives_same_draws() {
        let mut a = RandomNoise::seeded(42);
        let mut b = RandomNoise::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.standard_normal().to_bits(), b.standard_normal().to_bits());
        }
    }

    #[test]
    fn gaussian_scales_standard_normal() {
        let mut sample_mean = 0.0_f64;
        let mut sample_sq = 0.0_f64;
        let mut noise = RandomNoise::seeded(3);
        let n = 20_000_u32;
        for _ in 0..n {
            let x = noise.gaussian(2.0);
            sample_mean += x;
            sample_sq += x * x;
        }
        let n = f64::from(n);
        let mean = sample_mean / n;
        let std_dev = (sample_sq / n - mean * mean).sqrt();
        assert!(mean.abs() < 0.1, "mean {mean} too far from 0");
        assert!((std_dev - 2.0).abs() < 0.1, "std dev {std_dev} too far from 2");
    }
}
