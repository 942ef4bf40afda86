//! Zero-mean Gaussian noise over a caller-supplied random source.

use crate::error::{ImputationError, Result};
use rand::Rng;
use rand::distributions::Distribution;

/// Normal distribution N(0, std_dev^2), sampled with the Box-Muller transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianNoise {
    std_dev: f64,
}

impl GaussianNoise {
    /// Create a noise source with the given standard deviation.
    ///
    /// A standard deviation of zero is allowed and always yields `0.0`.
    pub fn new(std_dev: f64) -> Result<Self> {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(ImputationError::InvalidConfig(format!(
                "noise standard deviation must be finite and non-negative, got {}",
                std_dev
            )));
        }
        Ok(Self { std_dev })
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl Distribution<f64> for GaussianNoise {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        // u1 in (0, 1) keeps ln(u1) finite
        let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
        let u2: f64 = rng.r#gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        self.std_dev * z
    }
}
