//! Random sampling primitives
//!
//! Every stochastic routine in the crate takes an explicit `&mut R: Rng`.
//! There is no process-wide generator: one run owns one generator, so
//! independent runs can go to separate threads and stay reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Poisson means above this are split into independent chunks so that
/// `exp(-lambda)` never underflows in the multiplication method.
const POISSON_CHUNK: f64 = 16.0;

/// Poisson means above this use the normal approximation
/// `round(lambda + sqrt(lambda) * N(0, 1))`; the chunked product would need
/// about `lambda` uniform draws.
const POISSON_NORMAL_ABOVE: f64 = 1.0e4;

/// Build the generator for one simulation run.
///
/// `Some(seed)` is reproducible across runs and platforms; `None` seeds from
/// OS entropy.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Standard normal draw (Box-Muller, cosine branch)
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // u1 in (0, 1] keeps ln() finite
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Bernoulli trial with probability `p`, clamped to [0, 1].
#[inline]
pub fn bernoulli<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    if p <= 0.0 {
        // Still consume a draw so the stream position does not depend on rates
        let _ = rng.gen::<f64>();
        return false;
    }
    rng.gen::<f64>() < p.min(1.0)
}

/// Poisson count with mean `lambda` (multiplication method, chunked).
///
/// Large means switch to a normal approximation. Counts saturate at
/// `u32::MAX`, which is also the result for an infinite mean.
pub fn poisson<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> u32 {
    if !(lambda > 0.0) {
        return 0;
    }
    if lambda == f64::INFINITY {
        return u32::MAX;
    }
    if lambda > POISSON_NORMAL_ABOVE {
        let draw = lambda + lambda.sqrt() * standard_normal(rng);
        // `as` saturates at both ends
        return draw.round().max(0.0) as u32;
    }

    let mut remaining = lambda;
    let mut count = 0u32;
    while remaining > 0.0 {
        let chunk = remaining.min(POISSON_CHUNK);
        remaining -= chunk;

        let limit = (-chunk).exp();
        let mut product = rng.gen::<f64>();
        while product > limit {
            count = count.saturating_add(1);
            product *= rng.gen::<f64>();
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_reproducible() {
        let mut a = seeded_rng(Some(7));
        let mut b = seeded_rng(Some(7));
        let xs: Vec<f64> = (0..16).map(|_| a.gen()).collect();
        let ys: Vec<f64> = (0..16).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_standard_normal_moments() {
        let mut rng = seeded_rng(Some(1));
        let n = 50_000;
        let draws: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

        assert!(draws.iter().all(|x| x.is_finite()));
        assert!(mean.abs() < 0.03, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.05, "var = {var}");
    }

    #[test]
    fn test_bernoulli_edges() {
        let mut rng = seeded_rng(Some(3));
        assert!((0..1000).all(|_| !bernoulli(&mut rng, 0.0)));
        assert!((0..1000).all(|_| bernoulli(&mut rng, 1.0)));
        // Probabilities above one behave as certainty
        assert!((0..1000).all(|_| bernoulli(&mut rng, 3.5)));
    }

    #[test]
    fn test_poisson_mean() {
        let mut rng = seeded_rng(Some(11));
        for &lambda in &[0.05, 2.0, 40.0] {
            let n = 20_000;
            let total: u64 = (0..n).map(|_| poisson(&mut rng, lambda) as u64).sum();
            let mean = total as f64 / n as f64;
            // 6 standard errors of the sample mean
            let tol = 6.0 * (lambda / n as f64).sqrt();
            assert!((mean - lambda).abs() < tol, "lambda {lambda}: mean {mean}");
        }
        assert_eq!(poisson(&mut rng, 0.0), 0);
        assert_eq!(poisson(&mut rng, f64::NAN), 0);
    }

    #[test]
    fn test_poisson_huge_means_return() {
        let mut rng = seeded_rng(Some(12));
        assert_eq!(poisson(&mut rng, f64::INFINITY), u32::MAX);
        assert_eq!(poisson(&mut rng, 1e300), u32::MAX);

        let lambda = 1e8;
        let n = 2_000;
        let total: f64 = (0..n).map(|_| poisson(&mut rng, lambda) as f64).sum();
        let mean = total / n as f64;
        let tol = 6.0 * (lambda / n as f64).sqrt();
        assert!((mean - lambda).abs() < tol, "mean {mean}");
    }
}
