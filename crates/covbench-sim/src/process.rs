//! Ground-truth covariance generators
//!
//! Each generator simulates a finite realization of a stochastic process and
//! returns its empirical covariance. The result is therefore itself
//! sample-derived; the harness treats it as the true Σ of a trial and
//! regenerates it for every trial.
//!
//! Two families are supported:
//! - AR(1): x_0 ~ N(0, 1), x_i = ρ x_{i-1} + sqrt(1-ρ²) ε_i
//! - FBM: Z·L, with Z i.i.d. standard normal and L the lower Cholesky factor
//!   of the kernel K[i, j] = ½ ((i+1)^{2H} + (j+1)^{2H} - |i-j|^{2H}).
//!   Rows of Z·L have covariance LᵀL.

use covbench_estimators::CovarianceError;
use covbench_estimators::covariance::{cholesky, sample_covariance};
use derive_more::Display;
use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Default AR(1) coefficient
pub const DEFAULT_RHO: f64 = 0.5;

/// Default Hurst exponent
pub const DEFAULT_HURST: f64 = 0.75;

/// Process family tag
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessFamily {
    /// First-order autoregressive process
    #[display("AR(1)")]
    Ar1,
    /// Fractional Brownian motion
    #[display("FBM")]
    Fbm,
}

/// Process family together with its parameter
#[derive(Debug, Display, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ProcessConfig {
    /// AR(1) with coefficient ρ ∈ (-1, 1)
    #[display("AR(1) rho={rho}")]
    Ar1 {
        /// Autoregressive coefficient
        rho: f64,
    },
    /// Fractional Brownian motion with Hurst exponent H ∈ (0, 1)
    #[display("FBM H={hurst}")]
    Fbm {
        /// Hurst exponent
        hurst: f64,
    },
}

impl ProcessConfig {
    /// AR(1) with the given coefficient
    pub const fn ar1(rho: f64) -> Self {
        Self::Ar1 { rho }
    }

    /// FBM with the given Hurst exponent
    pub const fn fbm(hurst: f64) -> Self {
        Self::Fbm { hurst }
    }

    /// The family tag
    pub const fn family(&self) -> ProcessFamily {
        match self {
            Self::Ar1 { .. } => ProcessFamily::Ar1,
            Self::Fbm { .. } => ProcessFamily::Fbm,
        }
    }

    /// The family parameter (ρ or H)
    pub const fn parameter(&self) -> f64 {
        match *self {
            Self::Ar1 { rho } => rho,
            Self::Fbm { hurst } => hurst,
        }
    }

    /// Check the parameter lies in its open interval
    pub fn validate(&self) -> Result<(), CovarianceError> {
        match *self {
            Self::Ar1 { rho } if rho.abs() < 1.0 => Ok(()),
            Self::Ar1 { rho } => Err(CovarianceError::InvalidParameter(format!(
                "AR(1) coefficient rho must lie in (-1, 1), got {rho}"
            ))),
            Self::Fbm { hurst } if hurst > 0.0 && hurst < 1.0 => Ok(()),
            Self::Fbm { hurst } => Err(CovarianceError::InvalidParameter(format!(
                "Hurst exponent must lie in (0, 1), got {hurst}"
            ))),
        }
    }
}

/// Generate a ground-truth covariance matrix
///
/// # Arguments
/// * `process` - Process family and parameter
/// * `dimension` - Number of variables p
/// * `realization_len` - Number of rows in the internal realization
/// * `rng` - Random stream
///
/// # Returns
/// * p x p empirical covariance of the realization
///
/// # Errors
/// * Invalid parameters, `dimension < 1` or `realization_len < 2`
/// * [`CovarianceError::NumericalInstability`] if the FBM kernel cannot be factored
pub fn generate_covariance<R: Rng + ?Sized>(
    process: &ProcessConfig,
    dimension: usize,
    realization_len: usize,
    rng: &mut R,
) -> Result<Array2<f64>, CovarianceError> {
    process.validate()?;
    if dimension < 1 {
        return Err(CovarianceError::EmptyDimension);
    }
    if realization_len < 2 {
        return Err(CovarianceError::InsufficientData {
            required: 2,
            actual: realization_len,
        });
    }

    let realization = match *process {
        ProcessConfig::Ar1 { rho } => ar1_realization(dimension, realization_len, rho, rng),
        ProcessConfig::Fbm { hurst } => {
            let kernel = fbm_kernel(dimension, hurst);
            let factor = cholesky(&kernel)?;
            standard_normal_matrix(realization_len, dimension, rng).dot(&factor)
        }
    };

    sample_covariance(&realization)
}

/// Simulate `n` independent rows of an AR(1) chain of length `p`
pub fn ar1_realization<R: Rng + ?Sized>(p: usize, n: usize, rho: f64, rng: &mut R) -> Array2<f64> {
    let innovation_scale = (1.0 - rho * rho).sqrt();
    let mut realization = Array2::<f64>::zeros((n, p));
    if p == 0 {
        return realization;
    }

    for t in 0..n {
        realization[[t, 0]] = rng.sample(StandardNormal);
    }
    for i in 1..p {
        for t in 0..n {
            let eps: f64 = rng.sample(StandardNormal);
            realization[[t, i]] = rho * realization[[t, i - 1]] + innovation_scale * eps;
        }
    }

    realization
}

/// Fractional Brownian motion covariance kernel on the grid 1..=p
pub fn fbm_kernel(p: usize, hurst: f64) -> Array2<f64> {
    let two_h = 2.0 * hurst;
    Array2::from_shape_fn((p, p), |(i, j)| {
        let lag = i.abs_diff(j) as f64;
        0.5 * ((i as f64 + 1.0).powf(two_h) + (j as f64 + 1.0).powf(two_h) - lag.powf(two_h))
    })
}

/// n x p matrix of i.i.d. standard normal draws
pub fn standard_normal_matrix<R: Rng + ?Sized>(n: usize, p: usize, rng: &mut R) -> Array2<f64> {
    Array2::from_shape_simple_fn((n, p), || rng.sample(StandardNormal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use covbench_estimators::covariance::{is_symmetric, jacobi_eigendecomp};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;

    #[test]
    fn test_ar1_zero_rho_is_near_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let sigma = generate_covariance(&ProcessConfig::ar1(0.0), 5, 20_000, &mut rng).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(sigma[[i, j]], expected, epsilon = 0.05);
            }
        }
    }

    #[test]
    fn test_ar1_correlation_decays_geometrically() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let sigma = generate_covariance(&ProcessConfig::ar1(0.5), 4, 50_000, &mut rng).unwrap();
        assert_abs_diff_eq!(sigma[[0, 1]], 0.5, epsilon = 0.03);
        assert_abs_diff_eq!(sigma[[0, 2]], 0.25, epsilon = 0.03);
        assert_abs_diff_eq!(sigma[[3, 3]], 1.0, epsilon = 0.05);
    }

    #[test]
    fn test_fbm_kernel_values() {
        let kernel = fbm_kernel(3, 0.5);
        // H = 1/2 is standard Brownian motion: K[i, j] = min(i, j) + 1
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(kernel[[i, j]], (i.min(j) + 1) as f64, epsilon = 1e-12);
            }
        }
        assert!(is_symmetric(&fbm_kernel(10, 0.75), 0.0));
    }

    #[rstest]
    #[case(0.25)]
    #[case(0.5)]
    #[case(0.75)]
    #[case(0.9)]
    fn test_fbm_kernel_is_factorable(#[case] hurst: f64) {
        assert!(cholesky(&fbm_kernel(50, hurst)).is_ok());
    }

    #[test]
    fn test_fbm_covariance_is_transposed_factor_product() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let sigma = generate_covariance(&ProcessConfig::fbm(0.75), 3, 40_000, &mut rng).unwrap();
        let factor = cholesky(&fbm_kernel(3, 0.75)).unwrap();
        let expected = factor.t().dot(&factor);

        // LᵀL reverses the growth of the kernel's diagonal
        assert!(expected[[0, 0]] > expected[[2, 2]]);
        for i in 0..3 {
            for j in 0..3 {
                let tolerance = 0.05 * expected[[i, i]].max(expected[[j, j]]);
                assert_abs_diff_eq!(sigma[[i, j]], expected[[i, j]], epsilon = tolerance);
            }
        }
        assert!((sigma[[0, 0]] - 1.0).abs() > 1.0);
    }

    #[rstest]
    #[case(ProcessConfig::ar1(1.0))]
    #[case(ProcessConfig::ar1(-1.5))]
    #[case(ProcessConfig::ar1(f64::NAN))]
    #[case(ProcessConfig::fbm(0.0))]
    #[case(ProcessConfig::fbm(1.0))]
    fn test_invalid_parameters(#[case] process: ProcessConfig) {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = generate_covariance(&process, 5, 10, &mut rng).unwrap_err();
        assert!(matches!(err, CovarianceError::InvalidParameter(_)));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_degenerate_dimensions() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let process = ProcessConfig::ar1(DEFAULT_RHO);
        assert!(matches!(
            generate_covariance(&process, 0, 10, &mut rng),
            Err(CovarianceError::EmptyDimension)
        ));
        assert!(matches!(
            generate_covariance(&process, 5, 1, &mut rng),
            Err(CovarianceError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_output_is_symmetric_and_rank_limited() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let sigma =
            generate_covariance(&ProcessConfig::fbm(DEFAULT_HURST), 12, 5, &mut rng).unwrap();
        assert_eq!(sigma.dim(), (12, 12));
        assert!(is_symmetric(&sigma, 1e-9));

        // Five rows give rank at most four
        let decomp = jacobi_eigendecomp(&sigma, 64, 1e-12).unwrap();
        let largest = decomp.eigenvalues[0];
        let rank = decomp
            .eigenvalues
            .iter()
            .filter(|&&lambda| lambda > 1e-9 * largest)
            .count();
        assert!(rank <= 4, "rank {rank}");
    }

    #[test]
    fn test_same_seed_same_covariance() {
        let process = ProcessConfig::ar1(0.3);
        let a = generate_covariance(&process, 6, 8, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = generate_covariance(&process, 6, 8, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        assert_eq!(ProcessFamily::Ar1.to_string(), "AR(1)");
        assert_eq!(ProcessConfig::fbm(0.5).family(), ProcessFamily::Fbm);
        assert_eq!(ProcessConfig::ar1(0.5).to_string(), "AR(1) rho=0.5");
        assert_eq!(ProcessConfig::fbm(0.75).parameter(), 0.75);
    }
}
