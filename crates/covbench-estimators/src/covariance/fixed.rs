//! Fixed-intensity shrinkage estimators
//!
//! These heuristics shrink the Bessel-corrected sample covariance toward a
//! structured target with configured intensities instead of data-driven
//! ones. Each reports its (first) configured intensity as its shrinkage.

use super::utils::{sample_covariance, trace};
use super::{CovarianceError, Estimate, validate_intensity};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Two-stage diagonal shrinkage (DOASD)
///
/// C1 = (1-δ_diag) S + δ_diag diag(S)
/// Σ  = (1-δ_off) C1 + δ_off diag(C1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoasdEstimator {
    diagonal: f64,
    off_diagonal: f64,
}

impl DoasdEstimator {
    /// Create a DOASD estimator with the given intensities
    ///
    /// # Errors
    /// Returns [`CovarianceError::InvalidShrinkage`] if either intensity is outside [0, 1].
    pub fn new(diagonal: f64, off_diagonal: f64) -> Result<Self, CovarianceError> {
        validate_intensity("diagonal", diagonal)?;
        validate_intensity("off_diagonal", off_diagonal)?;
        Ok(Self {
            diagonal,
            off_diagonal,
        })
    }

    /// Fit to a sample (rows are observations)
    pub fn fit(&self, sample: &Array2<f64>) -> Result<Estimate, CovarianceError> {
        let emp_cov = sample_covariance(sample)?;
        let p = emp_cov.nrows();

        // Both stages keep the diagonal, since diag(C1) = diag(S); only the
        // off-diagonal entries are scaled, once per stage.
        let keep = (1.0 - self.diagonal) * (1.0 - self.off_diagonal);
        let mut covariance = &emp_cov * keep;
        for i in 0..p {
            covariance[[i, i]] = emp_cov[[i, i]];
        }

        Ok(Estimate {
            covariance,
            shrinkage: Some(self.diagonal),
        })
    }
}

/// Dual shrinkage of the diagonal and off-diagonal parts
///
/// With S = D + O split into its diagonal D and off-diagonal O, and T the
/// diagonal of per-variable population variances (divisor n):
///
/// Σ = (1-δ_diag) D + δ_diag T + (1-δ_off) O
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DualShrinkageEstimator {
    diagonal: f64,
    off_diagonal: f64,
}

impl DualShrinkageEstimator {
    /// Create a dual shrinkage estimator with the given intensities
    ///
    /// # Errors
    /// Returns [`CovarianceError::InvalidShrinkage`] if either intensity is outside [0, 1].
    pub fn new(diagonal: f64, off_diagonal: f64) -> Result<Self, CovarianceError> {
        validate_intensity("diagonal", diagonal)?;
        validate_intensity("off_diagonal", off_diagonal)?;
        Ok(Self {
            diagonal,
            off_diagonal,
        })
    }

    /// Fit to a sample (rows are observations)
    pub fn fit(&self, sample: &Array2<f64>) -> Result<Estimate, CovarianceError> {
        let emp_cov = sample_covariance(sample)?;
        let (n_obs, p) = sample.dim();
        // Population variance = Bessel variance * (n-1)/n
        let bessel_to_population = (n_obs as f64 - 1.0) / n_obs as f64;

        let mut covariance = &emp_cov * (1.0 - self.off_diagonal);
        for i in 0..p {
            let variance = emp_cov[[i, i]];
            covariance[[i, i]] = (1.0 - self.diagonal) * variance
                + self.diagonal * variance * bessel_to_population;
        }

        Ok(Estimate {
            covariance,
            shrinkage: Some(self.diagonal),
        })
    }
}

/// Schäfer-Strimmer style shrinkage toward the scaled identity
///
/// Σ = (1-λ) S + λ (tr(S)/p) I
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchaferStrimmerEstimator {
    shrinkage: f64,
}

impl SchaferStrimmerEstimator {
    /// Create a Schäfer-Strimmer estimator with intensity λ
    ///
    /// # Errors
    /// Returns [`CovarianceError::InvalidShrinkage`] if λ is outside [0, 1].
    pub fn new(shrinkage: f64) -> Result<Self, CovarianceError> {
        validate_intensity("schafer_strimmer", shrinkage)?;
        Ok(Self { shrinkage })
    }

    /// Fit to a sample (rows are observations)
    pub fn fit(&self, sample: &Array2<f64>) -> Result<Estimate, CovarianceError> {
        let emp_cov = sample_covariance(sample)?;
        let p = emp_cov.nrows();
        let mu = trace(&emp_cov) / p as f64;

        let target = Array2::<f64>::eye(p) * mu;
        let covariance = &emp_cov * (1.0 - self.shrinkage) + &target * self.shrinkage;

        Ok(Estimate {
            covariance,
            shrinkage: Some(self.shrinkage),
        })
    }
}
