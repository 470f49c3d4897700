//! Covariance estimation
//!
//! Provides the closed family of covariance estimators compared by the
//! benchmark: the plain sample covariance, the data-driven shrinkage
//! estimators (Ledoit-Wolf, Rao-Blackwell Ledoit-Wolf, OAS), the
//! fixed-intensity heuristics (DOASD, dual shrinkage, Schäfer-Strimmer) and
//! the dimension-only oracle.
//!
//! Every estimator is a variant of [`CovarianceEstimator`] and is fitted
//! through the single [`CovarianceEstimator::fit`] operation.

pub mod fixed;
pub mod ledoit_wolf;
pub mod oas;
pub mod oracle;
pub mod utils;

pub use fixed::{DoasdEstimator, DualShrinkageEstimator, SchaferStrimmerEstimator};
pub use ledoit_wolf::{ledoit_wolf_shrinkage, rao_blackwell_shrinkage};
pub use oas::oas_shrinkage;
pub use oracle::oracle_shrinkage;
pub use utils::{
    EigenDecomposition, cholesky, is_symmetric, jacobi_eigendecomp, ml_covariance, psd_factor,
    sample_covariance, squared_frobenius_distance, trace,
};

use derive_more::Display;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during covariance estimation
#[derive(Debug, Error)]
pub enum CovarianceError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// The sample or matrix has no variables
    #[error("Empty dimension: at least one variable is required")]
    EmptyDimension,

    /// Shrinkage intensity outside [0, 1]
    #[error("Invalid shrinkage intensity for {name}: {value} (must be between 0 and 1)")]
    InvalidShrinkage {
        /// Name of the intensity parameter
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A factorization broke down on a matrix that is not positive definite
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

impl CovarianceError {
    /// Whether the error was caused by invalid caller input rather than by a
    /// numerical breakdown.
    pub const fn is_invalid_input(&self) -> bool {
        !matches!(self, Self::NumericalInstability(_))
    }
}

/// Result of fitting an estimator
#[derive(Debug, Clone)]
pub struct Estimate {
    /// Estimated covariance matrix (p x p)
    pub covariance: Array2<f64>,
    /// Shrinkage intensity in [0, 1], absent for the sample estimator
    pub shrinkage: Option<f64>,
}

/// Identifies an estimator in result tables
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EstimatorKind {
    /// Bessel-corrected sample covariance
    #[display("Sample")]
    Sample,
    /// Ledoit-Wolf shrinkage
    #[display("LW")]
    LedoitWolf,
    /// Rao-Blackwellized Ledoit-Wolf shrinkage
    #[display("RBLW")]
    RaoBlackwellLedoitWolf,
    /// Oracle approximating shrinkage
    #[display("OAS")]
    OracleApproximatingShrinkage,
    /// Two-stage diagonal/off-diagonal shrinkage
    #[display("DOASD")]
    Doasd,
    /// Separate diagonal and off-diagonal shrinkage
    #[display("DualShrinkage")]
    DualShrinkage,
    /// Schäfer-Strimmer shrinkage toward the scaled identity
    #[display("Schafer-Strimmer")]
    SchaferStrimmer,
    /// Dimension-only oracle shrinkage
    #[display("Oracle")]
    Oracle,
}

impl EstimatorKind {
    /// All estimators in display order
    pub const ALL: [Self; 8] = [
        Self::Sample,
        Self::LedoitWolf,
        Self::RaoBlackwellLedoitWolf,
        Self::OracleApproximatingShrinkage,
        Self::Doasd,
        Self::DualShrinkage,
        Self::SchaferStrimmer,
        Self::Oracle,
    ];

    /// Short display name used in tables and exports
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sample => "Sample",
            Self::LedoitWolf => "LW",
            Self::RaoBlackwellLedoitWolf => "RBLW",
            Self::OracleApproximatingShrinkage => "OAS",
            Self::Doasd => "DOASD",
            Self::DualShrinkage => "DualShrinkage",
            Self::SchaferStrimmer => "Schafer-Strimmer",
            Self::Oracle => "Oracle",
        }
    }

    /// Whether the estimator reports a shrinkage intensity
    pub const fn reports_shrinkage(&self) -> bool {
        !matches!(self, Self::Sample)
    }
}

/// Fixed shrinkage intensities for the heuristic estimators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShrinkageConfig {
    /// Diagonal intensity δ_diag for DOASD and dual shrinkage (default: 0.4)
    pub diagonal: f64,

    /// Off-diagonal intensity δ_off for DOASD and dual shrinkage (default: 0.3)
    pub off_diagonal: f64,

    /// Schäfer-Strimmer intensity λ (default: 0.4)
    pub schafer_strimmer: f64,
}

impl Default for ShrinkageConfig {
    fn default() -> Self {
        Self {
            diagonal: 0.4,
            off_diagonal: 0.3,
            schafer_strimmer: 0.4,
        }
    }
}

impl ShrinkageConfig {
    /// Check every intensity lies in [0, 1]
    pub fn validate(&self) -> Result<(), CovarianceError> {
        validate_intensity("diagonal", self.diagonal)?;
        validate_intensity("off_diagonal", self.off_diagonal)?;
        validate_intensity("schafer_strimmer", self.schafer_strimmer)
    }
}

/// Reject intensities outside [0, 1] (NaN included)
pub(crate) fn validate_intensity(name: &'static str, value: f64) -> Result<(), CovarianceError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CovarianceError::InvalidShrinkage { name, value })
    }
}

/// Covariance estimator
///
/// The variant set is closed; [`EstimatorKind`] names each variant.
#[derive(Debug, Clone, PartialEq)]
pub enum CovarianceEstimator {
    /// Bessel-corrected sample covariance
    Sample,
    /// Ledoit-Wolf (2004) shrinkage toward the scaled identity
    LedoitWolf,
    /// Rao-Blackwell Ledoit-Wolf (Chen et al. 2010) shrinkage toward the scaled identity
    RaoBlackwellLedoitWolf,
    /// Oracle approximating shrinkage (Chen et al. 2010) toward the scaled identity
    OracleApproximatingShrinkage,
    /// Two-stage shrinkage toward the diagonal
    Doasd(DoasdEstimator),
    /// Diagonal toward population variances, off-diagonal toward zero
    DualShrinkage(DualShrinkageEstimator),
    /// Fixed-intensity shrinkage toward the scaled identity
    SchaferStrimmer(SchaferStrimmerEstimator),
    /// Shrinkage toward the scaled identity with intensity (p-1)/p
    Oracle,
}

impl CovarianceEstimator {
    /// Build the full estimator set, in [`EstimatorKind::ALL`] order
    pub fn all(config: &ShrinkageConfig) -> Result<Vec<Self>, CovarianceError> {
        config.validate()?;
        Ok(vec![
            Self::Sample,
            Self::LedoitWolf,
            Self::RaoBlackwellLedoitWolf,
            Self::OracleApproximatingShrinkage,
            Self::Doasd(DoasdEstimator::new(config.diagonal, config.off_diagonal)?),
            Self::DualShrinkage(DualShrinkageEstimator::new(
                config.diagonal,
                config.off_diagonal,
            )?),
            Self::SchaferStrimmer(SchaferStrimmerEstimator::new(config.schafer_strimmer)?),
            Self::Oracle,
        ])
    }

    /// The table key of this estimator
    pub const fn kind(&self) -> EstimatorKind {
        match self {
            Self::Sample => EstimatorKind::Sample,
            Self::LedoitWolf => EstimatorKind::LedoitWolf,
            Self::RaoBlackwellLedoitWolf => EstimatorKind::RaoBlackwellLedoitWolf,
            Self::OracleApproximatingShrinkage => EstimatorKind::OracleApproximatingShrinkage,
            Self::Doasd(_) => EstimatorKind::Doasd,
            Self::DualShrinkage(_) => EstimatorKind::DualShrinkage,
            Self::SchaferStrimmer(_) => EstimatorKind::SchaferStrimmer,
            Self::Oracle => EstimatorKind::Oracle,
        }
    }

    /// Fit the estimator to a sample
    ///
    /// # Arguments
    /// * `sample` - Matrix where each row is an observation and each column is a variable
    ///
    /// # Returns
    /// * Estimated covariance matrix (p x p) and shrinkage intensity
    ///
    /// # Errors
    /// Fails when the sample has fewer than two rows or no columns.
    pub fn fit(&self, sample: &Array2<f64>) -> Result<Estimate, CovarianceError> {
        match self {
            Self::Sample => Ok(Estimate {
                covariance: sample_covariance(sample)?,
                shrinkage: None,
            }),
            Self::LedoitWolf => ledoit_wolf::fit_ledoit_wolf(sample),
            Self::RaoBlackwellLedoitWolf => ledoit_wolf::fit_rao_blackwell(sample),
            Self::OracleApproximatingShrinkage => oas::fit_oas(sample),
            Self::Doasd(estimator) => estimator.fit(sample),
            Self::DualShrinkage(estimator) => estimator.fit(sample),
            Self::SchaferStrimmer(estimator) => estimator.fit(sample),
            Self::Oracle => oracle::fit_oracle(sample),
        }
    }
}

/// Shrink a covariance matrix toward `μ·I` where `μ = trace(cov) / p`
///
/// Σ = (1-ρ) S + ρ μ I
pub fn shrink_toward_scaled_identity(cov: &Array2<f64>, intensity: f64) -> Array2<f64> {
    let p = cov.nrows();
    let mu = trace(cov) / p as f64;
    let mut shrunk = cov * (1.0 - intensity);
    for i in 0..p {
        shrunk[[i, i]] += intensity * mu;
    }
    shrunk
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn wavy_sample(n: usize, p: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, p), |(t, i)| {
            ((t * p + i) as f64 * 0.731).sin() + 0.1 * (i as f64 + 1.0) * ((t as f64) * 0.37).cos()
        })
    }

    #[test]
    fn test_shrinkage_config_default() {
        let config = ShrinkageConfig::default();
        assert_eq!(config.diagonal, 0.4);
        assert_eq!(config.off_diagonal, 0.3);
        assert_eq!(config.schafer_strimmer, 0.4);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(-0.1, 0.3, 0.4)]
    #[case(0.4, 1.5, 0.4)]
    #[case(0.4, 0.3, f64::NAN)]
    fn test_shrinkage_config_rejects_out_of_range(
        #[case] diagonal: f64,
        #[case] off_diagonal: f64,
        #[case] schafer_strimmer: f64,
    ) {
        let config = ShrinkageConfig {
            diagonal,
            off_diagonal,
            schafer_strimmer,
        };
        let err = CovarianceEstimator::all(&config).unwrap_err();
        assert!(matches!(err, CovarianceError::InvalidShrinkage { .. }));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_all_matches_kind_order() {
        let estimators = CovarianceEstimator::all(&ShrinkageConfig::default()).unwrap();
        let kinds: Vec<_> = estimators.iter().map(CovarianceEstimator::kind).collect();
        assert_eq!(kinds, EstimatorKind::ALL.to_vec());
    }

    #[test]
    fn test_kind_display_matches_name() {
        for kind in EstimatorKind::ALL {
            assert_eq!(kind.to_string(), kind.name());
        }
        assert!(!EstimatorKind::Sample.reports_shrinkage());
        assert!(EstimatorKind::Oracle.reports_shrinkage());
    }

    #[test]
    fn test_every_estimator_is_symmetric() {
        let sample = wavy_sample(12, 6);
        for estimator in CovarianceEstimator::all(&ShrinkageConfig::default()).unwrap() {
            let estimate = estimator.fit(&sample).unwrap();
            assert_eq!(estimate.covariance.dim(), (6, 6));
            assert!(
                is_symmetric(&estimate.covariance, 1e-12),
                "{} returned an asymmetric matrix",
                estimator.kind()
            );
        }
    }

    #[test]
    fn test_shrinkage_reported_in_unit_interval() {
        let sample = wavy_sample(5, 20);
        for estimator in CovarianceEstimator::all(&ShrinkageConfig::default()).unwrap() {
            let estimate = estimator.fit(&sample).unwrap();
            match estimate.shrinkage {
                None => assert_eq!(estimator.kind(), EstimatorKind::Sample),
                Some(rho) => assert!((0.0..=1.0).contains(&rho), "{}: {rho}", estimator.kind()),
            }
        }
    }

    #[rstest]
    #[case(1, 3)]
    #[case(0, 3)]
    fn test_every_estimator_rejects_single_row(#[case] n: usize, #[case] p: usize) {
        let sample = Array2::<f64>::zeros((n, p));
        for estimator in CovarianceEstimator::all(&ShrinkageConfig::default()).unwrap() {
            let err = estimator.fit(&sample).unwrap_err();
            assert!(matches!(err, CovarianceError::InsufficientData { .. }));
        }
    }

    #[test]
    fn test_every_estimator_rejects_empty_dimension() {
        let sample = Array2::<f64>::zeros((10, 0));
        for estimator in CovarianceEstimator::all(&ShrinkageConfig::default()).unwrap() {
            assert!(matches!(
                estimator.fit(&sample),
                Err(CovarianceError::EmptyDimension)
            ));
        }
    }

    #[test]
    fn test_shrink_toward_scaled_identity() {
        let cov =
            Array2::from_shape_vec((3, 3), vec![4.0, 1.0, 0.5, 1.0, 9.0, 1.5, 0.5, 1.5, 16.0])
                .unwrap();
        let shrunk = shrink_toward_scaled_identity(&cov, 1.0);
        let mu = 29.0 / 3.0;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { mu } else { 0.0 };
                assert_relative_eq!(shrunk[[i, j]], expected, epsilon = 1e-12);
            }
        }

        let untouched = shrink_toward_scaled_identity(&cov, 0.0);
        assert_eq!(untouched, cov);

        // Trace is preserved for any intensity
        let half = shrink_toward_scaled_identity(&cov, 0.5);
        assert_relative_eq!(trace(&half), 29.0, epsilon = 1e-12);
    }
}
