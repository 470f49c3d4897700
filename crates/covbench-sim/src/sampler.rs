//! Zero-mean multivariate normal sampling

use covbench_estimators::CovarianceError;
use covbench_estimators::covariance::psd_factor;
use ndarray::Array2;
use rand::Rng;

use crate::process::standard_normal_matrix;

/// N(0, Σ) distribution backed by a square-root factor of Σ
///
/// The factor `A` satisfies `A Aᵀ = Σ` and is computed once, so drawing many
/// samples from the same Σ costs one matrix product each.
#[derive(Debug, Clone)]
pub struct MultivariateNormal {
    factor: Array2<f64>,
}

impl MultivariateNormal {
    /// Build the distribution for a symmetric positive semi-definite `covariance`
    ///
    /// Singular matrices are accepted.
    ///
    /// # Errors
    /// * [`CovarianceError::DimensionMismatch`] if `covariance` is not square
    /// * [`CovarianceError::EmptyDimension`] if it has no rows
    /// * [`CovarianceError::NumericalInstability`] if the eigendecomposition fails
    pub fn new(covariance: &Array2<f64>) -> Result<Self, CovarianceError> {
        let (rows, cols) = covariance.dim();
        if rows != cols {
            return Err(CovarianceError::DimensionMismatch {
                expected: rows,
                actual: cols,
            });
        }
        Ok(Self {
            factor: psd_factor(covariance)?,
        })
    }

    /// Number of variables p
    pub fn dimension(&self) -> usize {
        self.factor.nrows()
    }

    /// Draw `n` observations as an n x p matrix (rows are `A z`, z ~ N(0, I))
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<f64> {
        let p = self.dimension();
        standard_normal_matrix(n, p, rng).dot(&self.factor.t())
    }
}
