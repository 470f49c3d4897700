//! Oracle shrinkage toward the scaled identity
//!
//! Shrinks the Bessel-corrected sample covariance S toward F = (tr(S)/p) I with
//! an intensity that depends on the dimension alone:
//!
//! ρ = (p - 1) / p

use super::utils::sample_covariance;
use super::{CovarianceError, Estimate, shrink_toward_scaled_identity};
use ndarray::Array2;

/// Oracle shrinkage intensity for `p` variables
pub fn oracle_shrinkage(p: usize) -> f64 {
    if p == 0 {
        return 0.0;
    }
    (p as f64 - 1.0) / p as f64
}

pub(crate) fn fit_oracle(sample: &Array2<f64>) -> Result<Estimate, CovarianceError> {
    let sample_cov = sample_covariance(sample)?;
    let rho = oracle_shrinkage(sample_cov.nrows());

    Ok(Estimate {
        covariance: shrink_toward_scaled_identity(&sample_cov, rho),
        shrinkage: Some(rho),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::utils::trace;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1, 0.0)]
    #[case(2, 0.5)]
    #[case(4, 0.75)]
    #[case(100, 0.99)]
    fn test_oracle_shrinkage_depends_on_dimension_only(#[case] p: usize, #[case] expected: f64) {
        assert_eq!(oracle_shrinkage(p), expected);

        // Two unrelated samples with the same p report the same intensity
        let a = Array2::from_shape_fn((6, p), |(t, i)| (t as f64 + 1.0) * (i as f64 - 0.5));
        let b = Array2::from_shape_fn((40, p), |(t, i)| ((t * p + i) as f64).cos());
        assert_eq!(fit_oracle(&a).unwrap().shrinkage, Some(expected));
        assert_eq!(fit_oracle(&b).unwrap().shrinkage, Some(expected));
    }

    #[test]
    fn test_oracle_estimate() {
        let sample = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 2.0, 4.0, 3.0, 6.0]).unwrap();
        // S = [[1, 2], [2, 4]], μ = 2.5, ρ = 0.5
        let estimate = fit_oracle(&sample).unwrap();
        assert_relative_eq!(estimate.covariance[[0, 0]], 1.75, epsilon = 1e-12);
        assert_relative_eq!(estimate.covariance[[1, 1]], 3.25, epsilon = 1e-12);
        assert_relative_eq!(estimate.covariance[[0, 1]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(trace(&estimate.covariance), 5.0, epsilon = 1e-12);
    }
}
