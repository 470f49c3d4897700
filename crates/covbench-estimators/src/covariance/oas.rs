//! Oracle Approximating Shrinkage (OAS)
//!
//! Closed-form intensity of Chen, Wiesel, Eldar & Hero (2010) in the
//! simplified form used by scikit-learn:
//!
//! ρ = min( (tr(S²) + tr²(S)) / ((n + 1) (tr(S²) - tr²(S)/p)), 1 )
//!
//! with S the maximum-likelihood covariance and target F = (tr(S)/p) I.
//! A zero denominator means S is already proportional to I, so ρ = 1.

use super::utils::{ml_covariance, trace};
use super::{CovarianceError, Estimate, shrink_toward_scaled_identity};
use ndarray::Array2;

/// Compute the OAS shrinkage intensity
///
/// # Arguments
/// * `ml_cov` - Maximum-likelihood covariance (p x p)
/// * `n_obs` - Number of observations behind `ml_cov`
pub fn oas_shrinkage(ml_cov: &Array2<f64>, n_obs: usize) -> f64 {
    let n = n_obs as f64;
    let p = ml_cov.nrows() as f64;

    let tr = trace(ml_cov);
    let tr_sq = ml_cov.iter().map(|v| v * v).sum::<f64>();

    let numerator = tr_sq + tr * tr;
    let denominator = (n + 1.0) * (tr_sq - tr * tr / p);

    if denominator > 0.0 {
        (numerator / denominator).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

pub(crate) fn fit_oas(sample: &Array2<f64>) -> Result<Estimate, CovarianceError> {
    let ml_cov = ml_covariance(sample)?;
    let rho = oas_shrinkage(&ml_cov, sample.nrows());

    Ok(Estimate {
        covariance: shrink_toward_scaled_identity(&ml_cov, rho),
        shrinkage: Some(rho),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_oas_formula() {
        let ml_cov = Array2::from_shape_vec((2, 2), vec![2.0, 1.0, 1.0, 1.0]).unwrap();
        // num = 7 + 9 = 16, den = (10 + 1) * (7 - 4.5) = 27.5
        assert_relative_eq!(oas_shrinkage(&ml_cov, 10), 16.0 / 27.5, epsilon = 1e-12);

        let ml_cov =
            Array2::from_shape_vec((3, 3), vec![3.0, 1.0, 0.0, 1.0, 2.0, 0.5, 0.0, 0.5, 1.0])
                .unwrap();
        // tr = 6, tr(S²) = 16.5, num = 52.5, den = 21 * (16.5 - 12) = 94.5
        assert_relative_eq!(oas_shrinkage(&ml_cov, 20), 52.5 / 94.5, epsilon = 1e-12);
    }

    #[test]
    fn test_oas_caps_at_one() {
        // Near-identity covariance with few observations saturates
        let ml_cov = Array2::from_shape_vec((2, 2), vec![1.0, 0.01, 0.01, 1.0]).unwrap();
        assert_eq!(oas_shrinkage(&ml_cov, 3), 1.0);
    }

    #[test]
    fn test_oas_single_variable() {
        let sample = Array2::from_shape_vec((3, 1), vec![1.0, 2.0, 4.0]).unwrap();
        let estimate = fit_oas(&sample).unwrap();
        let ml = ml_covariance(&sample).unwrap();
        // Shrinking a scalar toward itself changes nothing
        assert_relative_eq!(estimate.covariance[[0, 0]], ml[[0, 0]], epsilon = 1e-12);
        assert_eq!(estimate.shrinkage, Some(1.0));
    }

    #[test]
    fn test_oas_shrinks_less_with_more_observations() {
        let ml_cov =
            Array2::from_shape_vec((3, 3), vec![4.0, 1.0, 0.5, 1.0, 9.0, 1.5, 0.5, 1.5, 16.0])
                .unwrap();
        let few = oas_shrinkage(&ml_cov, 5);
        let many = oas_shrinkage(&ml_cov, 500);
        assert!(many < few, "few={few}, many={many}");
    }
}
