//! Dense linear-algebra helpers for covariance estimation
//!
//! This module provides sample covariance computation, Cholesky and Jacobi
//! eigenvalue decompositions, and the matrix norms used to score estimates.

use super::CovarianceError;
use ndarray::{Array1, Array2, Axis};

/// Default maximum number of cyclic Jacobi sweeps
pub const DEFAULT_MAX_SWEEPS: usize = 64;

/// Default relative tolerance on the off-diagonal Frobenius norm
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Check the sample shape and return `(n, p)`
///
/// # Errors
/// * [`CovarianceError::InsufficientData`] when there are fewer than two rows
/// * [`CovarianceError::EmptyDimension`] when there are no columns
pub fn validate_sample(sample: &Array2<f64>) -> Result<(usize, usize), CovarianceError> {
    let (n, p) = sample.dim();
    if n < 2 {
        return Err(CovarianceError::InsufficientData {
            required: 2,
            actual: n,
        });
    }
    if p < 1 {
        return Err(CovarianceError::EmptyDimension);
    }
    Ok((n, p))
}

/// Subtract the column means from the sample
pub fn center_columns(sample: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    let (n, _) = validate_sample(sample)?;
    let means = sample
        .mean_axis(Axis(0))
        .ok_or(CovarianceError::InsufficientData {
            required: 2,
            actual: n,
        })?;
    Ok(sample - &means.insert_axis(Axis(0)))
}

/// Scatter matrix `Xᵀ X` of the centered sample, exactly symmetric
pub(crate) fn scatter(centered: &Array2<f64>) -> Array2<f64> {
    let raw = centered.t().dot(centered);
    (&raw + &raw.t()) * 0.5
}

/// Bessel-corrected sample covariance: S = Xᵀ X / (n - 1) on centered columns
pub fn sample_covariance(sample: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    let centered = center_columns(sample)?;
    let n = centered.nrows() as f64;
    Ok(scatter(&centered) / (n - 1.0))
}

/// Maximum-likelihood covariance: S = Xᵀ X / n on centered columns
pub fn ml_covariance(sample: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    let centered = center_columns(sample)?;
    let n = centered.nrows() as f64;
    Ok(scatter(&centered) / n)
}

/// Sum of the diagonal
pub fn trace(matrix: &Array2<f64>) -> f64 {
    matrix.diag().sum()
}

/// Diagonal matrix carrying the diagonal of `matrix`
#[cfg(test)]
pub(crate) fn diagonal_part(matrix: &Array2<f64>) -> Array2<f64> {
    Array2::from_diag(&matrix.diag())
}

/// Squared Frobenius norm of `a - b`
pub fn squared_frobenius_distance(
    a: &Array2<f64>,
    b: &Array2<f64>,
) -> Result<f64, CovarianceError> {
    if a.dim() != b.dim() {
        return Err(CovarianceError::DimensionMismatch {
            expected: a.nrows(),
            actual: b.nrows(),
        });
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum())
}

/// Check whether a square matrix equals its transpose within `tolerance`
pub fn is_symmetric(matrix: &Array2<f64>, tolerance: f64) -> bool {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return false;
    }
    (0..n).all(|i| ((i + 1)..n).all(|j| (matrix[[i, j]] - matrix[[j, i]]).abs() <= tolerance))
}

/// Cholesky factorization `A = L Lᵀ` of a symmetric positive definite matrix
///
/// # Returns
/// * Lower-triangular factor L
///
/// # Errors
/// Returns [`CovarianceError::NumericalInstability`] when a pivot is not
/// strictly positive, i.e. the matrix is not positive definite.
pub fn cholesky(matrix: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    if n == 0 {
        return Err(CovarianceError::EmptyDimension);
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut pivot = matrix[[j, j]];
        for k in 0..j {
            pivot -= l[[j, k]] * l[[j, k]];
        }
        if !(pivot > 0.0 && pivot.is_finite()) {
            return Err(CovarianceError::NumericalInstability(format!(
                "Cholesky pivot {j} is {pivot:e}; matrix is not positive definite"
            )));
        }
        let diag = pivot.sqrt();
        l[[j, j]] = diag;

        for i in (j + 1)..n {
            let mut sum = matrix[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / diag;
        }
    }

    Ok(l)
}

/// Cyclic Jacobi eigenvalue decomposition for symmetric matrices
///
/// Each sweep rotates away every off-diagonal pair once. Iteration stops when
/// the off-diagonal Frobenius norm falls below `tolerance` times the norm of
/// the whole matrix.
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
/// * `max_sweeps` - Maximum number of sweeps
/// * `tolerance` - Relative convergence tolerance
///
/// # Returns
/// * Eigenvalues and eigenvectors
///
/// # Errors
/// Returns [`CovarianceError::NumericalInstability`] when the iteration has
/// not converged after `max_sweeps`.
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    max_sweeps: usize,
    tolerance: f64,
) -> Result<EigenDecomposition, CovarianceError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    // Initialize: A = copy of input matrix, V = identity
    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    let total_norm = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let threshold = tolerance * total_norm;
    let mut converged = false;

    for _sweep in 0..max_sweeps {
        if off_diagonal_norm(&a) <= threshold {
            converged = true;
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[[p, q]] == 0.0 {
                    continue;
                }
                let (cos_theta, sin_theta) = compute_rotation(a[[p, p]], a[[q, q]], a[[p, q]]);
                apply_jacobi_rotation(&mut a, &mut v, p, q, cos_theta, sin_theta);
            }
        }
    }

    // NaN entries never satisfy the comparison, so they surface here too
    if !converged && !(off_diagonal_norm(&a) <= threshold) {
        return Err(CovarianceError::NumericalInstability(format!(
            "Jacobi eigendecomposition did not converge in {max_sweeps} sweeps"
        )));
    }

    // Sort eigenvalues and eigenvectors in descending order
    let eigenvalues = a.diag().to_owned();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&i, &j| eigenvalues[j].total_cmp(&eigenvalues[i]));

    let sorted_eigenvalues = indices.iter().map(|&i| eigenvalues[i]).collect();
    let mut sorted_eigenvectors = Array2::<f64>::zeros((n, n));
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        sorted_eigenvectors
            .column_mut(new_idx)
            .assign(&v.column(old_idx));
    }

    Ok(EigenDecomposition {
        eigenvalues: sorted_eigenvalues,
        eigenvectors: sorted_eigenvectors,
    })
}

fn off_diagonal_norm(matrix: &Array2<f64>) -> f64 {
    let n = matrix.nrows();
    let mut sum = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += 2.0 * matrix[[i, j]] * matrix[[i, j]];
        }
    }
    sum.sqrt()
}

/// Compute the rotation (cos, sin) that annihilates `a[p, q]`
fn compute_rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };

    // cos = 1/sqrt(1 + t^2), sin = t * cos
    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    (cos_theta, t * cos_theta)
}

/// Apply a Jacobi rotation to matrix A and eigenvector matrix V
fn apply_jacobi_rotation(
    a: &mut Array2<f64>,
    v: &mut Array2<f64>,
    p: usize,
    q: usize,
    cos_theta: f64,
    sin_theta: f64,
) {
    let n = a.nrows();

    let app = a[[p, p]];
    let aqq = a[[q, q]];
    let apq = a[[p, q]];

    a[[p, p]] = cos_theta * cos_theta * app - 2.0 * cos_theta * sin_theta * apq
        + sin_theta * sin_theta * aqq;
    a[[q, q]] = sin_theta * sin_theta * app
        + 2.0 * cos_theta * sin_theta * apq
        + cos_theta * cos_theta * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let aip = a[[i, p]];
            let aiq = a[[i, q]];

            a[[i, p]] = cos_theta * aip - sin_theta * aiq;
            a[[p, i]] = a[[i, p]];

            a[[i, q]] = sin_theta * aip + cos_theta * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let vip = v[[i, p]];
        let viq = v[[i, q]];

        v[[i, p]] = cos_theta * vip - sin_theta * viq;
        v[[i, q]] = sin_theta * vip + cos_theta * viq;
    }
}

/// Reconstruct a matrix from eigenvalues and eigenvectors: M = V Λ Vᵀ
#[cfg(test)]
pub(crate) fn reconstruct_from_eigen(
    eigenvalues: &Array1<f64>,
    eigenvectors: &Array2<f64>,
) -> Result<Array2<f64>, CovarianceError> {
    let n = eigenvalues.len();
    if eigenvectors.nrows() != n || eigenvectors.ncols() != n {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: eigenvectors.nrows(),
        });
    }

    let v_lambda = eigenvectors * &eigenvalues.view().insert_axis(Axis(0));
    Ok(v_lambda.dot(&eigenvectors.t()))
}

/// Square-root factor `A` with `A Aᵀ = Σ` for a symmetric positive
/// semi-definite matrix
///
/// Unlike [`cholesky`], singular matrices are accepted: the factor is
/// `V · diag(sqrt(max(λ, 0)))`, so round-off negative eigenvalues are
/// clipped to zero. Rank-deficient empirical covariances (n ≤ p) are the
/// common case here.
pub fn psd_factor(matrix: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    if matrix.nrows() == 0 {
        return Err(CovarianceError::EmptyDimension);
    }
    let decomp = jacobi_eigendecomp(matrix, DEFAULT_MAX_SWEEPS, DEFAULT_TOLERANCE)?;
    let roots = decomp.eigenvalues.mapv(|lambda| lambda.max(0.0).sqrt());
    Ok(decomp.eigenvectors * &roots.insert_axis(Axis(0)))
}
