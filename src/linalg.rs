//! Small dense matrix helpers for the phase tracker
//!
//! Fixed-size 3x3 products and a 2x2 Cramer solve, plus a Jacobi
//! eigendecomposition used to repair a covariance that has lost positive
//! semi-definiteness.

pub type Matrix2 = [[f64; 2]; 2];
pub type Matrix3 = [[f64; 3]; 3];

pub fn diag3(d: [f64; 3]) -> Matrix3 {
    [[d[0], 0.0, 0.0], [0.0, d[1], 0.0], [0.0, 0.0, d[2]]]
}

pub fn mul3(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

pub fn transpose3(a: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[j][i] = a[i][j];
        }
    }
    out
}

pub fn add3(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = *a;
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] += b[i][j];
        }
    }
    out
}

pub fn scale3(a: &Matrix3, factor: f64) -> Matrix3 {
    a.map(|row| row.map(|v| v * factor))
}

/// Solve `a * x = b` by Cramer's rule
///
/// Returns `None` when `a` is singular.
pub fn solve2(a: &Matrix2, b: [f64; 2]) -> Option<[f64; 2]> {
    let det = a[0][0] * a[1][1] - a[0][1] * a[1][0];
    if !det.is_finite() || det.abs() < f64::MIN_POSITIVE {
        return None;
    }
    Some([
        (b[0] * a[1][1] - a[0][1] * b[1]) / det,
        (a[0][0] * b[1] - b[0] * a[1][0]) / det,
    ])
}

/// Eigendecomposition of a symmetric 3x3 matrix by cyclic Jacobi rotations
///
/// Returns the eigenvalues and a matrix whose columns are the eigenvectors.
pub fn symmetric_eigen3(a: &Matrix3) -> ([f64; 3], Matrix3) {
    let mut m = *a;
    let mut v = diag3([1.0; 3]);

    for _ in 0..50 {
        let off = m[0][1].powi(2) + m[0][2].powi(2) + m[1][2].powi(2);
        let on = m[0][0].powi(2) + m[1][1].powi(2) + m[2][2].powi(2);
        if off <= 1e-30 * on {
            break;
        }
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            if m[p][q].abs() < 1e-300 {
                continue;
            }
            let theta = (m[q][q] - m[p][p]) / (2.0 * m[p][q]);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            let mut rotation = diag3([1.0; 3]);
            rotation[p][p] = c;
            rotation[q][q] = c;
            rotation[p][q] = s;
            rotation[q][p] = -s;

            m = mul3(&transpose3(&rotation), &mul3(&m, &rotation));
            v = mul3(&v, &rotation);
        }
    }
    ([m[0][0], m[1][1], m[2][2]], v)
}

/// Replace every eigenvalue of a symmetric matrix by its absolute value
pub fn abs_eigenvalues(a: &Matrix3) -> Matrix3 {
    let (values, vectors) = symmetric_eigen3(a);
    mul3(
        &mul3(&vectors, &diag3(values.map(f64::abs))),
        &transpose3(&vectors),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Matrix3, b: &Matrix3) {
        for i in 0..3 {
            for j in 0..3 {
                assert!((a[i][j] - b[i][j]).abs() < 1e-9, "[{}][{}]: {} != {}", i, j, a[i][j], b[i][j]);
            }
        }
    }

    #[test]
    fn test_solve2() {
        let a = [[2.0, 1.0], [1.0, 3.0]];
        let x = solve2(&a, [3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
        assert!(solve2(&[[1.0, 2.0], [2.0, 4.0]], [1.0, 1.0]).is_none());
    }

    #[test]
    fn test_eigen_reconstructs() {
        let a = [[4.0, 1.0, -2.0], [1.0, 2.0, 0.5], [-2.0, 0.5, 3.0]];
        let (values, vectors) = symmetric_eigen3(&a);
        let rebuilt = mul3(&mul3(&vectors, &diag3(values)), &transpose3(&vectors));
        assert_close(&rebuilt, &a);
        let trace: f64 = values.iter().sum();
        assert!((trace - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_abs_eigenvalues_repairs_indefinite() {
        // eigenvalues 3 and -1 in the upper block
        let a = [[1.0, 2.0, 0.0], [2.0, 1.0, 0.0], [0.0, 0.0, 0.5]];
        let repaired = abs_eigenvalues(&a);
        let (values, _) = symmetric_eigen3(&repaired);
        assert!(values.iter().all(|v| *v > -1e-12));
        let expected = [[2.0, 1.0, 0.0], [1.0, 2.0, 0.0], [0.0, 0.0, 0.5]];
        assert_close(&repaired, &expected);
    }

    #[test]
    fn test_already_diagonal() {
        let a = diag3([1.0, -2.0, 3.0]);
        assert_close(&abs_eigenvalues(&a), &diag3([1.0, 2.0, 3.0]));
    }
}
