//! Assertion helpers shared by the test suites.
use nalgebra::DMatrix;

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = &$x - &$y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Asserts that every observed convergence rate lies in `[min_rate, max_rate]`.
#[macro_export]
macro_rules! assert_rates_in_band {
    ($rates:expr, min = $min:expr, max = $max:expr) => {{
        let rates: &[f64] = &$rates;
        for (level, &rate) in rates.iter().enumerate() {
            assert!(
                rate >= $min && rate <= $max,
                "Rate {} between levels {} and {} is outside [{}, {}]. All rates: {:?}",
                rate,
                level,
                level + 1,
                $min,
                $max,
                rates
            );
        }
    }};
}

/// Largest absolute deviation of `matrix` from its transpose.
pub fn asymmetry(matrix: &DMatrix<f64>) -> f64 {
    (matrix - matrix.transpose()).abs().max()
}
