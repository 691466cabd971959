use super::interval_monomial_integral;
use matrixcompare::assert_scalar_eq;
use poisson2d_quadrature::tensor::quadrilateral_gauss;
use poisson2d_quadrature::{integrate, Error};

#[test]
fn quadrilateral_gauss_rules_satisfy_expected_accuracy() {
    for n in 1..=12 {
        // Degree that the rule integrates exactly *along each dimension*
        let expected_polynomial_degree = 2 * n - 1;
        let rule = quadrilateral_gauss(n).unwrap();

        assert_eq!(rule.0.len(), n * n);
        assert!(rule.0.iter().all(|&w| w > 0.0));
        assert_scalar_eq!(rule.0.iter().sum::<f64>(), 4.0, comp = abs, tol = 1e-12);

        for alpha in 0..=expected_polynomial_degree as i32 {
            for beta in 0..=expected_polynomial_degree as i32 {
                let expected = interval_monomial_integral(alpha) * interval_monomial_integral(beta);
                let estimated = integrate(&rule, |&[x, y]| x.powi(alpha) * y.powi(beta));
                assert_scalar_eq!(estimated, expected, comp = abs, tol = 1e-13);
            }
        }
    }
}

#[test]
fn quadrilateral_gauss_rejects_zero_points() {
    assert_eq!(quadrilateral_gauss(0), Err(Error::InvalidOrder(0)));
}
