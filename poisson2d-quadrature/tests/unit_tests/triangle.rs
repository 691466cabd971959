use super::triangle_monomial_integral;
use matrixcompare::assert_scalar_eq;
use poisson2d_quadrature::triangle::{
    collapsed_gauss, collapsed_gauss_degree, degree_of_exactness, rule, rule_for_degree, SUPPORTED_POINT_COUNTS,
};
use poisson2d_quadrature::{integrate, Error};
use proptest::prelude::*;

#[test]
fn triangle_rule_weights_sum_to_reference_area() {
    for &n in &SUPPORTED_POINT_COUNTS {
        let (weights, points) = rule(n).unwrap();
        assert_eq!(weights.len(), n);
        assert_eq!(points.len(), n);
        assert_scalar_eq!(weights.iter().sum::<f64>(), 0.5, comp = abs, tol = 1e-14);
    }
}

#[test]
fn triangle_rules_integrate_monomials_up_to_their_degree() {
    for &n in &SUPPORTED_POINT_COUNTS {
        let degree = degree_of_exactness(n).unwrap() as u32;
        let quadrature = rule(n).unwrap();
        for alpha in 0..=degree {
            for beta in 0..=(degree - alpha) {
                let estimated = integrate(&quadrature, |&[x, y]| x.powi(alpha as i32) * y.powi(beta as i32));
                assert_scalar_eq!(
                    estimated,
                    triangle_monomial_integral(alpha, beta),
                    comp = abs,
                    tol = 1e-14
                );
            }
        }
    }
}

#[test]
fn triangle_rule_points_lie_in_closed_reference_triangle() {
    for &n in &SUPPORTED_POINT_COUNTS {
        let (_, points) = rule(n).unwrap();
        for [x, y] in points {
            assert!(x >= 0.0 && y >= 0.0 && x + y <= 1.0 + 1e-15);
        }
    }
}

#[test]
fn unsupported_triangle_rules_are_rejected() {
    assert_eq!(rule(0), Err(Error::InvalidOrder(0)));
    for n in [2, 5, 7, 8, 9, 11, 12] {
        assert_eq!(rule(n), Err(Error::NoRuleAvailable { order: n }));
    }
    assert_eq!(rule_for_degree(6), Err(Error::NoRuleAvailable { order: 6 }));
}

#[test]
fn rule_for_degree_picks_smallest_sufficient_table() {
    let expected_points = [(0, 1), (1, 1), (2, 3), (3, 4), (4, 6), (5, 10)];
    for (degree, num_points) in expected_points {
        assert_eq!(rule_for_degree(degree).unwrap().0.len(), num_points);
    }
}

#[test]
fn collapsed_gauss_rules_integrate_monomials_up_to_their_degree() {
    for n in 1..=8 {
        let quadrature = collapsed_gauss(n).unwrap();
        let (weights, points) = &quadrature;
        assert_eq!(weights.len(), n * n);
        assert!(weights.iter().all(|&w| w > 0.0));
        assert!(points.iter().all(|&[x, y]| x > 0.0 && y > 0.0 && x + y < 1.0));
        assert_scalar_eq!(weights.iter().sum::<f64>(), 0.5, comp = abs, tol = 1e-14);

        let degree = collapsed_gauss_degree(n) as u32;
        assert_eq!(degree, 2 * n as u32 - 2);
        for alpha in 0..=degree {
            for beta in 0..=(degree - alpha) {
                let estimated = integrate(&quadrature, |&[x, y]| x.powi(alpha as i32) * y.powi(beta as i32));
                assert_scalar_eq!(
                    estimated,
                    triangle_monomial_integral(alpha, beta),
                    comp = abs,
                    tol = 1e-14
                );
            }
        }
    }
}

#[test]
fn collapsed_gauss_rejects_invalid_point_counts() {
    assert_eq!(collapsed_gauss(0), Err(Error::InvalidOrder(0)));
    assert_eq!(collapsed_gauss(100_000), Err(Error::NoRuleAvailable { order: 100_000 }));
}

proptest! {
    #[test]
    fn ten_point_rule_integrates_random_quintics(coefficients in prop::collection::vec(-1.0..1.0f64, 21)) {
        let monomials: Vec<(u32, u32)> = (0..=5u32)
            .flat_map(|d| (0..=d).map(move |a| (a, d - a)))
            .collect();
        let polynomial = |x: f64, y: f64| {
            monomials
                .iter()
                .zip(&coefficients)
                .map(|(&(a, b), c)| c * x.powi(a as i32) * y.powi(b as i32))
                .sum::<f64>()
        };
        let expected: f64 = monomials
            .iter()
            .zip(&coefficients)
            .map(|(&(a, b), c)| c * triangle_monomial_integral(a, b))
            .sum();
        let estimated = integrate(&rule(10).unwrap(), |&[x, y]| polynomial(x, y));
        prop_assert!((estimated - expected).abs() <= 1e-13);
    }
}
