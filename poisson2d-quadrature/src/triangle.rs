//! Symmetric quadrature tables for the reference triangle `(0, 0), (1, 0), (0, 1)`.
//!
//! Rules are identified by their number of points. The available tables are
//!
//! | points | degree of exactness |
//! |--------|---------------------|
//! | 1      | 1                   |
//! | 3      | 2                   |
//! | 4      | 3                   |
//! | 6      | 4                   |
//! | 10     | 5                   |
//!
//! The 4-point rule has a negative centroid weight.
//!
//! Higher degrees are covered by [`collapsed_gauss`], which maps a tensor-product Gauss rule onto
//! the triangle. These rules are not symmetric and use more points than necessary, but they exist
//! for every degree.

use crate::univariate::gauss;
use crate::{Error, Rule2d};

/// Point counts for which a triangle table exists, in increasing order.
pub const SUPPORTED_POINT_COUNTS: [usize; 5] = [1, 3, 4, 6, 10];

/// The polynomial degree integrated exactly by the table with `num_points` points.
pub fn degree_of_exactness(num_points: usize) -> Option<usize> {
    match num_points {
        1 => Some(1),
        3 => Some(2),
        4 => Some(3),
        6 => Some(4),
        10 => Some(5),
        _ => None,
    }
}

/// The rule with the given number of points.
pub fn rule(num_points: usize) -> Result<Rule2d, Error> {
    let mut rule = (Vec::with_capacity(num_points), Vec::with_capacity(num_points));
    match num_points {
        0 => return Err(Error::InvalidOrder(0)),
        1 => push_centroid(&mut rule, 0.5),
        3 => {
            // Edge midpoints
            rule.0.extend([1.0 / 6.0; 3]);
            rule.1.extend([[0.5, 0.0], [0.5, 0.5], [0.0, 0.5]]);
        }
        4 => {
            // Strang & Fix
            push_centroid(&mut rule, -27.0 / 96.0);
            push_s21_orbit(&mut rule, 0.2, 25.0 / 96.0);
        }
        6 => {
            // Dunavant, degree 4
            push_s21_orbit(&mut rule, 0.445_948_490_915_964_9, 0.5 * 0.223_381_589_678_011_5);
            push_s21_orbit(&mut rule, 0.091_576_213_509_770_74, 0.5 * 0.109_951_743_655_321_9);
        }
        10 => {
            // Degree 5 with positive weights and interior points: centroid + (a, a) + (b, c) orbits
            push_centroid(&mut rule, 0.046_389_520_730_541_194);
            push_s21_orbit(&mut rule, 0.447_537_469_210_99, 0.087_414_726_638_815_03);
            push_s111_orbit(
                &mut rule,
                0.046_044_562_030_023_925,
                0.796_683_170_639_357_2,
                0.031_894_383_225_502_3,
            );
        }
        order => return Err(Error::NoRuleAvailable { order }),
    }
    debug_assert_eq!(rule.0.len(), num_points);
    Ok(rule)
}

/// The smallest table that integrates polynomials of the given degree exactly.
pub fn rule_for_degree(degree: usize) -> Result<Rule2d, Error> {
    let num_points = SUPPORTED_POINT_COUNTS
        .iter()
        .copied()
        .find(|&n| degree_of_exactness(n).is_some_and(|d| d >= degree))
        .ok_or(Error::NoRuleAvailable { order: degree })?;
    rule(num_points)
}

/// A conical product rule with `num_points_per_dim^2` points.
///
/// The unit square is collapsed onto the triangle by `(u, v) -> (u (1 - v), v)`, whose Jacobian
/// is `1 - v`. A polynomial of degree `d` pulls back to degree `d` in `u` and `d + 1` in `v`, so
/// the rule integrates polynomials up to [`collapsed_gauss_degree`] exactly. All weights are
/// positive and all points lie in the interior.
pub fn collapsed_gauss(num_points_per_dim: usize) -> Result<Rule2d, Error> {
    let n = num_points_per_dim;
    let (weights1d, points1d) = gauss(n)?;
    // Map the rule from [-1, 1] to [0, 1]
    let rule1d: Vec<(f64, f64)> = weights1d
        .iter()
        .zip(&points1d)
        .map(|(&w, &[x])| (0.5 * w, 0.5 * (1.0 + x)))
        .collect();

    let mut weights = Vec::with_capacity(n * n);
    let mut points = Vec::with_capacity(n * n);
    for &(wu, u) in &rule1d {
        for &(wv, v) in &rule1d {
            weights.push(wu * wv * (1.0 - v));
            points.push([u * (1.0 - v), v]);
        }
    }
    Ok((weights, points))
}

/// The polynomial degree integrated exactly by [`collapsed_gauss`] with `num_points_per_dim`
/// points per direction.
pub fn collapsed_gauss_degree(num_points_per_dim: usize) -> usize {
    num_points_per_dim.saturating_mul(2).saturating_sub(2)
}

fn push_centroid(rule: &mut Rule2d, weight: f64) {
    rule.0.push(weight);
    rule.1.push([1.0 / 3.0, 1.0 / 3.0]);
}

/// Pushes the three points with barycentric coordinates that are permutations of `(a, a, 1 - 2a)`.
fn push_s21_orbit(rule: &mut Rule2d, a: f64, weight: f64) {
    let b = 1.0 - 2.0 * a;
    rule.0.extend([weight; 3]);
    rule.1.extend([[a, a], [b, a], [a, b]]);
}

/// Pushes the six points with barycentric coordinates that are permutations of `(a, b, 1 - a - b)`.
fn push_s111_orbit(rule: &mut Rule2d, a: f64, b: f64, weight: f64) {
    let c = 1.0 - a - b;
    rule.0.extend([weight; 6]);
    rule.1.extend([[a, b], [b, a], [a, c], [c, a], [b, c], [c, b]]);
}
