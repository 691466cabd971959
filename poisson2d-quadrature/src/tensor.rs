//! Quadrilateral rules formed as tensor products of 1D Gauss rules.

use crate::univariate::gauss;
use crate::{Error, Rule};

/// A Gauss rule for the reference quadrilateral `[-1, 1]^2`.
///
/// The rule is the tensor product of two 1D rules with `num_points_per_dim` points each, so it has
/// `num_points_per_dim^2` points and integrates polynomials of degree `2n - 1` in each variable
/// exactly. Points are ordered with the first coordinate varying slowest.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Result<Rule<2>, Error> {
    let n = num_points_per_dim;
    let (weights1d, points1d) = gauss(n)?;
    let mut weights2d = Vec::with_capacity(n * n);
    let mut points2d = Vec::with_capacity(n * n);

    let rule1d_iter = || weights1d.iter().zip(&points1d);

    for (&wx, &[x]) in rule1d_iter() {
        for (&wy, &[y]) in rule1d_iter() {
            weights2d.push(wx * wy);
            points2d.push([x, y]);
        }
    }

    Ok((weights2d, points2d))
}
