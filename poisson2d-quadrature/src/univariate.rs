//! Gauss–Legendre rules for the reference interval `[-1, 1]`.

use crate::{Error, Rule};
use std::f64::consts::PI;

const MAX_NEWTON_ITERATIONS: usize = 100;

/// Largest number of points for which a Gauss rule is computed.
pub const MAX_POINTS: usize = 512;

/// Value of the Legendre polynomial `P_n` and of `P_{n-1}` at a point.
///
/// Derivatives are computed with a formula that is singular at `|x| == 1`, so only points in the
/// open interval `(-1, 1)` are supported.
#[derive(Debug, Clone, Copy)]
struct Legendre {
    n: usize,
    x: f64,
    p_n: f64,
    p_prev: f64,
}

impl Legendre {
    fn at(n: usize, x: f64) -> Self {
        // m P_m(x) = (2m - 1) x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let (mut p_n, mut p_prev) = (1.0, 0.0);
        for m in 1..=n {
            let m = m as f64;
            let p_next = ((2.0 * m - 1.0) * x * p_n - (m - 1.0) * p_prev) / m;
            p_prev = p_n;
            p_n = p_next;
        }
        Self { n, x, p_n, p_prev }
    }

    fn value(&self) -> f64 {
        self.p_n
    }

    fn derivative(&self) -> f64 {
        // P_n'(x) = n (x P_n(x) - P_{n - 1}(x)) / (x^2 - 1)
        let n = self.n as f64;
        n * (self.x * self.p_n - self.p_prev) / (self.x * self.x - 1.0)
    }
}

/// Gauss–Legendre rule with `num_points` points on `[-1, 1]`.
///
/// A rule with `n` points integrates polynomials of degree up to `2n - 1` exactly. Points are
/// returned in ascending order.
///
/// Returns [`Error::InvalidOrder`] if zero points are requested and [`Error::NoRuleAvailable`]
/// for more than [`MAX_POINTS`] points.
pub fn gauss(num_points: usize) -> Result<Rule<1>, Error> {
    let n = num_points;
    if n == 0 {
        return Err(Error::InvalidOrder(n));
    }
    if n > MAX_POINTS {
        return Err(Error::NoRuleAvailable { order: n });
    }

    // Newton iteration on the roots, loosely following Numerical Recipes (3rd ed.).
    // Only the non-negative half is computed, the rest follows by symmetry.
    let num_positive = (n + 1) / 2;
    let mut positive = Vec::with_capacity(num_positive);
    for i in 0..num_positive {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut p = Legendre::at(n, x);
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let dx = -p.value() / p.derivative();
            x += dx;
            p = Legendre::at(n, x);
            if dx.abs() <= 1e-15 {
                break;
            }
        }
        let dp = p.derivative();
        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        positive.push((x, w));
    }

    // positive[0] is the largest root
    let mut weights = Vec::with_capacity(n);
    let mut points = Vec::with_capacity(n);
    for &(x, w) in &positive {
        points.push([-x]);
        weights.push(w);
    }
    let mirrored = if n % 2 == 1 { num_positive - 1 } else { num_positive };
    for &(x, w) in positive[..mirrored].iter().rev() {
        points.push([x]);
        weights.push(w);
    }

    debug_assert_eq!(points.len(), n);
    Ok((weights, points))
}
