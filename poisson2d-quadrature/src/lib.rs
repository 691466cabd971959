//! Quadrature rules for two-dimensional finite element reference domains.
//!
//! The main purpose of this crate is to support the `poisson2d` library. It has no dependencies and
//! works with plain `[f64; D]` points, so the rules may be used completely independently.
//!
//! Conventions for the reference domains:
//!
//! - the reference interval is `[-1, 1]`,
//! - the reference quadrilateral is `[-1, 1]^2` (area 4),
//! - the reference triangle has the corners `(0, 0)`, `(1, 0)`, `(0, 1)` (area 1/2).
//!
//! Weights of every rule sum to the area (length) of its reference domain.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod tensor;
pub mod triangle;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The requested order is not a positive integer.
    InvalidOrder(usize),
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable { order: usize },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOrder(order) => {
                write!(f, "Quadrature order must be positive, got {order}")
            }
            Self::NoRuleAvailable { order } => {
                write!(
                    f,
                    "There is no quadrature rule of order {order} satisfying the requirements available"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A two-dimensional point.
pub type Point2 = Point<2>;

/// A D-dimensional rule, stored as `(weights, points)`.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights
        .iter()
        .zip(points)
        .map(|(w, p)| w * f(p))
        .sum()
}
