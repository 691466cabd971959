//! Quadrature rules on the reference cells, validated against the reference area.
use crate::element::ElementKind;
use crate::error::FemError;
use nalgebra::Point2;
use poisson2d_quadrature::{tensor, triangle, Rule2d};

/// Relative tolerance on the sum of quadrature weights.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-12;

/// A reference point together with its weight.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadraturePoint {
    pub xi: Point2<f64>,
    pub weight: f64,
}

/// A quadrature rule on the reference cell of a given element kind.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    kind: ElementKind,
    points: Vec<QuadraturePoint>,
    degree: usize,
}

impl QuadratureRule {
    /// Looks up a rule by its order.
    ///
    /// For triangles the order is the number of points, one of 1, 3, 4, 6 or 10. For
    /// quadrilaterals it is the number of Gauss points per direction.
    pub fn new(kind: ElementKind, order: usize) -> Result<Self, FemError> {
        if order == 0 {
            return Err(FemError::InvalidOrder(order));
        }
        let to_fem_error = |err: poisson2d_quadrature::Error| FemError::from_quadrature(kind, err);
        let (rule, degree) = match kind {
            ElementKind::Triangle => {
                let degree = triangle::degree_of_exactness(order)
                    .ok_or(FemError::UnsupportedQuadratureOrder { kind, order })?;
                (triangle::rule(order).map_err(to_fem_error)?, degree)
            }
            ElementKind::Quadrilateral => (
                tensor::quadrilateral_gauss(order).map_err(to_fem_error)?,
                2 * order - 1,
            ),
        };
        Self::from_rule(kind, rule, degree)
    }

    /// Returns the cheapest available rule that integrates polynomials of the given total
    /// degree exactly.
    ///
    /// Triangle degrees up to 5 use the symmetric tables, higher degrees a collapsed Gauss rule.
    pub fn with_degree(kind: ElementKind, degree: usize) -> Result<Self, FemError> {
        let overflow = || FemError::InvalidOrder(degree);
        match kind {
            ElementKind::Triangle => match triangle::rule_for_degree(degree) {
                Ok((weights, _)) => Self::new(kind, weights.len()),
                Err(_) => {
                    let num_points_per_dim = degree.checked_add(3).ok_or_else(overflow)? / 2;
                    let rule = triangle::collapsed_gauss(num_points_per_dim)
                        .map_err(|err| FemError::from_quadrature(kind, err))?;
                    Self::from_rule(kind, rule, triangle::collapsed_gauss_degree(num_points_per_dim))
                }
            },
            // n Gauss points per direction are exact up to degree 2n - 1 in each variable
            ElementKind::Quadrilateral => Self::new(kind, degree.checked_add(2).ok_or_else(overflow)? / 2),
        }
    }

    /// Default rule for assembling elements of the given order: exact for products of two
    /// basis functions on affine cells.
    pub fn default_for_assembly(kind: ElementKind, order: usize) -> Result<Self, FemError> {
        Self::with_degree(kind, default_degree(order, 0)?)
    }

    /// Default rule for error estimation, two degrees more accurate than the assembly rule.
    pub fn default_for_error_estimation(kind: ElementKind, order: usize) -> Result<Self, FemError> {
        Self::with_degree(kind, default_degree(order, 2)?)
    }

    /// Builds a rule from explicit points, checking that the weights sum to the reference area.
    pub fn from_points(
        kind: ElementKind,
        points: Vec<QuadraturePoint>,
        degree: usize,
    ) -> Result<Self, FemError> {
        if points.is_empty() {
            return Err(FemError::InvalidInput("quadrature rule has no points".to_string()));
        }
        if points
            .iter()
            .any(|q| !q.weight.is_finite() || !q.xi.x.is_finite() || !q.xi.y.is_finite())
        {
            return Err(FemError::InvalidInput(
                "quadrature rule contains non-finite values".to_string(),
            ));
        }

        let weight_sum: f64 = points.iter().map(|q| q.weight).sum();
        let expected = kind.reference_area();
        if (weight_sum - expected).abs() > WEIGHT_SUM_TOLERANCE * expected {
            return Err(FemError::InvalidQuadratureRule {
                kind,
                weight_sum,
                expected,
            });
        }

        Ok(Self { kind, points, degree })
    }

    fn from_rule(kind: ElementKind, (weights, points): Rule2d, degree: usize) -> Result<Self, FemError> {
        let points = weights
            .into_iter()
            .zip(points)
            .map(|(weight, [x, y])| QuadraturePoint {
                xi: Point2::new(x, y),
                weight,
            })
            .collect();
        Self::from_points(kind, points, degree)
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn points(&self) -> &[QuadraturePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highest total polynomial degree integrated exactly.
    pub fn degree_of_exactness(&self) -> usize {
        self.degree
    }

    pub fn weight_sum(&self) -> f64 {
        self.points.iter().map(|q| q.weight).sum()
    }

    /// Approximates the integral of `f` over the reference cell.
    pub fn integrate(&self, f: impl Fn(&Point2<f64>) -> f64) -> f64 {
        self.points.iter().map(|q| q.weight * f(&q.xi)).sum()
    }
}

/// `2 * order + extra`, the degree of a product of two basis functions plus `extra`.
fn default_degree(order: usize, extra: usize) -> Result<usize, FemError> {
    if order == 0 {
        return Err(FemError::InvalidOrder(order));
    }
    order
        .checked_mul(2)
        .and_then(|degree| degree.checked_add(extra))
        .ok_or(FemError::InvalidOrder(order))
}
