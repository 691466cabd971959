//! Element kinds and the layout of nodes on their reference cells.
//!
//! Reference cells:
//!
//! - the triangle with corners `(0, 0)`, `(1, 0)`, `(0, 1)`,
//! - the quadrilateral `[-1, 1]^2`.
//!
//! Nodes of an order `p` element are ordered as follows. First come the corners in
//! counter-clockwise order. Then follow `p - 1` equispaced nodes on each edge, edge `k` running
//! from corner `k` to corner `k + 1`. Interior nodes come last.
use crate::error::FemError;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::fmt::{Display, Formatter};

mod lagrange;

pub use lagrange::*;

/// The cell shapes supported by the solver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Triangle,
    Quadrilateral,
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Triangle => write!(f, "triangle"),
            Self::Quadrilateral => write!(f, "quadrilateral"),
        }
    }
}

impl ElementKind {
    pub fn num_sides(&self) -> usize {
        match self {
            Self::Triangle => 3,
            Self::Quadrilateral => 4,
        }
    }

    /// Area of the reference cell. Quadrature weights sum to this value.
    pub fn reference_area(&self) -> f64 {
        match self {
            Self::Triangle => 0.5,
            Self::Quadrilateral => 4.0,
        }
    }

    /// Corners of the reference cell in counter-clockwise order.
    pub fn reference_vertices(&self) -> Vec<Point2<f64>> {
        match self {
            Self::Triangle => vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)],
            Self::Quadrilateral => vec![
                Point2::new(-1.0, -1.0),
                Point2::new(1.0, -1.0),
                Point2::new(1.0, 1.0),
                Point2::new(-1.0, 1.0),
            ],
        }
    }

    /// Number of nodes of the Lagrange element of the given order.
    ///
    /// Equals `sides * order + (order - 1)(order - 2) / 2`, i.e. 3, 6, 10 nodes for triangles
    /// and 4, 8, 13 nodes for quadrilaterals of order 1, 2, 3.
    pub fn nodes_per_element(&self, order: usize) -> Result<usize, FemError> {
        let interior = match order {
            0 => return Err(FemError::InvalidOrder(order)),
            1 | 2 => Some(0),
            _ => (order - 1).checked_mul(order - 2).map(|n| n / 2),
        };
        self.num_sides()
            .checked_mul(order)
            .zip(interior)
            .and_then(|(boundary, interior)| boundary.checked_add(interior))
            .ok_or(FemError::InvalidOrder(order))
    }

    /// Scale factor relating integrals over the reference cell to integrals over a physical
    /// cell, given the determinant of the Jacobian of the map between them.
    ///
    /// Quadrature weights are normalized to the reference area, so the factor is `|det J|`
    /// for both cell shapes.
    pub fn measure(&self, jacobian_determinant: f64) -> f64 {
        jacobian_determinant.abs()
    }
}

fn num_interior_nodes(order: usize) -> usize {
    if order < 3 {
        0
    } else {
        (order - 1) * (order - 2) / 2
    }
}

/// Coordinates of the nodes of the order `order` element on its reference cell.
pub fn reference_nodes(kind: ElementKind, order: usize) -> Result<Vec<Point2<f64>>, FemError> {
    let num_nodes = kind.nodes_per_element(order)?;
    let corners = kind.reference_vertices();
    let num_sides = corners.len();

    let mut nodes = Vec::with_capacity(num_nodes);
    nodes.extend(corners.iter().copied());

    for k in 0..num_sides {
        let a = corners[k];
        let b = corners[(k + 1) % num_sides];
        for i in 1..order {
            let t = i as f64 / order as f64;
            nodes.push(a + (b - a) * t);
        }
    }

    match kind {
        ElementKind::Triangle => {
            // Interior points of the barycentric lattice
            for b in 1..order {
                for a in 1..order {
                    if a + b < order {
                        nodes.push(Point2::new(a as f64 / order as f64, b as f64 / order as f64));
                    }
                }
            }
        }
        ElementKind::Quadrilateral => {
            let num_interior = num_interior_nodes(order);
            if num_interior == 1 {
                nodes.push(Point2::origin());
            } else {
                for i in 0..num_interior {
                    let angle = 2.0 * PI * i as f64 / num_interior as f64;
                    nodes.push(Point2::from(0.5 * Vector2::new(angle.cos(), angle.sin())));
                }
            }
        }
    }

    debug_assert_eq!(nodes.len(), num_nodes);
    Ok(nodes)
}

/// Polygon area of the cell spanned by the given corners (shoelace formula).
pub fn polygon_area(corners: &[Point2<f64>]) -> f64 {
    let n = corners.len();
    let twice_area: f64 = (0..n)
        .map(|i| {
            let p = corners[i];
            let q = corners[(i + 1) % n];
            p.x * q.y - q.x * p.y
        })
        .sum();
    0.5 * twice_area.abs()
}
