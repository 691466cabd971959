use crate::element::{reference_nodes, ElementKind};
use crate::error::FemError;
use crate::quadrature::QuadratureRule;
use nalgebra::{DMatrix, DVector, Matrix2xX, Point2, Vector2};

/// Reciprocal condition number below which the nodal Vandermonde matrix is considered singular.
const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// Exponents `(a, b)` of the monomials `xi^a eta^b` spanning the local polynomial space.
///
/// Triangles use the complete space of degree `order`. Quadrilaterals additionally include the
/// `order` mixed monomials of degree `order + 1`, which gives the bilinear space for order 1 and
/// the serendipity space for order 2.
pub fn monomial_exponents(kind: ElementKind, order: usize) -> Vec<(u32, u32)> {
    let p = order as u32;
    let mut exponents: Vec<(u32, u32)> = (0..=p)
        .flat_map(|degree| (0..=degree).rev().map(move |a| (a, degree - a)))
        .collect();
    if kind == ElementKind::Quadrilateral {
        exponents.extend((1..=p).rev().map(|a| (a, p + 1 - a)));
    }
    exponents
}

/// Nodal Lagrange basis on a reference cell.
///
/// Basis function `i` equals one at reference node `i` and zero at every other node.
#[derive(Debug, Clone)]
pub struct ShapeFunctionSet {
    kind: ElementKind,
    order: usize,
    nodes: Vec<Point2<f64>>,
    exponents: Vec<(u32, u32)>,
    // Column i holds the monomial coefficients of basis function i
    coefficients: DMatrix<f64>,
}

impl ShapeFunctionSet {
    pub fn new(kind: ElementKind, order: usize) -> Result<Self, FemError> {
        let nodes = reference_nodes(kind, order)?;
        let exponents = monomial_exponents(kind, order);
        assert_eq!(nodes.len(), exponents.len());
        let n = nodes.len();

        let vandermonde = DMatrix::from_fn(n, n, |r, c| monomial(&exponents[c], &nodes[r]));
        let degenerate = || FemError::DegenerateShapeFunction { kind, num_nodes: n };

        let singular_values = vandermonde.clone().svd(false, false).singular_values;
        let reciprocal_condition = singular_values.min() / singular_values.max();
        if !(reciprocal_condition >= DEGENERACY_TOLERANCE) {
            return Err(degenerate());
        }

        let coefficients = vandermonde.lu().try_inverse().ok_or_else(degenerate)?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(degenerate());
        }

        Ok(Self {
            kind,
            order,
            nodes,
            exponents,
            coefficients,
        })
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn reference_nodes(&self) -> &[Point2<f64>] {
        &self.nodes
    }

    /// Returns a handle to the basis function associated with node `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not smaller than the number of nodes.
    pub fn basis(&self, index: usize) -> ShapeFunction<'_> {
        assert!(index < self.num_nodes(), "basis function index out of bounds");
        ShapeFunction { set: self, index }
    }

    /// Values of all basis functions at the given reference coordinates.
    pub fn evaluate_basis(&self, xi: &Point2<f64>) -> DVector<f64> {
        let mut values = DVector::zeros(self.num_nodes());
        self.populate_basis(values.as_mut_slice(), xi);
        values
    }

    /// Reference gradients of all basis functions, one column per basis function.
    pub fn evaluate_gradients(&self, xi: &Point2<f64>) -> Matrix2xX<f64> {
        let mut gradients = Matrix2xX::zeros(self.num_nodes());
        self.populate_basis_gradients(&mut gradients, xi);
        gradients
    }

    /// Writes the basis function values at `xi` into `basis_values`.
    ///
    /// # Panics
    ///
    /// Panics if the length of `basis_values` differs from the number of nodes.
    pub fn populate_basis(&self, basis_values: &mut [f64], xi: &Point2<f64>) {
        assert_eq!(basis_values.len(), self.num_nodes());
        let monomials = DVector::from_iterator(
            self.exponents.len(),
            self.exponents.iter().map(|e| monomial(e, xi)),
        );
        for (value, column) in basis_values.iter_mut().zip(self.coefficients.column_iter()) {
            *value = column.dot(&monomials);
        }
    }

    /// Writes the reference gradients at `xi` into the columns of `basis_gradients`.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns of `basis_gradients` differs from the number of nodes.
    pub fn populate_basis_gradients(&self, basis_gradients: &mut Matrix2xX<f64>, xi: &Point2<f64>) {
        assert_eq!(basis_gradients.ncols(), self.num_nodes());
        let n = self.exponents.len();
        let d_xi = DVector::from_iterator(n, self.exponents.iter().map(|e| monomial_gradient(e, xi).x));
        let d_eta = DVector::from_iterator(n, self.exponents.iter().map(|e| monomial_gradient(e, xi).y));
        for (mut gradient, coefficients) in basis_gradients
            .column_iter_mut()
            .zip(self.coefficients.column_iter())
        {
            gradient[0] = coefficients.dot(&d_xi);
            gradient[1] = coefficients.dot(&d_eta);
        }
    }

    /// Tabulates basis values and reference gradients at every point of the given rule.
    pub fn tabulate(&self, quadrature: &QuadratureRule) -> Result<Tabulation, FemError> {
        if quadrature.kind() != self.kind {
            return Err(FemError::InvalidInput(format!(
                "cannot tabulate {} shape functions with a {} quadrature rule",
                self.kind,
                quadrature.kind()
            )));
        }
        let points: Vec<_> = quadrature.points().iter().map(|q| q.xi).collect();
        let weights: Vec<_> = quadrature.points().iter().map(|q| q.weight).collect();
        let values = points.iter().map(|xi| self.evaluate_basis(xi)).collect();
        let gradients = points.iter().map(|xi| self.evaluate_gradients(xi)).collect();
        Ok(Tabulation {
            weights,
            points,
            values,
            gradients,
        })
    }
}

/// A single basis function of a [`ShapeFunctionSet`].
#[derive(Debug, Copy, Clone)]
pub struct ShapeFunction<'a> {
    set: &'a ShapeFunctionSet,
    index: usize,
}

impl<'a> ShapeFunction<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self, xi: &Point2<f64>) -> f64 {
        let coefficients = self.set.coefficients.column(self.index);
        self.set
            .exponents
            .iter()
            .zip(coefficients.iter())
            .map(|(e, c)| c * monomial(e, xi))
            .sum()
    }

    pub fn gradient(&self, xi: &Point2<f64>) -> Vector2<f64> {
        let coefficients = self.set.coefficients.column(self.index);
        self.set
            .exponents
            .iter()
            .zip(coefficients.iter())
            .map(|(e, c)| monomial_gradient(e, xi) * *c)
            .sum()
    }
}

/// Basis values and reference gradients precomputed at the points of a quadrature rule.
#[derive(Debug, Clone)]
pub struct Tabulation {
    pub weights: Vec<f64>,
    pub points: Vec<Point2<f64>>,
    pub values: Vec<DVector<f64>>,
    pub gradients: Vec<Matrix2xX<f64>>,
}

impl Tabulation {
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

fn monomial(&(a, b): &(u32, u32), xi: &Point2<f64>) -> f64 {
    xi.x.powi(a as i32) * xi.y.powi(b as i32)
}

fn monomial_gradient(&(a, b): &(u32, u32), xi: &Point2<f64>) -> Vector2<f64> {
    let d_xi = if a == 0 {
        0.0
    } else {
        a as f64 * xi.x.powi(a as i32 - 1) * xi.y.powi(b as i32)
    };
    let d_eta = if b == 0 {
        0.0
    } else {
        b as f64 * xi.x.powi(a as i32) * xi.y.powi(b as i32 - 1)
    };
    Vector2::new(d_xi, d_eta)
}
