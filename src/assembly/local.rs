//! Element-level assembly of stiffness matrices and load vectors.
use crate::element::{ElementKind, ShapeFunctionSet, Tabulation};
use crate::error::FemError;
use crate::quadrature::QuadratureRule;
use itertools::izip;
use nalgebra::{DMatrix, DVector, Matrix2, Matrix2xX, Point2};

/// A scalar source term `f` on the physical domain.
pub trait SourceFunction: Sync {
    fn evaluate(&self, x: &Point2<f64>) -> f64;
}

impl<F> SourceFunction for F
where
    F: Fn(&Point2<f64>) -> f64 + Sync,
{
    fn evaluate(&self, x: &Point2<f64>) -> f64 {
        self(x)
    }
}

/// The stiffness matrix and load vector of a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementLocalSystem {
    pub stiffness: DMatrix<f64>,
    pub load: DVector<f64>,
}

impl ElementLocalSystem {
    pub fn zeros(num_nodes: usize) -> Self {
        Self {
            stiffness: DMatrix::zeros(num_nodes, num_nodes),
            load: DVector::zeros(num_nodes),
        }
    }
}

/// The isoparametric map evaluated at a single quadrature point.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedPoint {
    /// The physical point.
    pub x: Point2<f64>,
    pub jacobian_determinant: f64,
    pub jacobian_inv_t: Matrix2<f64>,
}

/// Evaluates the isoparametric map defined by the element node coordinates.
///
/// The Jacobian is `J = X G_ref^T`, where the columns of `X` are the node coordinates and the
/// columns of `G_ref` are the reference gradients of the basis functions.
///
/// Returns [`FemError::SingularJacobian`] if the determinant is not finite or vanishes relative
/// to the magnitude of `J`.
pub fn map_reference_point(
    coords: &[Point2<f64>],
    basis_values: &DVector<f64>,
    basis_gradients_ref: &Matrix2xX<f64>,
) -> Result<MappedPoint, FemError> {
    assert_eq!(coords.len(), basis_values.len());
    assert_eq!(coords.len(), basis_gradients_ref.ncols());

    let mut x = Point2::origin();
    let mut j = Matrix2::zeros();
    for (x_i, &phi_i, grad_phi_i) in izip!(coords, basis_values.iter(), basis_gradients_ref.column_iter()) {
        x.coords.axpy(phi_i, &x_i.coords, 1.0);
        j.ger(1.0, &x_i.coords, &grad_phi_i, 1.0);
    }

    let j_det = j.determinant();
    let singular = FemError::SingularJacobian {
        element: None,
        determinant: j_det,
    };
    if !j_det.is_finite() || j_det.abs() <= 1e-14 * j.norm_squared() {
        return Err(singular);
    }
    let j_inv = j.try_inverse().ok_or_else(|| singular.clone())?;
    if j_inv.iter().any(|v| !v.is_finite()) {
        return Err(singular);
    }

    Ok(MappedPoint {
        x,
        jacobian_determinant: j_det,
        jacobian_inv_t: j_inv.transpose(),
    })
}

/// Assembles element stiffness matrices `K_ij = ∫ ∇φ_i · ∇φ_j dx` and load vectors
/// `F_i = ∫ f φ_i dx` with a fixed quadrature rule.
#[derive(Debug, Clone)]
pub struct ElementAssembler<'a, Source> {
    kind: ElementKind,
    num_nodes: usize,
    tabulation: Tabulation,
    source: &'a Source,
}

impl<'a, Source: SourceFunction> ElementAssembler<'a, Source> {
    pub fn new(
        shape_functions: &ShapeFunctionSet,
        quadrature: &QuadratureRule,
        source: &'a Source,
    ) -> Result<Self, FemError> {
        Ok(Self {
            kind: shape_functions.kind(),
            num_nodes: shape_functions.num_nodes(),
            tabulation: shape_functions.tabulate(quadrature)?,
            source,
        })
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn num_element_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn assemble_element(&self, coords: &[Point2<f64>]) -> Result<ElementLocalSystem, FemError> {
        let mut output = ElementLocalSystem::zeros(self.num_nodes);
        self.assemble_element_into(&mut output, coords)?;
        Ok(output)
    }

    /// Assembles the element system for the element with the given node coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the number of coordinates or the output dimensions do not match the number of
    /// element nodes.
    pub fn assemble_element_into(
        &self,
        output: &mut ElementLocalSystem,
        coords: &[Point2<f64>],
    ) -> Result<(), FemError> {
        let n = self.num_nodes;
        assert_eq!(coords.len(), n, "Element coordinate count mismatch");
        assert_eq!(output.stiffness.shape(), (n, n), "Output matrix dimension mismatch");
        assert_eq!(output.load.len(), n, "Output vector dimension mismatch");

        output.stiffness.fill(0.0);
        output.load.fill(0.0);

        let mut phi_grad = Matrix2xX::zeros(n);
        let t = &self.tabulation;
        for (&weight, phi, phi_grad_ref) in izip!(&t.weights, &t.values, &t.gradients) {
            let mapped = map_reference_point(coords, phi, phi_grad_ref)?;
            let scale = weight * self.kind.measure(mapped.jacobian_determinant);

            // Transform reference gradients to gradients with respect to physical coords
            phi_grad.gemm(1.0, &mapped.jacobian_inv_t, phi_grad_ref, 0.0);

            output.stiffness.gemm_tr(scale, &phi_grad, &phi_grad, 1.0);
            let f = self.source.evaluate(&mapped.x);
            output.load.axpy(scale * f, phi, 1.0);
        }

        Ok(())
    }
}
