//! Functionality for error estimation.
use crate::assembly::local::map_reference_point;
use crate::element::{ElementKind, ShapeFunctionSet, Tabulation};
use crate::error::FemError;
use crate::mesh::Mesh;
use crate::quadrature::QuadratureRule;
use itertools::izip;
use nalgebra::{DVector, Matrix2xX, Point2, Vector2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// An exact solution `u` with its gradient, used as reference for error estimation.
pub trait ExactSolution: Sync {
    fn value(&self, x: &Point2<f64>) -> f64;
    fn gradient(&self, x: &Point2<f64>) -> Vector2<f64>;
}

/// Errors of a discrete solution measured in the $L^2$ norm and the energy norm
/// $\norm{\nabla (u_h - u)}_{L^2}$.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorNorms {
    pub l2: f64,
    pub energy: f64,
}

/// Squared $L^2$ and energy errors on a single element, given the element node coordinates and
/// the element's nodal values of $u_h$.
#[allow(non_snake_case)]
pub fn estimate_element_errors_squared(
    kind: ElementKind,
    tabulation: &Tabulation,
    coords: &[Point2<f64>],
    u_h_element: &DVector<f64>,
    u: &impl ExactSolution,
) -> Result<(f64, f64), FemError> {
    assert_eq!(coords.len(), u_h_element.len());

    let mut L2_squared = 0.0;
    let mut energy_squared = 0.0;
    let mut phi_grad = Matrix2xX::zeros(coords.len());
    for (&weight, phi, phi_grad_ref) in izip!(&tabulation.weights, &tabulation.values, &tabulation.gradients) {
        let mapped = map_reference_point(coords, phi, phi_grad_ref)?;
        let scale = weight * kind.measure(mapped.jacobian_determinant);

        phi_grad.gemm(1.0, &mapped.jacobian_inv_t, phi_grad_ref, 0.0);
        let u_h = phi.dot(u_h_element);
        let u_h_grad = &phi_grad * u_h_element;

        L2_squared += scale * (u_h - u.value(&mapped.x)).powi(2);
        energy_squared += scale * (u_h_grad - u.gradient(&mapped.x)).norm_squared();
    }
    Ok((L2_squared, energy_squared))
}

/// Estimates errors of a discrete solution over a whole mesh.
#[derive(Debug, Copy, Clone, Default)]
pub struct ErrorEstimator {
    parallel: bool,
}

impl ErrorEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether elements are processed in parallel. The result is identical either way.
    pub fn with_parallel(self, parallel: bool) -> Self {
        Self { parallel }
    }

    /// Estimates $\norm{u_h - u}_{L^2}$ and $\norm{\nabla (u_h - u)}_{L^2}$.
    ///
    /// The quadrature rule should be more accurate than the one used for assembly, otherwise the
    /// estimate is polluted by the quadrature error.
    pub fn estimate(
        &self,
        mesh: &Mesh,
        shape_functions: &ShapeFunctionSet,
        quadrature: &QuadratureRule,
        u_h: &DVector<f64>,
        u: &impl ExactSolution,
    ) -> Result<ErrorNorms, FemError> {
        if u_h.len() != mesh.num_nodes() {
            return Err(FemError::InvalidInput(format!(
                "solution has {} entries, but the mesh has {} nodes",
                u_h.len(),
                mesh.num_nodes()
            )));
        }
        if mesh.num_elements() > 0 && mesh.nodes_per_element() != shape_functions.num_nodes() {
            return Err(FemError::InvalidInput(format!(
                "mesh elements have {} nodes, but the shape functions have {}",
                mesh.nodes_per_element(),
                shape_functions.num_nodes()
            )));
        }

        let kind = shape_functions.kind();
        let tabulation = shape_functions.tabulate(quadrature)?;
        let element_errors = |element_index: usize| {
            let coords = mesh.element_coords(element_index);
            let u_h_element = DVector::from_iterator(
                coords.len(),
                mesh.connectivity()[element_index].iter().map(|&i| u_h[i]),
            );
            estimate_element_errors_squared(kind, &tabulation, &coords, &u_h_element, u)
                .map_err(|err| err.in_element(element_index))
        };

        let element_errors: Vec<(f64, f64)> = if self.parallel {
            (0..mesh.num_elements())
                .into_par_iter()
                .map(element_errors)
                .collect::<Result<_, _>>()?
        } else {
            (0..mesh.num_elements())
                .map(element_errors)
                .collect::<Result<_, _>>()?
        };

        // Summing in element order keeps the result independent of the thread count
        let (l2_squared, energy_squared) = element_errors
            .iter()
            .fold((0.0, 0.0), |(a, b), (da, db)| (a + da, b + db));

        Ok(ErrorNorms {
            l2: l2_squared.sqrt(),
            energy: energy_squared.sqrt(),
        })
    }
}

/// Estimates $\norm{u_h - u}_{L^2}$ and $\norm{\nabla (u_h - u)}_{L^2}$ over the whole mesh,
/// processing elements serially. See [`ErrorEstimator`] for parallel estimation.
pub fn estimate_errors(
    mesh: &Mesh,
    shape_functions: &ShapeFunctionSet,
    quadrature: &QuadratureRule,
    u_h: &DVector<f64>,
    u: &impl ExactSolution,
) -> Result<ErrorNorms, FemError> {
    ErrorEstimator::new().estimate(mesh, shape_functions, quadrature, u_h, u)
}

#[allow(non_snake_case)]
pub fn estimate_L2_error(
    mesh: &Mesh,
    shape_functions: &ShapeFunctionSet,
    quadrature: &QuadratureRule,
    u_h: &DVector<f64>,
    u: &impl ExactSolution,
) -> Result<f64, FemError> {
    Ok(estimate_errors(mesh, shape_functions, quadrature, u_h, u)?.l2)
}

/// Estimates the energy norm error $\norm{\nabla (u_h - u)}_{L^2}$, i.e. the $H^1$ seminorm.
pub fn estimate_energy_error(
    mesh: &Mesh,
    shape_functions: &ShapeFunctionSet,
    quadrature: &QuadratureRule,
    u_h: &DVector<f64>,
    u: &impl ExactSolution,
) -> Result<f64, FemError> {
    Ok(estimate_errors(mesh, shape_functions, quadrature, u_h, u)?.energy)
}
