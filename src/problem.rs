//! The Poisson problem driver: assembly, boundary conditions, solve and error estimation.
use crate::assembly::boundary::apply_homogeneous_dirichlet_on_boundary;
use crate::assembly::global::{GlobalAssembler, SingularityPolicy, SingularityReport};
use crate::assembly::local::{ElementAssembler, SourceFunction};
use crate::element::{ElementKind, ShapeFunctionSet};
use crate::error::FemError;
use crate::estimate::{ErrorEstimator, ErrorNorms, ExactSolution};
use crate::manufactured::{SinusoidalSolution, SinusoidalSource};
use crate::mesh::{Mesh, SquareDomain};
use crate::quadrature::QuadratureRule;
use crate::solve::solve_system;
use log::{debug, warn};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Configuration of a [`PoissonProblem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoissonConfig {
    pub kind: ElementKind,
    pub order: usize,
    /// Quadrature order for assembly, in the sense of [`QuadratureRule::new`]. Chosen from the
    /// element order if absent.
    pub assembly_quadrature_order: Option<usize>,
    /// Quadrature order for error estimation. Chosen from the element order if absent.
    pub error_quadrature_order: Option<usize>,
    pub domain_size: f64,
    pub singularity_policy: SingularityPolicy,
    pub parallel: bool,
}

impl Default for PoissonConfig {
    fn default() -> Self {
        Self {
            kind: ElementKind::Triangle,
            order: 1,
            assembly_quadrature_order: None,
            error_quadrature_order: None,
            domain_size: 1.0,
            singularity_policy: SingularityPolicy::default(),
            parallel: true,
        }
    }
}

impl PoissonConfig {
    pub fn new(kind: ElementKind, order: usize) -> Self {
        Self {
            kind,
            order,
            ..Self::default()
        }
    }
}

/// The result of solving a Poisson problem.
#[derive(Debug, Clone, PartialEq)]
pub struct PoissonSolution {
    /// Nodal values of the discrete solution.
    pub u_h: DVector<f64>,
    pub l2_error: f64,
    pub energy_error: f64,
    pub boundary_nodes: Vec<usize>,
    pub singularity: SingularityReport,
}

impl PoissonSolution {
    pub fn errors(&self) -> ErrorNorms {
        ErrorNorms {
            l2: self.l2_error,
            energy: self.energy_error,
        }
    }
}

/// The Poisson problem `-Δu = f` on a square with `u = 0` on the boundary.
///
/// Shape functions and quadrature rules are built once and reused for every mesh.
#[derive(Debug, Clone)]
pub struct PoissonProblem {
    config: PoissonConfig,
    domain: SquareDomain,
    shape_functions: ShapeFunctionSet,
    assembly_quadrature: QuadratureRule,
    error_quadrature: QuadratureRule,
}

impl PoissonProblem {
    pub fn new(config: PoissonConfig) -> Result<Self, FemError> {
        let kind = config.kind;
        let shape_functions = ShapeFunctionSet::new(kind, config.order)?;
        let assembly_quadrature = match config.assembly_quadrature_order {
            Some(order) => QuadratureRule::new(kind, order)?,
            None => QuadratureRule::default_for_assembly(kind, config.order)?,
        };
        let error_quadrature = match config.error_quadrature_order {
            Some(order) => QuadratureRule::new(kind, order)?,
            None => QuadratureRule::default_for_error_estimation(kind, config.order)?,
        };
        let domain = SquareDomain::new(config.domain_size)?;
        // Gradient products of order p basis functions have degree 2 (p - 1) on affine cells
        let stiffness_degree = config.order.saturating_sub(1).saturating_mul(2);
        if assembly_quadrature.degree_of_exactness() < stiffness_degree {
            warn!(
                "Assembly quadrature of degree {} does not integrate the stiffness of order {} elements exactly (degree {})",
                assembly_quadrature.degree_of_exactness(),
                config.order,
                stiffness_degree
            );
        }
        debug!(
            "Configured {} elements of order {} ({} nodes), quadrature with {} / {} points",
            kind,
            config.order,
            shape_functions.num_nodes(),
            assembly_quadrature.len(),
            error_quadrature.len()
        );
        Ok(Self {
            config,
            domain,
            shape_functions,
            assembly_quadrature,
            error_quadrature,
        })
    }

    pub fn config(&self) -> &PoissonConfig {
        &self.config
    }

    pub fn domain(&self) -> &SquareDomain {
        &self.domain
    }

    pub fn shape_functions(&self) -> &ShapeFunctionSet {
        &self.shape_functions
    }

    pub fn assembly_quadrature(&self) -> &QuadratureRule {
        &self.assembly_quadrature
    }

    pub fn error_quadrature(&self) -> &QuadratureRule {
        &self.error_quadrature
    }

    fn global_assembler(&self) -> GlobalAssembler {
        GlobalAssembler::new()
            .with_parallel(self.config.parallel)
            .with_singularity_policy(self.config.singularity_policy)
    }

    /// Solves the problem with the manufactured source and measures the error against the
    /// manufactured solution.
    pub fn solve(&self, mesh: &Mesh) -> Result<PoissonSolution, FemError> {
        self.solve_with(
            mesh,
            &SinusoidalSource::on(&self.domain),
            &SinusoidalSolution::on(&self.domain),
        )
    }

    /// Solves the problem with the given source and measures the error against `exact`.
    pub fn solve_with<Source, Exact>(
        &self,
        mesh: &Mesh,
        source: &Source,
        exact: &Exact,
    ) -> Result<PoissonSolution, FemError>
    where
        Source: SourceFunction,
        Exact: ExactSolution,
    {
        let (u_h, boundary_nodes, singularity) = self.solve_for_source(mesh, source)?;
        let errors = ErrorEstimator::new().with_parallel(self.config.parallel).estimate(
            mesh,
            &self.shape_functions,
            &self.error_quadrature,
            &u_h,
            exact,
        )?;
        Ok(PoissonSolution {
            u_h,
            l2_error: errors.l2,
            energy_error: errors.energy,
            boundary_nodes,
            singularity,
        })
    }

    /// Computes the discrete solution for the given source, without error estimation.
    ///
    /// Returns the nodal values, the constrained boundary nodes and the outcome of the
    /// singularity check.
    pub fn solve_for_source<Source: SourceFunction>(
        &self,
        mesh: &Mesh,
        source: &Source,
    ) -> Result<(DVector<f64>, Vec<usize>, SingularityReport), FemError> {
        let element_assembler = ElementAssembler::new(&self.shape_functions, &self.assembly_quadrature, source)?;
        let global_assembler = self.global_assembler();

        let mut system = global_assembler.assemble(mesh, &element_assembler)?;
        let boundary_nodes = apply_homogeneous_dirichlet_on_boundary(&mut system, mesh, &self.domain)?;
        let singularity = global_assembler.check_singularity(&mut system)?;
        let u_h = solve_system(&system)?;
        Ok((u_h, boundary_nodes, singularity))
    }
}

/// The nodal interpolant of `u` on the given mesh.
pub fn interpolate(mesh: &Mesh, u: &impl ExactSolution) -> DVector<f64> {
    DVector::from_iterator(mesh.num_nodes(), mesh.vertices().iter().map(|x| u.value(x)))
}
