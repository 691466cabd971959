//! Global assembly and the rank-deficiency safeguards applied before solving.
use crate::assembly::local::{ElementAssembler, ElementLocalSystem, SourceFunction};
use crate::error::FemError;
use crate::mesh::Mesh;
use log::{debug, warn};
use nalgebra::DVector;
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Magnitude of the diagonal shift used to regularize rank deficient systems.
pub const REGULARIZATION: f64 = 1e-6;

/// Relative size of the smallest squared Cholesky pivot below which a matrix is treated as rank
/// deficient.
pub const PIVOT_TOLERANCE: f64 = 1e-12;

/// A global stiffness matrix together with its load vector.
///
/// If the system has been Jacobi scaled, the scaling `S` is stored alongside so that the
/// solution of the scaled system `y` can be mapped back to `u = S y`.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSystem {
    stiffness: CscMatrix<f64>,
    load: DVector<f64>,
    scaling: Option<DVector<f64>>,
}

impl GlobalSystem {
    pub fn new(stiffness: CscMatrix<f64>, load: DVector<f64>) -> Result<Self, FemError> {
        if stiffness.nrows() != stiffness.ncols() {
            return Err(FemError::InvalidInput(format!(
                "stiffness matrix must be square, got {} x {}",
                stiffness.nrows(),
                stiffness.ncols()
            )));
        }
        if stiffness.nrows() != load.len() {
            return Err(FemError::InvalidInput(format!(
                "load vector of length {} does not match stiffness matrix of size {}",
                load.len(),
                stiffness.nrows()
            )));
        }
        Ok(Self {
            stiffness,
            load,
            scaling: None,
        })
    }

    pub fn num_dofs(&self) -> usize {
        self.load.len()
    }

    pub fn stiffness(&self) -> &CscMatrix<f64> {
        &self.stiffness
    }

    pub fn load(&self) -> &DVector<f64> {
        &self.load
    }

    /// Diagonal scaling applied to the system, if any.
    pub fn scaling(&self) -> Option<&DVector<f64>> {
        self.scaling.as_ref()
    }

    pub(crate) fn stiffness_mut(&mut self) -> &mut CscMatrix<f64> {
        &mut self.stiffness
    }

    pub(crate) fn load_mut(&mut self) -> &mut DVector<f64> {
        &mut self.load
    }

    pub fn into_parts(self) -> (CscMatrix<f64>, DVector<f64>, Option<DVector<f64>>) {
        (self.stiffness, self.load, self.scaling)
    }

    /// Adds `shift` to every diagonal entry of the stiffness matrix.
    pub fn shift_diagonal(&mut self, shift: f64) {
        let n = self.num_dofs();
        let mut coo = CooMatrix::from(&self.stiffness);
        for i in 0..n {
            coo.push(i, i, shift);
        }
        self.stiffness = CscMatrix::from(&coo);
    }

    /// Symmetrically scales the system by `S = diag(|K_ii|^{-1/2})`, replacing `K` by `S K S`
    /// and `F` by `S F`. Rows with a zero diagonal are left unscaled.
    pub fn apply_jacobi_scaling(&mut self) {
        let s = diagonal(&self.stiffness).map(|d| if d != 0.0 { 1.0 / d.abs().sqrt() } else { 1.0 });

        for (j, mut col) in self.stiffness.col_iter_mut().enumerate() {
            let (rows, values) = col.rows_and_values_mut();
            for (&i, v) in rows.iter().zip(values.iter_mut()) {
                *v *= s[i] * s[j];
            }
        }
        self.load.component_mul_assign(&s);

        self.scaling = Some(match self.scaling.take() {
            Some(previous) => previous.component_mul(&s),
            None => s,
        });
    }
}

/// Returns the diagonal of a square sparse matrix, with zeros for missing entries.
pub fn diagonal(matrix: &CscMatrix<f64>) -> DVector<f64> {
    let mut diag = DVector::zeros(matrix.nrows().min(matrix.ncols()));
    for (i, j, &v) in matrix.triplet_iter() {
        if i == j {
            diag[i] += v;
        }
    }
    diag
}

/// Decides whether a symmetric matrix is numerically rank deficient.
///
/// The matrix is considered deficient if its Cholesky factorization fails, or if the smallest
/// squared pivot is tiny compared to the largest diagonal entry.
pub fn is_rank_deficient(matrix: &CscMatrix<f64>) -> bool {
    if matrix.nrows() == 0 {
        return false;
    }
    let max_diagonal = diagonal(matrix).amax();
    if !(max_diagonal > 0.0) {
        return true;
    }
    match CscCholesky::factor(matrix) {
        Err(_) => true,
        Ok(cholesky) => {
            let l = cholesky.l();
            let min_pivot_squared = diagonal(l)
                .iter()
                .map(|l_ii| l_ii * l_ii)
                .fold(f64::INFINITY, f64::min);
            !(min_pivot_squared >= PIVOT_TOLERANCE * max_diagonal)
        }
    }
}

/// How to react to a rank deficient system.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingularityPolicy {
    /// Regularize and rescale the system, and continue with a warning if it remains deficient.
    #[default]
    Lenient,
    /// Fail with [`FemError::SingularSystem`].
    Strict,
}

/// The outcome of [`GlobalAssembler::check_singularity`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SingularityReport {
    pub rank_deficient: bool,
    pub regularized: bool,
    pub jacobi_scaled: bool,
    /// Whether the system was still rank deficient after all mitigation steps.
    pub unresolved: bool,
}

/// Assembles the global system from element contributions.
#[derive(Debug, Copy, Clone, Default)]
pub struct GlobalAssembler {
    parallel: bool,
    singularity_policy: SingularityPolicy,
}

impl GlobalAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether element systems are computed in parallel. The result is identical either way.
    pub fn with_parallel(self, parallel: bool) -> Self {
        Self { parallel, ..self }
    }

    pub fn with_singularity_policy(self, singularity_policy: SingularityPolicy) -> Self {
        Self {
            singularity_policy,
            ..self
        }
    }

    pub fn singularity_policy(&self) -> SingularityPolicy {
        self.singularity_policy
    }

    /// Assembles `K` and `F` by summing element contributions over the mesh.
    pub fn assemble<Source: SourceFunction>(
        &self,
        mesh: &Mesh,
        element_assembler: &ElementAssembler<Source>,
    ) -> Result<GlobalSystem, FemError> {
        if mesh.num_elements() == 0 {
            return Err(FemError::InvalidInput("mesh has no elements".to_string()));
        }
        if mesh.nodes_per_element() != element_assembler.num_element_nodes() {
            return Err(FemError::InvalidInput(format!(
                "mesh elements have {} nodes, but the {} element requires {}",
                mesh.nodes_per_element(),
                element_assembler.kind(),
                element_assembler.num_element_nodes()
            )));
        }

        debug!(
            "Assembling global system: {} elements, {} nodes, parallel = {}",
            mesh.num_elements(),
            mesh.num_nodes(),
            self.parallel
        );

        let assemble_element = |element_index: usize| {
            let coords = mesh.element_coords(element_index);
            element_assembler
                .assemble_element(&coords)
                .map_err(|err| err.in_element(element_index))
        };

        let local_systems: Vec<ElementLocalSystem> = if self.parallel {
            (0..mesh.num_elements())
                .into_par_iter()
                .map(assemble_element)
                .collect::<Result<_, _>>()?
        } else {
            (0..mesh.num_elements())
                .map(assemble_element)
                .collect::<Result<_, _>>()?
        };

        // Scatter serially so that the summation order does not depend on the thread count
        let n = mesh.num_nodes();
        let mut coo = CooMatrix::new(n, n);
        let mut load = DVector::zeros(n);
        for (element_nodes, local) in mesh.connectivity().iter().zip(&local_systems) {
            for (a, &i) in element_nodes.iter().enumerate() {
                load[i] += local.load[a];
                for (b, &j) in element_nodes.iter().enumerate() {
                    coo.push(i, j, local.stiffness[(a, b)]);
                }
            }
        }

        let stiffness = CscMatrix::from(&coo);
        debug!("Assembled stiffness matrix with {} non-zeros", stiffness.nnz());
        GlobalSystem::new(stiffness, load)
    }

    /// Detects rank deficiency of the system and mitigates it according to the policy.
    ///
    /// Under [`SingularityPolicy::Lenient`], a deficient system is first shifted by
    /// [`REGULARIZATION`] times the identity, then Jacobi scaled. If it is still deficient, a
    /// warning is logged and the system is left as is.
    pub fn check_singularity(&self, system: &mut GlobalSystem) -> Result<SingularityReport, FemError> {
        let mut report = SingularityReport::default();
        if !is_rank_deficient(system.stiffness()) {
            return Ok(report);
        }
        report.rank_deficient = true;

        if self.singularity_policy == SingularityPolicy::Strict {
            return Err(FemError::SingularSystem {
                size: system.num_dofs(),
            });
        }

        warn!(
            "Stiffness matrix is rank deficient, adding {:e} to the diagonal",
            REGULARIZATION
        );
        system.shift_diagonal(REGULARIZATION);
        report.regularized = true;
        if !is_rank_deficient(system.stiffness()) {
            return Ok(report);
        }

        warn!("Stiffness matrix is still rank deficient after regularization, applying Jacobi scaling");
        system.apply_jacobi_scaling();
        report.jacobi_scaled = true;
        if is_rank_deficient(system.stiffness()) {
            warn!("Stiffness matrix remains rank deficient, the solution may be inaccurate");
            report.unresolved = true;
        }

        Ok(report)
    }
}
