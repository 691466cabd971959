//! Convergence studies on sequences of uniformly refined meshes.
use crate::element::ElementKind;
use crate::mesh::procedural::create_square_uniform_mesh;
use crate::problem::{PoissonConfig, PoissonProblem};
use eyre::{eyre, WrapErr};
use log::info;
use serde::{Deserialize, Serialize};

/// Observed errors of a sequence of refinement levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub element_name: String,
    pub order: usize,
    pub cells_per_dim: Vec<usize>,
    pub num_nodes: Vec<usize>,
    pub mesh_sizes: Vec<f64>,
    pub l2_errors: Vec<f64>,
    pub energy_errors: Vec<f64>,
}

impl ErrorSummary {
    pub fn l2_rates(&self) -> Vec<f64> {
        convergence_rates(&self.mesh_sizes, &self.l2_errors)
    }

    pub fn energy_rates(&self) -> Vec<f64> {
        convergence_rates(&self.mesh_sizes, &self.energy_errors)
    }
}

/// Observed orders of convergence `log(e_i / e_{i+1}) / log(h_i / h_{i+1})` between
/// consecutive levels.
pub fn convergence_rates(mesh_sizes: &[f64], errors: &[f64]) -> Vec<f64> {
    assert_eq!(mesh_sizes.len(), errors.len());
    mesh_sizes
        .windows(2)
        .zip(errors.windows(2))
        .map(|(h, e)| (e[0] / e[1]).ln() / (h[0] / h[1]).ln())
        .collect()
}

/// Solves the manufactured problem of a configuration on a sequence of uniform meshes.
#[derive(Debug, Clone)]
pub struct ConvergenceStudy {
    config: PoissonConfig,
    resolutions: Vec<usize>,
}

impl ConvergenceStudy {
    /// `resolutions` lists the number of cells per dimension of each level.
    pub fn new(config: PoissonConfig, resolutions: impl Into<Vec<usize>>) -> Self {
        Self {
            config,
            resolutions: resolutions.into(),
        }
    }

    pub fn config(&self) -> &PoissonConfig {
        &self.config
    }

    pub fn run(&self) -> eyre::Result<ErrorSummary> {
        if self.resolutions.is_empty() {
            return Err(eyre!("a convergence study needs at least one resolution"));
        }
        let kind = self.config.kind;
        let order = self.config.order;
        let problem = PoissonProblem::new(self.config.clone())
            .wrap_err_with(|| format!("failed to set up {kind} problem of order {order}"))?;

        let mut summary = ErrorSummary {
            element_name: element_name(kind, order),
            order,
            cells_per_dim: Vec::new(),
            num_nodes: Vec::new(),
            mesh_sizes: Vec::new(),
            l2_errors: Vec::new(),
            energy_errors: Vec::new(),
        };

        for &cells_per_dim in &self.resolutions {
            let mesh = create_square_uniform_mesh(kind, order, problem.domain(), cells_per_dim)
                .wrap_err_with(|| format!("failed to generate mesh with {cells_per_dim} cells per dimension"))?;
            let solution = problem
                .solve(&mesh)
                .wrap_err_with(|| format!("failed to solve on mesh with {cells_per_dim} cells per dimension"))?;
            let h = mesh.mesh_size(kind);
            info!(
                "{}: {} cells/dim, {} nodes, h = {:.4e}, L2 error = {:.4e}, energy error = {:.4e}",
                summary.element_name,
                cells_per_dim,
                mesh.num_nodes(),
                h,
                solution.l2_error,
                solution.energy_error
            );

            summary.cells_per_dim.push(cells_per_dim);
            summary.num_nodes.push(mesh.num_nodes());
            summary.mesh_sizes.push(h);
            summary.l2_errors.push(solution.l2_error);
            summary.energy_errors.push(solution.energy_error);
        }

        info!(
            "{}: L2 rates {:?}, energy rates {:?}",
            summary.element_name,
            summary.l2_rates(),
            summary.energy_rates()
        );
        Ok(summary)
    }
}

/// Runs one convergence study per element order, sharing every other setting.
pub fn compare_orders(
    base_config: &PoissonConfig,
    orders: &[usize],
    resolutions: &[usize],
) -> eyre::Result<Vec<ErrorSummary>> {
    orders
        .iter()
        .map(|&order| {
            let config = PoissonConfig {
                order,
                ..base_config.clone()
            };
            ConvergenceStudy::new(config, resolutions).run()
        })
        .collect()
}

/// A short name such as `Tri6` or `Quad8` identifying the element.
pub fn element_name(kind: ElementKind, order: usize) -> String {
    let prefix = match kind {
        ElementKind::Triangle => "Tri",
        ElementKind::Quadrilateral => "Quad",
    };
    match kind.nodes_per_element(order) {
        Ok(num_nodes) => format!("{prefix}{num_nodes}"),
        Err(_) => format!("{prefix}(order {order})"),
    }
}
