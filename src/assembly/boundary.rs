//! Homogeneous Dirichlet boundary conditions.
use crate::assembly::global::GlobalSystem;
use crate::error::FemError;
use crate::mesh::{Mesh, SquareDomain};
use log::debug;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Imposes `u = 0` on the given nodes.
///
/// Rows and columns of constrained nodes are zeroed, their diagonal entries set to one and their
/// load entries set to zero. Eliminating the columns keeps the matrix symmetric, which is valid
/// because the prescribed values are zero. Applying the same conditions twice has no further
/// effect.
pub fn apply_homogeneous_dirichlet_bc(system: &mut GlobalSystem, nodes: &[usize]) -> Result<(), FemError> {
    let n = system.num_dofs();
    let mut is_constrained = vec![false; n];
    for &node in nodes {
        if node >= n {
            return Err(FemError::IndexOutOfRange { index: node, len: n });
        }
        is_constrained[node] = true;
    }

    let mut has_diagonal = vec![false; n];
    for (j, mut col) in system.stiffness_mut().col_iter_mut().enumerate() {
        let (rows, values) = col.rows_and_values_mut();
        for (&i, v) in rows.iter().zip(values.iter_mut()) {
            if is_constrained[i] || is_constrained[j] {
                if i == j {
                    *v = 1.0;
                    has_diagonal[j] = true;
                } else {
                    *v = 0.0;
                }
            }
        }
    }

    let missing_diagonals: Vec<_> = (0..n)
        .filter(|&i| is_constrained[i] && !has_diagonal[i])
        .collect();
    if !missing_diagonals.is_empty() {
        // The sparsity pattern has no slot for these entries, so rebuild the matrix
        let mut coo = CooMatrix::from(system.stiffness());
        for &i in &missing_diagonals {
            coo.push(i, i, 1.0);
        }
        *system.stiffness_mut() = CscMatrix::from(&coo);
    }

    let load = system.load_mut();
    for (i, &constrained) in is_constrained.iter().enumerate() {
        if constrained {
            load[i] = 0.0;
        }
    }

    Ok(())
}

/// Imposes `u = 0` on every mesh node on the boundary of the domain and returns those nodes.
pub fn apply_homogeneous_dirichlet_on_boundary(
    system: &mut GlobalSystem,
    mesh: &Mesh,
    domain: &SquareDomain,
) -> Result<Vec<usize>, FemError> {
    let boundary_nodes = mesh.boundary_nodes(domain);
    debug!(
        "Applying homogeneous Dirichlet conditions to {} of {} nodes",
        boundary_nodes.len(),
        mesh.num_nodes()
    );
    apply_homogeneous_dirichlet_bc(system, &boundary_nodes)?;
    Ok(boundary_nodes)
}
