//! Sparse direct solution of the assembled system.
use crate::assembly::global::GlobalSystem;
use crate::error::FemError;
use log::debug;
use nalgebra::{DVector, Dyn, U1};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::CscMatrix;

/// Solves `K u = F` for a symmetric positive definite `K` with a sparse Cholesky factorization.
pub fn solve(matrix: &CscMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, FemError> {
    let n = matrix.nrows();
    if n == 0 {
        return Err(FemError::InvalidInput("cannot solve an empty system".to_string()));
    }
    if matrix.ncols() != n || rhs.len() != n {
        return Err(FemError::InvalidInput(format!(
            "incompatible system dimensions: {} x {} matrix, right-hand side of length {}",
            n,
            matrix.ncols(),
            rhs.len()
        )));
    }
    if rhs.iter().any(|v| !v.is_finite()) {
        return Err(FemError::InvalidInput("right-hand side is not finite".to_string()));
    }

    let cholesky = CscCholesky::factor(matrix)
        .map_err(|err| FemError::SolverFailure(format!("Cholesky factorization failed: {err}")))?;
    let solution = cholesky.solve(rhs).reshape_generic(Dyn(n), U1);

    if solution.iter().any(|v| !v.is_finite()) {
        return Err(FemError::SolverFailure("solution is not finite".to_string()));
    }
    Ok(solution)
}

/// Solves the global system and undoes any Jacobi scaling that was applied to it.
pub fn solve_system(system: &GlobalSystem) -> Result<DVector<f64>, FemError> {
    debug!("Solving linear system with {} unknowns", system.num_dofs());
    let y = solve(system.stiffness(), system.load())?;
    Ok(match system.scaling() {
        Some(scaling) => y.component_mul(scaling),
        None => y,
    })
}
