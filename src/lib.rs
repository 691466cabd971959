//! A finite element solver for the Poisson equation `-Δu = f` on a square with homogeneous
//! Dirichlet boundary conditions.
//!
//! Triangles and quadrilaterals of arbitrary Lagrange order are supported, as long as the
//! reference nodes determine a unique basis. The pipeline is
//!
//! 1. build a [`ShapeFunctionSet`](element::ShapeFunctionSet) and a
//!    [`QuadratureRule`](quadrature::QuadratureRule) for the element,
//! 2. assemble the global system with [`GlobalAssembler`](assembly::global::GlobalAssembler),
//! 3. impose boundary conditions with [`assembly::boundary`],
//! 4. solve with a sparse Cholesky factorization ([`solve`]),
//! 5. measure the error against an exact solution ([`estimate`]).
//!
//! [`PoissonProblem`](problem::PoissonProblem) runs the whole pipeline for a mesh.
pub mod assembly;
pub mod element;
pub mod error;
pub mod estimate;
pub mod manufactured;
pub mod mesh;
pub mod problem;
pub mod quadrature;
pub mod solve;
pub mod study;

pub use error::FemError;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
