//! Assembly of element and global systems for the Poisson equation `-Δu = f`.
pub mod boundary;
pub mod global;
pub mod local;
