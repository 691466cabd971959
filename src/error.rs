//! The error taxonomy shared by every stage of the solver pipeline.
use crate::element::ElementKind;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FemError {
    /// Malformed arguments, such as dimension mismatches or empty meshes.
    InvalidInput(String),
    /// No quadrature table exists for the requested order.
    UnsupportedQuadratureOrder { kind: ElementKind, order: usize },
    /// A polynomial or quadrature order that is not a positive integer.
    InvalidOrder(usize),
    /// A quadrature rule whose weights do not sum to the reference cell area.
    InvalidQuadratureRule {
        kind: ElementKind,
        weight_sum: f64,
        expected: f64,
    },
    /// The reference nodes do not determine a unique Lagrange basis.
    DegenerateShapeFunction { kind: ElementKind, num_nodes: usize },
    /// The isoparametric map is singular (or not finite) at a quadrature point.
    SingularJacobian { element: Option<usize>, determinant: f64 },
    /// The global stiffness matrix is rank deficient.
    SingularSystem { size: usize },
    /// A node index outside `[0, len)`.
    IndexOutOfRange { index: usize, len: usize },
    /// The sparse direct solver could not factor the system.
    SolverFailure(String),
}

impl FemError {
    /// Attaches the index of the element that was being processed, if not already known.
    pub fn in_element(self, element_index: usize) -> Self {
        match self {
            Self::SingularJacobian {
                element: None,
                determinant,
            } => Self::SingularJacobian {
                element: Some(element_index),
                determinant,
            },
            other => other,
        }
    }

    pub(crate) fn from_quadrature(kind: ElementKind, error: poisson2d_quadrature::Error) -> Self {
        use poisson2d_quadrature::Error;
        match error {
            Error::InvalidOrder(order) => Self::InvalidOrder(order),
            Error::NoRuleAvailable { order } => Self::UnsupportedQuadratureOrder { kind, order },
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

impl Display for FemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
            Self::UnsupportedQuadratureOrder { kind, order } => {
                write!(f, "No {kind} quadrature rule of order {order} is available")
            }
            Self::InvalidOrder(order) => write!(f, "Order must be a positive integer, got {order}"),
            Self::InvalidQuadratureRule {
                kind,
                weight_sum,
                expected,
            } => write!(
                f,
                "Weights of {kind} quadrature rule sum to {weight_sum}, expected the reference area {expected}"
            ),
            Self::DegenerateShapeFunction { kind, num_nodes } => write!(
                f,
                "Reference nodes of the {num_nodes}-node {kind} element do not determine a Lagrange basis"
            ),
            Self::SingularJacobian {
                element: Some(element),
                determinant,
            } => write!(
                f,
                "Singular Jacobian (det = {determinant:e}) in element {element}"
            ),
            Self::SingularJacobian {
                element: None,
                determinant,
            } => write!(f, "Singular Jacobian (det = {determinant:e})"),
            Self::SingularSystem { size } => {
                write!(f, "Stiffness matrix of size {size} x {size} is rank deficient")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Node index {index} is out of range for {len} nodes")
            }
            Self::SolverFailure(message) => write!(f, "Failed to solve linear system: {message}"),
        }
    }
}

impl std::error::Error for FemError {}
