//! Unstructured meshes of Lagrange elements.
use crate::element::{polygon_area, ElementKind};
use crate::error::FemError;
use nalgebra::{distance, Point2};
use serde::{Deserialize, Serialize};

pub mod procedural;

/// The square domain `[0, size]^2`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareDomain {
    size: f64,
}

impl SquareDomain {
    pub fn new(size: f64) -> Result<Self, FemError> {
        if size.is_finite() && size > 0.0 {
            Ok(Self { size })
        } else {
            Err(FemError::InvalidInput(format!(
                "domain size must be positive and finite, got {size}"
            )))
        }
    }

    pub fn unit() -> Self {
        Self { size: 1.0 }
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// Tolerance used to decide whether a point lies on the boundary.
    pub fn boundary_tolerance(&self) -> f64 {
        1e-10 * self.size
    }

    /// Whether `x` lies on one of the four sides, up to [`Self::boundary_tolerance`].
    pub fn is_on_boundary(&self, x: &Point2<f64>) -> bool {
        let tol = self.boundary_tolerance();
        let near = |a: f64, b: f64| (a - b).abs() <= tol;
        near(x.x, 0.0) || near(x.x, self.size) || near(x.y, 0.0) || near(x.y, self.size)
    }
}

impl Default for SquareDomain {
    fn default() -> Self {
        Self::unit()
    }
}

/// A mesh given by node coordinates and, for each element, the indices of its nodes.
///
/// The node indices of an element follow the reference node ordering of the element kind:
/// corners first, then edge nodes, then interior nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<Point2<f64>>,
    connectivity: Vec<Vec<usize>>,
}

impl Mesh {
    /// Creates a mesh from zero-based connectivity.
    ///
    /// Every element must reference the same, non-zero number of valid vertex indices.
    pub fn from_vertices_and_connectivity(
        vertices: Vec<Point2<f64>>,
        connectivity: Vec<Vec<usize>>,
    ) -> Result<Self, FemError> {
        if let Some(x) = vertices.iter().find(|x| !x.x.is_finite() || !x.y.is_finite()) {
            return Err(FemError::InvalidInput(format!("vertex {x} is not finite")));
        }
        if let Some(first) = connectivity.first() {
            let nodes_per_element = first.len();
            if nodes_per_element == 0 {
                return Err(FemError::InvalidInput("elements must have nodes".to_string()));
            }
            for (element_index, element) in connectivity.iter().enumerate() {
                if element.len() != nodes_per_element {
                    return Err(FemError::InvalidInput(format!(
                        "element {element_index} has {} nodes, expected {nodes_per_element}",
                        element.len()
                    )));
                }
                if let Some(&index) = element.iter().find(|&&index| index >= vertices.len()) {
                    return Err(FemError::IndexOutOfRange {
                        index,
                        len: vertices.len(),
                    });
                }
            }
        }
        Ok(Self {
            vertices,
            connectivity,
        })
    }

    /// Creates a mesh from one-based connectivity, as produced by many mesh generators.
    pub fn from_one_based(
        vertices: Vec<Point2<f64>>,
        connectivity: Vec<Vec<usize>>,
    ) -> Result<Self, FemError> {
        let connectivity = connectivity
            .into_iter()
            .map(|element| {
                element
                    .into_iter()
                    .map(|index| {
                        index.checked_sub(1).ok_or_else(|| {
                            FemError::InvalidInput("one-based node index 0 in connectivity".to_string())
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_vertices_and_connectivity(vertices, connectivity)
    }

    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[Vec<usize>] {
        &self.connectivity
    }

    pub fn num_nodes(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    /// Number of nodes per element, or zero for a mesh without elements.
    pub fn nodes_per_element(&self) -> usize {
        self.connectivity.first().map(Vec::len).unwrap_or(0)
    }

    /// Collects the coordinates of the nodes of the given element into `coords`.
    ///
    /// # Panics
    ///
    /// Panics if the element index is out of bounds.
    pub fn populate_element_coords(&self, element_index: usize, coords: &mut Vec<Point2<f64>>) {
        coords.clear();
        coords.extend(
            self.connectivity[element_index]
                .iter()
                .map(|&index| self.vertices[index]),
        );
    }

    pub fn element_coords(&self, element_index: usize) -> Vec<Point2<f64>> {
        let mut coords = Vec::new();
        self.populate_element_coords(element_index, &mut coords);
        coords
    }

    /// Indices of all nodes on the boundary of the given domain, in ascending order.
    pub fn boundary_nodes(&self, domain: &SquareDomain) -> Vec<usize> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, x)| domain.is_on_boundary(x))
            .map(|(index, _)| index)
            .collect()
    }

    /// The largest distance between two corners of any element.
    pub fn mesh_size(&self, kind: ElementKind) -> f64 {
        let num_corners = kind.num_sides();
        self.connectivity
            .iter()
            .map(|element| {
                let corners = &element[..num_corners.min(element.len())];
                let mut diameter: f64 = 0.0;
                for (i, &a) in corners.iter().enumerate() {
                    for &b in &corners[i + 1..] {
                        diameter = diameter.max(distance(&self.vertices[a], &self.vertices[b]));
                    }
                }
                diameter
            })
            .fold(0.0, f64::max)
    }

    /// Mean area of the polygons spanned by element corners, or zero for an empty mesh.
    pub fn mean_element_area(&self, kind: ElementKind) -> f64 {
        if self.connectivity.is_empty() {
            return 0.0;
        }
        let num_corners = kind.num_sides();
        let total: f64 = self
            .connectivity
            .iter()
            .map(|element| {
                let corners: Vec<_> = element
                    .iter()
                    .take(num_corners)
                    .map(|&index| self.vertices[index])
                    .collect();
                polygon_area(&corners)
            })
            .sum();
        total / self.connectivity.len() as f64
    }
}
