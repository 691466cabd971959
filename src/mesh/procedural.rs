//! Basic procedural mesh generation routines.
use crate::element::{reference_nodes, ElementKind};
use crate::error::FemError;
use crate::mesh::{Mesh, SquareDomain};
use nalgebra::{Point2, Vector2};
use rustc_hash::FxHashMap;

/// Maximum deviation from an integer for a node to count as a lattice node.
const LATTICE_TOLERANCE: f64 = 1e-9;

pub fn create_unit_square_uniform_mesh(
    kind: ElementKind,
    order: usize,
    cells_per_dim: usize,
) -> Result<Mesh, FemError> {
    create_square_uniform_mesh(kind, order, &SquareDomain::unit(), cells_per_dim)
}

/// Generates a uniform mesh of `[0, size]^2` with `cells_per_dim` square cells per direction.
///
/// Triangle meshes are obtained by splitting each square cell along its anti-diagonal. Nodes
/// shared between neighboring elements are merged, so the resulting mesh is conforming.
pub fn create_square_uniform_mesh(
    kind: ElementKind,
    order: usize,
    domain: &SquareDomain,
    cells_per_dim: usize,
) -> Result<Mesh, FemError> {
    if cells_per_dim == 0 {
        return Err(FemError::InvalidInput(
            "number of cells per dimension must be positive".to_string(),
        ));
    }
    let reference_nodes = reference_nodes(kind, order)?;
    let mut builder = MeshBuilder {
        lattice_resolution: (cells_per_dim * order) as f64,
        cell_size: domain.size() / cells_per_dim as f64,
        order: order as f64,
        lattice_to_index: FxHashMap::default(),
        vertices: Vec::new(),
    };

    let mut connectivity = Vec::new();
    for j in 0..cells_per_dim {
        for i in 0..cells_per_dim {
            let cell = Vector2::new(i as f64, j as f64);
            match kind {
                ElementKind::Quadrilateral => {
                    let element: Vec<usize> = reference_nodes
                        .iter()
                        .map(|xi| builder.node(cell + (xi.coords + Vector2::repeat(1.0)) * 0.5, domain))
                        .collect();
                    connectivity.push(element);
                }
                ElementKind::Triangle => {
                    let lower = [cell, cell + Vector2::x(), cell + Vector2::y()];
                    let upper = [cell + Vector2::repeat(1.0), cell + Vector2::y(), cell + Vector2::x()];
                    for [v0, v1, v2] in [lower, upper] {
                        let element: Vec<usize> = reference_nodes
                            .iter()
                            .map(|xi| builder.node(v0 + (v1 - v0) * xi.x + (v2 - v0) * xi.y, domain))
                            .collect();
                        connectivity.push(element);
                    }
                }
            }
        }
    }

    Mesh::from_vertices_and_connectivity(builder.vertices, connectivity)
}

struct MeshBuilder {
    lattice_resolution: f64,
    cell_size: f64,
    order: f64,
    lattice_to_index: FxHashMap<(u64, u64), usize>,
    vertices: Vec<Point2<f64>>,
}

impl MeshBuilder {
    /// Returns the index of the node at the given position, measured in cell units.
    ///
    /// Nodes on the lattice with spacing `1 / order` are shared, all other nodes are unique
    /// to the element that creates them.
    fn node(&mut self, cell_coords: Vector2<f64>, domain: &SquareDomain) -> usize {
        let lattice = cell_coords * self.order;
        let rounded = lattice.map(f64::round);
        if (lattice - rounded).amax() < LATTICE_TOLERANCE {
            let key = (rounded.x as u64, rounded.y as u64);
            if let Some(&index) = self.lattice_to_index.get(&key) {
                return index;
            }
            // Computed from integers so that boundary nodes land exactly on the boundary
            let x = domain.size() * rounded / self.lattice_resolution;
            let index = self.push(Point2::from(x));
            self.lattice_to_index.insert(key, index);
            index
        } else {
            self.push(Point2::from(cell_coords * self.cell_size))
        }
    }

    fn push(&mut self, x: Point2<f64>) -> usize {
        self.vertices.push(x);
        self.vertices.len() - 1
    }
}
