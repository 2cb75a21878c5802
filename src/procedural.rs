//! Procedural generation of structured hexahedral meshes.
//!
//! Axis-aligned box meshes in the flat buffer layout the operator consumes.
//! Real applications obtain their meshes and dof maps from an external mesh
//! collaborator; these generators exist for tests, benchmarks and examples.

use crate::geometry::VERTICES_PER_CELL;
use crate::operator::Degree;

/// A structured box mesh of `nx * ny * nz` hexahedral cells with uniform
/// cell edge length.
///
/// Vertices lie on the tensor grid `(i h, j h, k h)`; the vertex with grid
/// indices `(i, j, k)` has global index `(i (ny + 1) + j)(nz + 1) + k`.
/// Within a cell, local vertex `4a + 2b + c` is the grid vertex offset by
/// `(a, b, c)`, matching the tensor ordering of the operator's basis tables.
#[derive(Debug, Clone)]
pub struct HexBoxMesh {
    cells_per_axis: [usize; 3],
    cell_size: f64,
    coordinates: Vec<f64>,
    geometry_dofmap: Vec<usize>,
}

impl HexBoxMesh {
    /// Builds a uniform box mesh with the given cells per axis and cell edge
    /// length.
    pub fn uniform(nx: usize, ny: usize, nz: usize, cell_size: f64) -> Self {
        assert!(nx > 0 && ny > 0 && nz > 0, "mesh must have at least one cell");
        assert!(cell_size > 0.0, "cell size must be positive");

        let mut coordinates = Vec::with_capacity(3 * (nx + 1) * (ny + 1) * (nz + 1));
        for i in 0..=nx {
            for j in 0..=ny {
                for k in 0..=nz {
                    coordinates.push(i as f64 * cell_size);
                    coordinates.push(j as f64 * cell_size);
                    coordinates.push(k as f64 * cell_size);
                }
            }
        }

        let vertex_index = |i: usize, j: usize, k: usize| (i * (ny + 1) + j) * (nz + 1) + k;
        let mut geometry_dofmap = Vec::with_capacity(VERTICES_PER_CELL * nx * ny * nz);
        for ci in 0..nx {
            for cj in 0..ny {
                for ck in 0..nz {
                    for a in 0..2 {
                        for b in 0..2 {
                            for c in 0..2 {
                                geometry_dofmap.push(vertex_index(ci + a, cj + b, ck + c));
                            }
                        }
                    }
                }
            }
        }

        Self {
            cells_per_axis: [nx, ny, nz],
            cell_size,
            coordinates,
            geometry_dofmap,
        }
    }

    pub fn num_cells(&self) -> usize {
        let [nx, ny, nz] = self.cells_per_axis;
        nx * ny * nz
    }

    pub fn num_vertices(&self) -> usize {
        self.coordinates.len() / 3
    }

    /// Interleaved xyz vertex coordinates.
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    /// One row of 8 vertex indices per cell.
    pub fn geometry_dofmap(&self) -> &[usize] {
        &self.geometry_dofmap
    }

    /// Number of scalar field dofs for the given degree.
    pub fn num_field_dofs(&self, degree: Degree) -> usize {
        let [nx, ny, nz] = self.cells_per_axis;
        match degree {
            Degree::One => (nx + 1) * (ny + 1) * (nz + 1),
            Degree::Two => (2 * nx + 1) * (2 * ny + 1) * (2 * nz + 1),
        }
    }

    /// Field dof map for the given degree, one row per cell.
    ///
    /// Degree 1 dofs coincide with the mesh vertices. Degree 2 dofs live on
    /// the once-refined tensor grid; the per-axis node order is
    /// endpoints-then-midpoint, matching the quadratic basis tables.
    pub fn field_dofmap(&self, degree: Degree) -> Vec<usize> {
        let [nx, ny, nz] = self.cells_per_axis;
        match degree {
            Degree::One => self.geometry_dofmap.clone(),
            Degree::Two => {
                // Per-axis fine grid offsets of the nodes (0, 1, 1/2)
                const NODE_OFFSETS: [usize; 3] = [0, 2, 1];
                let fine_index =
                    |i: usize, j: usize, k: usize| (i * (2 * ny + 1) + j) * (2 * nz + 1) + k;

                let mut dofmap = Vec::with_capacity(27 * self.num_cells());
                for ci in 0..nx {
                    for cj in 0..ny {
                        for ck in 0..nz {
                            for &oa in &NODE_OFFSETS {
                                for &ob in &NODE_OFFSETS {
                                    for &oc in &NODE_OFFSETS {
                                        dofmap.push(fine_index(
                                            2 * ci + oa,
                                            2 * cj + ob,
                                            2 * ck + oc,
                                        ));
                                    }
                                }
                            }
                        }
                    }
                }
                dofmap
            }
        }
    }

    /// Physical coordinates of every field dof, interleaved xyz.
    ///
    /// Useful for sampling analytic fields at the dofs.
    pub fn field_dof_coordinates(&self, degree: Degree) -> Vec<f64> {
        let [nx, ny, nz] = self.cells_per_axis;
        match degree {
            Degree::One => self.coordinates.clone(),
            Degree::Two => {
                let h = 0.5 * self.cell_size;
                let mut coordinates = Vec::with_capacity(3 * self.num_field_dofs(degree));
                for i in 0..=2 * nx {
                    for j in 0..=2 * ny {
                        for k in 0..=2 * nz {
                            coordinates.push(i as f64 * h);
                            coordinates.push(j as f64 * h);
                            coordinates.push(k as f64 * h);
                        }
                    }
                }
                coordinates
            }
        }
    }
}
