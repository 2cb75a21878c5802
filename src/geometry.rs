//! Geometric mapping between the reference cell and physical cells.
//!
//! A hexahedral cell is the image of the reference cube $[0, 1]^3$ under the
//! trilinear interpolation of its 8 vertices. The Jacobian of that map and
//! its determinant and inverse are what the integration kernel needs at each
//! quadrature point.

use nalgebra::{Matrix3, SMatrix};

/// Vertices of a hexahedral cell.
pub const VERTICES_PER_CELL: usize = 8;

/// Determinants at or below this value are treated as geometric
/// degeneracies.
pub const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// Gathers a cell's vertex coordinates into a 3x8 matrix, one column per
/// vertex.
///
/// `vertex_indices` is the cell's row of the geometry dof map and
/// `coordinates` the flat buffer of interleaved xyz triplets.
pub fn gather_cell_vertices(coordinates: &[f64], vertex_indices: &[usize]) -> SMatrix<f64, 3, 8> {
    assert_eq!(vertex_indices.len(), VERTICES_PER_CELL);
    SMatrix::<f64, 3, 8>::from_fn(|i, j| coordinates[3 * vertex_indices[j] + i])
}

/// The Jacobian of the reference-to-physical map at a quadrature point.
///
/// `geometry_gradients` holds the reference-space gradients of the 8
/// trilinear geometry basis functions at the point, one column per vertex,
/// so that $J = X G^T$ with $X$ the vertex matrix.
pub fn reference_jacobian(
    vertices: &SMatrix<f64, 3, 8>,
    geometry_gradients: &SMatrix<f64, 3, 8>,
) -> Matrix3<f64> {
    vertices * geometry_gradients.transpose()
}

/// Determinant and inverse of a cell Jacobian.
///
/// Returns `None` when the determinant is negative or no larger than
/// [`DEGENERACY_TOLERANCE`]: the cell is degenerate (zero volume) or
/// inverted, and dividing by the determinant would propagate infinities or
/// NaNs into the output.
pub fn det_and_inverse(jacobian: &Matrix3<f64>) -> Option<(f64, Matrix3<f64>)> {
    let det = jacobian.determinant();
    if det <= DEGENERACY_TOLERANCE {
        return None;
    }
    let inverse = jacobian.try_inverse()?;
    Some((det, inverse))
}
