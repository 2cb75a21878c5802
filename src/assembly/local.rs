//! Per-cell integration of the operator action.

use crate::basis::{self, LineBasisTable};
use crate::geometry;
use crate::quadrature;
use itertools::izip;
use nalgebra::{SMatrix, SVector};

/// Raised by a kernel when a cell's geometric map is not invertible at some
/// quadrature point. The caller knows which cell it handed to the kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegenerateGeometry {
    pub jacobian_determinant: f64,
}

/// A degree-specialized integration kernel for the weak-form Laplace action.
///
/// `D` is the number of scalar dofs per cell (8 for the trilinear kernel, 27
/// for the triquadratic one). The kernel owns the quadrature weights and the
/// reference-space gradient tables of both the field basis and the trilinear
/// geometry basis, tabulated at every tensor quadrature point. All tables
/// are built once at operator construction and shared by all cells.
#[derive(Debug, Clone)]
pub struct LaplaceKernel<const D: usize> {
    quadrature_weights: Vec<f64>,
    field_gradients: Vec<SMatrix<f64, 3, D>>,
    geometry_gradients: Vec<SMatrix<f64, 3, 8>>,
}

/// The degree 1 kernel: trilinear field over trilinear geometry.
pub fn trilinear_kernel(points_per_axis: usize) -> LaplaceKernel<8> {
    let (weights, _) = quadrature::hexahedron_gauss(points_per_axis);
    quadrature::assert_weights_sum_to_volume(&weights, 1.0);

    let (_, points1d) = quadrature::unit_interval_gauss(points_per_axis);
    let line_table = basis::tabulate_linear(&points1d);
    LaplaceKernel {
        quadrature_weights: weights,
        field_gradients: tensor_gradient_tables::<2, 8>(&line_table),
        geometry_gradients: tensor_gradient_tables::<2, 8>(&line_table),
    }
}

/// The degree 2 kernel: triquadratic field over trilinear geometry.
pub fn triquadratic_kernel(points_per_axis: usize) -> LaplaceKernel<27> {
    let (weights, _) = quadrature::hexahedron_gauss(points_per_axis);
    quadrature::assert_weights_sum_to_volume(&weights, 1.0);

    let (_, points1d) = quadrature::unit_interval_gauss(points_per_axis);
    let field_table = basis::tabulate_quadratic(&points1d);
    let geometry_table = basis::tabulate_linear(&points1d);
    LaplaceKernel {
        quadrature_weights: weights,
        field_gradients: tensor_gradient_tables::<3, 27>(&field_table),
        geometry_gradients: tensor_gradient_tables::<2, 8>(&geometry_table),
    }
}

impl<const D: usize> LaplaceKernel<D> {
    pub fn dofs_per_cell(&self) -> usize {
        D
    }

    pub fn num_quadrature_points(&self) -> usize {
        self.quadrature_weights.len()
    }

    /// Integrates the weak-form Laplace action of `u_local` over one cell
    /// and accumulates it into `output`.
    ///
    /// At each quadrature point the reference-space derivatives of the
    /// interpolated field are pulled back to physical space through the
    /// Jacobian inverse, scaled by the material coefficient and by
    /// `weight * |det J|`, and contracted against the test function
    /// derivatives.
    pub fn accumulate_cell_action(
        &self,
        output: &mut SMatrix<f64, 1, D>,
        vertices: &SMatrix<f64, 3, 8>,
        u_local: &SVector<f64, D>,
        coefficient: f64,
    ) -> Result<(), DegenerateGeometry> {
        let quadrature = izip!(
            &self.quadrature_weights,
            &self.field_gradients,
            &self.geometry_gradients
        );
        for (&weight, field_gradients, geometry_gradients) in quadrature {
            let j = geometry::reference_jacobian(vertices, geometry_gradients);
            let (j_det, j_inv) =
                geometry::det_and_inverse(&j).ok_or_else(|| DegenerateGeometry {
                    jacobian_determinant: j.determinant(),
                })?;
            let j_inv_t = j_inv.transpose();

            // Reference-space directional derivatives of the field
            let u_grad_ref = field_gradients * u_local;
            // Physical gradient by the chain rule, scaled by the coefficient
            let g = (j_inv_t * u_grad_ref) * coefficient;

            // Contract against the test function derivatives. With G the
            // reference gradient table this is (g^T J^-T) G, which equals the
            // physical-space product of the flux with every test gradient.
            let g_t_j_inv_t = g.transpose() * j_inv_t;
            *output += (g_t_j_inv_t * field_gradients) * (weight * j_det.abs());
        }
        Ok(())
    }
}

/// Tensor-product gradient tables for an `N`-node univariate basis.
///
/// Returns one 3 x D matrix per tensor quadrature point, `D = N^3`, where
/// column `(i * N + j) * N + k` holds the reference-space gradient of the
/// basis function with per-axis nodes `(i, j, k)`: one axis differentiated,
/// the other two evaluated, cycled across the three rows.
fn tensor_gradient_tables<const N: usize, const D: usize>(
    table: &LineBasisTable<N>,
) -> Vec<SMatrix<f64, 3, D>> {
    assert_eq!(N * N * N, D);
    let n = table.num_points();
    let mut tables = Vec::with_capacity(n * n * n);
    for iq0 in 0..n {
        for iq1 in 0..n {
            for iq2 in 0..n {
                let (v0, d0) = (table.values(iq0), table.derivatives(iq0));
                let (v1, d1) = (table.values(iq1), table.derivatives(iq1));
                let (v2, d2) = (table.values(iq2), table.derivatives(iq2));
                tables.push(SMatrix::<f64, 3, D>::from_fn(|row, col| {
                    let (i, j, k) = (col / (N * N), (col / N) % N, col % N);
                    match row {
                        0 => d0[i] * v1[j] * v2[k],
                        1 => v0[i] * d1[j] * v2[k],
                        _ => v0[i] * v1[j] * d2[k],
                    }
                }));
            }
        }
    }
    tables
}
