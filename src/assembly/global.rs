//! Gather/scatter between global and cell-local dof vectors, and the
//! application drivers.
//!
//! The parallel driver processes the colored cell batches one after another.
//! Within a batch no two cells share a global dof, so every worker scatters
//! its cell's contribution with plain unsynchronized writes through the
//! disjoint-access abstraction. Across batches the driver itself is the
//! barrier. The sequential driver performs the same arithmetic cell by cell
//! and serves as the reference path.

use crate::assembly::local::LaplaceKernel;
use crate::error::OperatorError;
use crate::geometry;
use gungnir_paradis::DisjointBatch;
use nalgebra::{SMatrix, SVector};
use rayon::iter::ParallelIterator;

/// Gathers `local[i] = global[indices[i]]`.
pub fn gather_global_to_local(global: &[f64], local: &mut [f64], indices: &[usize]) {
    assert_eq!(local.len(), indices.len());
    for (local_value, &index) in local.iter_mut().zip(indices) {
        *local_value = global[index];
    }
}

/// Adds `local[i]` into `global[indices[i]]`.
pub fn add_local_to_global(local: &[f64], global: &mut [f64], indices: &[usize]) {
    assert_eq!(local.len(), indices.len());
    for (&local_value, &index) in local.iter().zip(indices) {
        global[index] += local_value;
    }
}

/// Read-only view of the data one application works on.
pub(crate) struct ApplyContext<'a> {
    pub coordinates: &'a [f64],
    pub geometry_dofmap: &'a [usize],
    pub dofmap: &'a [usize],
    pub coefficient: f64,
    pub num_cells: usize,
}

/// Computes one cell's local operator action.
fn cell_action<const D: usize>(
    kernel: &LaplaceKernel<D>,
    ctx: &ApplyContext<'_>,
    cell: usize,
    dof_row: &[usize],
    input: &[f64],
) -> Result<SMatrix<f64, 1, D>, OperatorError> {
    let vertex_row = &ctx.geometry_dofmap
        [cell * geometry::VERTICES_PER_CELL..(cell + 1) * geometry::VERTICES_PER_CELL];
    let vertices = geometry::gather_cell_vertices(ctx.coordinates, vertex_row);

    let mut u_local = [0.0; D];
    gather_global_to_local(input, &mut u_local, dof_row);
    let u_local = SVector::<f64, D>::from_column_slice(&u_local);

    let mut local_output = SMatrix::<f64, 1, D>::zeros();
    kernel
        .accumulate_cell_action(&mut local_output, &vertices, &u_local, ctx.coefficient)
        .map_err(|degeneracy| OperatorError::DegenerateCell {
            cell,
            jacobian_determinant: degeneracy.jacobian_determinant,
        })?;
    Ok(local_output)
}

/// Applies the kernel to every cell in order, on the calling thread.
pub(crate) fn apply_sequential<const D: usize>(
    kernel: &LaplaceKernel<D>,
    ctx: &ApplyContext<'_>,
    input: &[f64],
    output: &mut [f64],
) -> Result<(), OperatorError> {
    for cell in 0..ctx.num_cells {
        let dof_row = &ctx.dofmap[cell * D..(cell + 1) * D];
        let local_output = cell_action(kernel, ctx, cell, dof_row, input)?;
        add_local_to_global(local_output.as_slice(), output, dof_row);
    }
    Ok(())
}

/// Applies the kernel with one rayon worker per cell, batch by batch.
///
/// Any worker failure aborts the application and is surfaced to the caller;
/// the output buffer then holds partial results and must be discarded.
pub(crate) fn apply_parallel<const D: usize>(
    kernel: &LaplaceKernel<D>,
    ctx: &ApplyContext<'_>,
    batches: &[DisjointBatch],
    input: &[f64],
    output: &mut [f64],
) -> Result<(), OperatorError> {
    for batch in batches {
        debug_assert_eq!(batch.stride(), D);
        batch
            .cells_par_iter(&mut *output)
            .map(|mut cell_access| -> Result<(), OperatorError> {
                let cell = cell_access.cell();
                let local_output =
                    cell_action(kernel, ctx, cell, cell_access.global_indices(), input)?;
                for (i, value) in local_output.iter().enumerate() {
                    *cell_access.get_mut(i) += *value;
                }
                Ok(())
            })
            .collect::<Result<(), OperatorError>>()?;
    }
    Ok(())
}
