//! The matrix-free Laplace operator on hexahedral meshes.

use crate::assembly::global::{self, ApplyContext};
use crate::assembly::local::{trilinear_kernel, triquadratic_kernel, LaplaceKernel};
use crate::error::OperatorError;
use crate::geometry;
use gungnir_paradis::coloring::greedy_batch_coloring;
use gungnir_paradis::DisjointBatch;
use log::debug;
use serde::{Deserialize, Serialize};

/// The polynomial degrees for which a specialized kernel exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degree {
    One,
    Two,
}

impl Degree {
    /// Maps a plain polynomial degree to the kernel selector.
    ///
    /// Unrecognized degrees are an explicit construction-time error; there
    /// is no fallback degree.
    pub fn try_from_polynomial_degree(degree: usize) -> Result<Self, OperatorError> {
        match degree {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            _ => Err(OperatorError::UnsupportedDegree { degree }),
        }
    }

    /// Scalar dofs per hexahedral cell for this degree.
    pub fn dofs_per_cell(&self) -> usize {
        match self {
            Self::One => 8,
            Self::Two => 27,
        }
    }

    /// Gauss points per reference axis used by the kernel of this degree.
    pub fn quadrature_points_per_axis(&self) -> usize {
        match self {
            Self::One => 3,
            Self::Two => 4,
        }
    }
}

/// The selected kernel; each variant carries its own quadrature and basis
/// tables.
#[derive(Debug, Clone)]
enum KernelDispatch {
    Trilinear(LaplaceKernel<8>),
    Triquadratic(LaplaceKernel<27>),
}

/// A matrix-free operator evaluating the weak-form action of the negative
/// Laplacian, $v \mapsto -c \, \Delta_h v$, on a hexahedral mesh.
///
/// The operator never materializes a matrix: each application integrates the
/// action cell by cell and accumulates the cell contributions into the
/// output vector. Mesh topology and coordinates are borrowed from the
/// caller, which owns them for the lifetime of the operator.
#[derive(Debug)]
pub struct MatrixFreeLaplace<'a> {
    degree: Degree,
    kernel: KernelDispatch,
    num_cells: usize,
    num_dofs: usize,
    coefficient: f64,
    coordinates: &'a [f64],
    geometry_dofmap: &'a [usize],
    dofmap: &'a [usize],
    batches: Vec<DisjointBatch>,
}

impl<'a> MatrixFreeLaplace<'a> {
    /// Constructs the operator, selecting the kernel for the given
    /// polynomial degree.
    ///
    /// `constants[0]` is the uniform material coefficient. `coordinates`
    /// holds interleaved xyz vertex triplets, `geometry_dofmap` one row of 8
    /// vertex indices per cell, `dofmap` one row of `dofs_per_cell` global
    /// dof indices per cell (8 for degree 1, 27 for degree 2).
    ///
    /// Construction validates the degree and all buffer dimensions and
    /// colors the cells into conflict-free batches for the parallel driver.
    pub fn new(
        degree: usize,
        num_cells: usize,
        constants: &'a [f64],
        coordinates: &'a [f64],
        geometry_dofmap: &'a [usize],
        dofmap: &'a [usize],
    ) -> Result<Self, OperatorError> {
        let degree = Degree::try_from_polynomial_degree(degree)?;
        let dofs_per_cell = degree.dofs_per_cell();

        if constants.is_empty() {
            return Err(OperatorError::InvalidDimensions {
                buffer: "constants",
                expected: 1,
                actual: 0,
            });
        }
        if coordinates.len() % 3 != 0 {
            return Err(OperatorError::InvalidDimensions {
                buffer: "coordinates",
                expected: 3 * (coordinates.len() / 3 + 1),
                actual: coordinates.len(),
            });
        }
        if geometry_dofmap.len() != num_cells * geometry::VERTICES_PER_CELL {
            return Err(OperatorError::InvalidDimensions {
                buffer: "geometry_dofmap",
                expected: num_cells * geometry::VERTICES_PER_CELL,
                actual: geometry_dofmap.len(),
            });
        }
        if dofmap.len() != num_cells * dofs_per_cell {
            return Err(OperatorError::InvalidDimensions {
                buffer: "dofmap",
                expected: num_cells * dofs_per_cell,
                actual: dofmap.len(),
            });
        }

        let num_vertices = coordinates.len() / 3;
        for &vertex in geometry_dofmap {
            if vertex >= num_vertices {
                return Err(OperatorError::IndexOutOfBounds {
                    buffer: "geometry_dofmap",
                    index: vertex,
                    bound: num_vertices,
                });
            }
        }
        let num_dofs = dofmap.iter().max().map_or(0, |&max| max + 1);

        let kernel = match degree {
            Degree::One => {
                KernelDispatch::Trilinear(trilinear_kernel(degree.quadrature_points_per_axis()))
            }
            Degree::Two => KernelDispatch::Triquadratic(triquadratic_kernel(
                degree.quadrature_points_per_axis(),
            )),
        };

        let batches = greedy_batch_coloring(dofmap, dofs_per_cell);
        debug!(
            "constructed degree {degree:?} operator: {num_cells} cells, {num_dofs} dofs, \
             {} disjoint batches",
            batches.len()
        );

        Ok(Self {
            degree,
            kernel,
            num_cells,
            num_dofs,
            coefficient: constants[0],
            coordinates,
            geometry_dofmap,
            dofmap,
            batches,
        })
    }

    pub fn degree(&self) -> Degree {
        self.degree
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// One past the largest global dof index referenced by the dof map.
    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Number of conflict-free cell batches used by the parallel driver.
    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    /// Applies the operator to `input`, accumulating into `output`, with one
    /// parallel worker per cell.
    ///
    /// The caller must zero-initialize `output` beforehand; after a
    /// successful call it holds the accumulated operator action. On error
    /// the output contents are meaningless and must be discarded.
    pub fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<(), OperatorError> {
        self.validate_vectors(input, output)?;
        let ctx = self.context();
        match &self.kernel {
            KernelDispatch::Trilinear(kernel) => {
                global::apply_parallel(kernel, &ctx, &self.batches, input, output)
            }
            KernelDispatch::Triquadratic(kernel) => {
                global::apply_parallel(kernel, &ctx, &self.batches, input, output)
            }
        }
    }

    /// Applies the operator on the calling thread, cell by cell.
    ///
    /// Performs the same arithmetic as [`apply`](Self::apply); useful for
    /// small meshes and as a reference in tests.
    pub fn apply_sequential(&self, input: &[f64], output: &mut [f64]) -> Result<(), OperatorError> {
        self.validate_vectors(input, output)?;
        let ctx = self.context();
        match &self.kernel {
            KernelDispatch::Trilinear(kernel) => {
                global::apply_sequential(kernel, &ctx, input, output)
            }
            KernelDispatch::Triquadratic(kernel) => {
                global::apply_sequential(kernel, &ctx, input, output)
            }
        }
    }

    fn validate_vectors(&self, input: &[f64], output: &[f64]) -> Result<(), OperatorError> {
        if input.len() < self.num_dofs {
            return Err(OperatorError::InvalidDimensions {
                buffer: "input",
                expected: self.num_dofs,
                actual: input.len(),
            });
        }
        if output.len() < self.num_dofs {
            return Err(OperatorError::InvalidDimensions {
                buffer: "output",
                expected: self.num_dofs,
                actual: output.len(),
            });
        }
        Ok(())
    }

    fn context(&self) -> ApplyContext<'a> {
        ApplyContext {
            coordinates: self.coordinates,
            geometry_dofmap: self.geometry_dofmap,
            dofmap: self.dofmap,
            coefficient: self.coefficient,
            num_cells: self.num_cells,
        }
    }
}
