//! gungnir: matrix-free finite element operators on hexahedral meshes.
//!
//! The crate evaluates the action of a discretized Laplace-type operator on
//! an unstructured mesh of hexahedral elements without ever materializing
//! the operator matrix. Each application integrates the weak-form action
//! cell by cell, with on-the-fly geometric mapping, and accumulates the
//! per-cell contributions into a shared output vector. Cells are processed
//! in parallel; write conflicts on shared dofs are avoided by a coloring
//! pre-pass that partitions the cells into conflict-free batches (see the
//! `gungnir-paradis` crate).
//!
//! The main entry point is [`MatrixFreeLaplace`], which selects a
//! degree-specialized kernel at construction and exposes the operator as a
//! callable over flat vectors of degree-of-freedom values.

pub mod assembly;
pub mod basis;
pub mod error;
pub mod geometry;
pub mod operator;
pub mod procedural;
pub mod quadrature;
pub mod telemetry;

pub use error::{OperatorError, TelemetryError};
pub use operator::{Degree, MatrixFreeLaplace};

pub extern crate nalgebra;
