//! Assembly of the matrix-free operator action.
//!
//! The `local` module integrates the operator action over a single cell; the
//! `global` module gathers cell-local input from the global input vector and
//! scatters cell-local output back into the global output vector, either
//! sequentially or in parallel over conflict-free cell batches.

pub mod global;
pub mod local;
