//! Error types for operator construction and application.

use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors raised when constructing or applying a matrix-free operator.
///
/// Configuration and dimension errors are raised at construction time and
/// refuse to build the operator. Geometric errors abort the application call
/// in which they are detected; the output buffer then holds partial results
/// that must be discarded by the caller.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum OperatorError {
    /// No specialized kernel exists for the requested polynomial degree.
    UnsupportedDegree { degree: usize },
    /// A cell's geometric map is degenerate or inverted at some quadrature
    /// point.
    DegenerateCell {
        cell: usize,
        jacobian_determinant: f64,
    },
    /// A caller-provided buffer does not have the expected length.
    InvalidDimensions {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A dof map entry points outside the buffer it indexes into.
    IndexOutOfBounds {
        buffer: &'static str,
        index: usize,
        bound: usize,
    },
}

impl Display for OperatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDegree { degree } => {
                write!(
                    f,
                    "unsupported polynomial degree {degree}: only degrees 1 and 2 \
                     have specialized kernels"
                )
            }
            Self::DegenerateCell {
                cell,
                jacobian_determinant,
            } => {
                write!(
                    f,
                    "cell {cell} has a degenerate or inverted geometry \
                     (Jacobian determinant {jacobian_determinant:.3e})"
                )
            }
            Self::InvalidDimensions {
                buffer,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "buffer `{buffer}` has length {actual}, expected {expected}"
                )
            }
            Self::IndexOutOfBounds {
                buffer,
                index,
                bound,
            } => {
                write!(
                    f,
                    "buffer `{buffer}` references index {index}, which is out of \
                     bounds for a buffer of {bound} entries"
                )
            }
        }
    }
}

impl std::error::Error for OperatorError {}

/// Errors reported by the device telemetry collaborator.
///
/// Telemetry is purely observational: these errors are reported as status
/// and never abort the numerical path.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TelemetryError {
    /// The monitoring backend is not initialised (not compiled in, or the
    /// session was never opened successfully).
    NotInitialised,
    /// The monitoring backend reported a failure.
    Backend(String),
}

impl Display for TelemetryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialised => write!(f, "device monitoring backend is not initialised"),
            Self::Backend(message) => {
                write!(f, "device monitoring backend error: {message}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {}
