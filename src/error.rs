//! Error types for dnnr

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using dnnr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dnnr operations
#[derive(Error, Debug)]
pub enum Error {
    /// CUDA context, stream, or library startup failure
    #[error("CUDA context error: {0}")]
    Context(String),

    /// Non-success status returned by a cuDNN call
    #[error("cuDNN error in {op}: {status}")]
    Cudnn {
        /// The native entry point that failed
        op: &'static str,
        /// The returned status, formatted
        status: String,
    },

    /// CUDA driver call failure (allocation, memcpy, memset)
    #[error("CUDA driver error in {op}: {status}")]
    Driver {
        /// The driver entry point that failed
        op: &'static str,
        /// The returned status, formatted
        status: String,
    },

    /// Invalid argument provided to an operation
    ///
    /// Raised synchronously, before any native call is issued.
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Why the argument is invalid
        reason: String,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Raw enumerant value not recognized by this binding
    #[error("Unrecognized {what} value {value}")]
    UnknownEnum {
        /// Which enumerant family was being decoded
        what: &'static str,
        /// The rejected raw value
        value: i32,
    },
}
