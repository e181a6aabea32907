//! # dnnr
//!
//! **cuDNN-backed deep-learning primitives for column-major device tensors.**
//!
//! dnnr binds NVIDIA's cuDNN library — tensor transforms, activations,
//! softmax, pooling, convolution, and their gradients — onto dense
//! column-major GPU buffers. Every numerically significant operation runs
//! inside cuDNN; this crate's own job is the adapter work around it:
//!
//! - **Descriptor lifecycle**: RAII wrappers for tensor, filter, pooling,
//!   convolution, and activation descriptors, released exactly once on every
//!   exit path
//! - **Layout translation**: column-major dimension/stride tuples reconciled
//!   with cuDNN's fixed-rank row-major convention
//! - **Dispatch**: one method per native entry point, with explicit
//!   per-family configuration structs and in-place defaults
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dnnr::prelude::*;
//!
//! let client = CudnnClient::new(0)?;
//! let x = Tensor::from_slice(&client, &data, &[28, 28, 1, 64])?;
//!
//! // ReLU in place: the result lands in x's own buffer
//! client.activation_forward(&x, None, &ActivationConfig::default())?;
//!
//! // 2x2 max pooling into a freshly allocated output
//! let pool = PoolingDescriptor::new(PoolingMode::Max, &[2, 2], &[0, 0], &[2, 2])?;
//! let y = client.pooling_forward(&pool, &x, None, &PoolingConfig::default())?;
//! ```
//!
//! ## Design
//!
//! - Tensors are column-major (first dimension fastest), the convention of
//!   the BLAS ecosystem these buffers are shared with; cuDNN sees them
//!   through reversed, row-major descriptors
//! - There is no hidden global library handle: [`context::CudnnClient`] is
//!   constructed explicitly and passed to every operation
//! - Native calls either succeed or surface their status as an error; there
//!   are no retries and no partial-failure recovery
//! - Host memory is touched only for transfer; all working memory is
//!   device-resident, allocated stream-ordered

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod descriptor;
pub mod dtype;
pub mod error;
pub mod ops;
pub mod shape;
pub mod tensor;

mod validate;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::CudnnClient;
    pub use crate::descriptor::{
        ConvolutionDescriptor, FilterDescriptor, PoolingDescriptor, TensorDescriptor,
    };
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
    pub use crate::ops::{
        ActivationConfig, ActivationMode, AddConfig, AddMode, ConvBwdBiasConfig, ConvBwdDataConfig,
        ConvBwdFilterConfig, ConvFwdAlgo, ConvFwdConfig, ConvolutionMode, PoolingConfig,
        PoolingMode, SoftmaxAlgorithm, SoftmaxConfig, SoftmaxMode, TransformConfig, Workspace,
    };
    pub use crate::tensor::Tensor;
}
