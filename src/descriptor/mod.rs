//! RAII wrappers around cuDNN descriptor handles
//!
//! Each wrapper allocates its native handle and configures it in one step (no
//! two-phase init). The wrapper is built around the handle *before* the
//! configure call, so a configuration failure still releases the handle
//! exactly once through `Drop`. Arguments are validated before the native
//! configure call; the library never sees a tuple-length or enumerant error.

mod activation;
mod convolution;
mod filter;
mod pooling;
mod tensor;

pub use activation::ActivationDescriptor;
pub use convolution::ConvolutionDescriptor;
pub use filter::FilterDescriptor;
pub use pooling::PoolingDescriptor;
pub use tensor::TensorDescriptor;

use crate::error::{Error, Result};
use crate::shape::MAX_NATIVE_RANK;
use smallvec::SmallVec;

/// Spatial tuples arrive in host (column-major) order; the native library
/// wants them row-major. Reverse and narrow to the native 32-bit type.
pub(crate) fn reversed_i32(
    values: &[usize],
    arg: &'static str,
) -> Result<SmallVec<[i32; MAX_NATIVE_RANK]>> {
    let mut out: SmallVec<[i32; MAX_NATIVE_RANK]> = SmallVec::with_capacity(values.len());
    for &value in values.iter().rev() {
        let value = i32::try_from(value).map_err(|_| Error::InvalidArgument {
            arg,
            reason: format!("{} does not fit the native 32-bit type", value),
        })?;
        out.push(value);
    }
    Ok(out)
}
