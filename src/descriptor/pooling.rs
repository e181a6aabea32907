//! Pooling descriptor: window geometry plus a pooling mode
//!
//! Reusable across many dispatches; construction validates the geometry
//! tuples before the native configure call.

use super::{reversed_i32, TensorDescriptor};
use crate::context::check_cudnn;
use crate::error::Result;
use crate::ops::PoolingMode;
use crate::shape::{Shape, MAX_NATIVE_RANK};
use crate::validate;
use cudarc::cudnn::sys::*;
use std::ptr::null_mut;

/// RAII wrapper for a cuDNN pooling descriptor
pub struct PoolingDescriptor {
    desc: cudnnPoolingDescriptor_t,
    nd: usize,
}

impl PoolingDescriptor {
    /// Create and configure a pooling descriptor.
    ///
    /// `window`, `padding`, and `stride` are per-spatial-dimension tuples in
    /// host (column-major) order and must have equal length; window and
    /// stride entries must be nonzero.
    pub fn new(
        mode: PoolingMode,
        window: &[usize],
        padding: &[usize],
        stride: &[usize],
    ) -> Result<Self> {
        validate::same_len(window, padding, "window", "padding")?;
        validate::same_len(window, stride, "window", "stride")?;
        validate::all_nonzero(window, "window")?;
        validate::all_nonzero(stride, "stride")?;

        let window = reversed_i32(window, "window")?;
        let padding = reversed_i32(padding, "padding")?;
        let stride = reversed_i32(stride, "stride")?;

        let mut desc = null_mut();
        check_cudnn(
            unsafe { cudnnCreatePoolingDescriptor(&mut desc) },
            "cudnnCreatePoolingDescriptor",
        )?;
        let pd = Self {
            desc,
            nd: window.len(),
        };
        check_cudnn(
            unsafe {
                cudnnSetPoolingNdDescriptor(
                    pd.desc,
                    mode.as_cudnn(),
                    cudnnNanPropagation_t::CUDNN_NOT_PROPAGATE_NAN,
                    window.len() as i32,
                    window.as_ptr(),
                    padding.as_ptr(),
                    stride.as_ptr(),
                )
            },
            "cudnnSetPoolingNdDescriptor",
        )?;
        Ok(pd)
    }

    /// Number of spatial dimensions the window covers
    #[inline]
    pub fn spatial_rank(&self) -> usize {
        self.nd
    }

    /// Query mode, window, padding, and stride back out, in host order
    pub fn read(&self) -> Result<(PoolingMode, Vec<usize>, Vec<usize>, Vec<usize>)> {
        let mut mode = cudnnPoolingMode_t::CUDNN_POOLING_MAX;
        let mut nan_opt = cudnnNanPropagation_t::CUDNN_NOT_PROPAGATE_NAN;
        let mut nb_dims = 0i32;
        let mut window = [0i32; MAX_NATIVE_RANK];
        let mut padding = [0i32; MAX_NATIVE_RANK];
        let mut stride = [0i32; MAX_NATIVE_RANK];
        check_cudnn(
            unsafe {
                cudnnGetPoolingNdDescriptor(
                    self.desc,
                    MAX_NATIVE_RANK as i32,
                    &mut mode,
                    &mut nan_opt,
                    &mut nb_dims,
                    window.as_mut_ptr(),
                    padding.as_mut_ptr(),
                    stride.as_mut_ptr(),
                )
            },
            "cudnnGetPoolingNdDescriptor",
        )?;
        let n = nb_dims as usize;
        let back = |native: &[i32]| native.iter().rev().map(|&v| v as usize).collect();
        Ok((
            PoolingMode::from_cudnn(mode)?,
            back(&window[..n]),
            back(&padding[..n]),
            back(&stride[..n]),
        ))
    }

    /// Forward output dimensions for an input descriptor, in host order
    pub fn output_dims(&self, input: &TensorDescriptor) -> Result<Shape> {
        let rank = self.nd + 2;
        let mut native = [0i32; MAX_NATIVE_RANK];
        check_cudnn(
            unsafe {
                cudnnGetPoolingNdForwardOutputDim(
                    self.desc,
                    input.raw(),
                    rank as i32,
                    native.as_mut_ptr(),
                )
            },
            "cudnnGetPoolingNdForwardOutputDim",
        )?;
        Ok(native[..rank].iter().rev().map(|&d| d as usize).collect())
    }

    /// Raw handle for native calls
    #[inline]
    pub(crate) fn raw(&self) -> cudnnPoolingDescriptor_t {
        self.desc
    }
}

impl Drop for PoolingDescriptor {
    fn drop(&mut self) {
        unsafe {
            let _ = cudnnDestroyPoolingDescriptor(self.desc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    // Geometry validation runs before any native call, so these pass with no
    // library present.
    #[test]
    fn test_rejects_mismatched_tuple_lengths() {
        let result = PoolingDescriptor::new(PoolingMode::Max, &[2, 2], &[0], &[2, 2]);
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));

        let result = PoolingDescriptor::new(PoolingMode::Max, &[2, 2], &[0, 0], &[2]);
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_rejects_zero_window_or_stride() {
        let result = PoolingDescriptor::new(PoolingMode::Max, &[2, 0], &[0, 0], &[2, 2]);
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));

        let result = PoolingDescriptor::new(PoolingMode::Max, &[2, 2], &[0, 0], &[0, 2]);
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }
}
