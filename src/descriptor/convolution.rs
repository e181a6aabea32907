//! Convolution descriptor: padding, stride, upscale (dilation), mode

use super::{reversed_i32, FilterDescriptor, TensorDescriptor};
use crate::context::check_cudnn;
use crate::dtype::DType;
use crate::error::Result;
use crate::ops::ConvolutionMode;
use crate::shape::{Shape, MAX_NATIVE_RANK};
use crate::validate;
use cudarc::cudnn::sys::*;
use std::ptr::null_mut;

/// RAII wrapper for a cuDNN convolution descriptor
///
/// Reusable across many dispatches. The compute dtype follows the operand
/// dtype, with half-precision operands computing in F32 (see
/// [`DType::compute_dtype`]).
pub struct ConvolutionDescriptor {
    desc: cudnnConvolutionDescriptor_t,
    nd: usize,
}

impl ConvolutionDescriptor {
    /// Create and configure a convolution descriptor.
    ///
    /// `padding`, `stride`, and `upscale` are per-spatial-dimension tuples in
    /// host (column-major) order and must have equal length; stride and
    /// upscale entries must be nonzero.
    pub fn new(
        mode: ConvolutionMode,
        padding: &[usize],
        stride: &[usize],
        upscale: &[usize],
        compute: DType,
    ) -> Result<Self> {
        validate::same_len(padding, stride, "padding", "stride")?;
        validate::same_len(padding, upscale, "padding", "upscale")?;
        validate::all_nonzero(stride, "stride")?;
        validate::all_nonzero(upscale, "upscale")?;

        let padding = reversed_i32(padding, "padding")?;
        let stride = reversed_i32(stride, "stride")?;
        let upscale = reversed_i32(upscale, "upscale")?;

        let mut desc = null_mut();
        check_cudnn(
            unsafe { cudnnCreateConvolutionDescriptor(&mut desc) },
            "cudnnCreateConvolutionDescriptor",
        )?;
        let cd = Self {
            desc,
            nd: padding.len(),
        };
        check_cudnn(
            unsafe {
                cudnnSetConvolutionNdDescriptor(
                    cd.desc,
                    padding.len() as i32,
                    padding.as_ptr(),
                    stride.as_ptr(),
                    upscale.as_ptr(),
                    mode.as_cudnn(),
                    compute.to_cudnn(),
                )
            },
            "cudnnSetConvolutionNdDescriptor",
        )?;
        Ok(cd)
    }

    /// Number of spatial dimensions
    #[inline]
    pub fn spatial_rank(&self) -> usize {
        self.nd
    }

    /// Query mode, padding, stride, and upscale back out, in host order
    pub fn read(&self) -> Result<(ConvolutionMode, Vec<usize>, Vec<usize>, Vec<usize>)> {
        let mut mode = cudnnConvolutionMode_t::CUDNN_CONVOLUTION;
        let mut compute = cudnnDataType_t::CUDNN_DATA_FLOAT;
        let mut nb_dims = 0i32;
        let mut padding = [0i32; MAX_NATIVE_RANK];
        let mut stride = [0i32; MAX_NATIVE_RANK];
        let mut upscale = [0i32; MAX_NATIVE_RANK];
        check_cudnn(
            unsafe {
                cudnnGetConvolutionNdDescriptor(
                    self.desc,
                    MAX_NATIVE_RANK as i32,
                    &mut nb_dims,
                    padding.as_mut_ptr(),
                    stride.as_mut_ptr(),
                    upscale.as_mut_ptr(),
                    &mut mode,
                    &mut compute,
                )
            },
            "cudnnGetConvolutionNdDescriptor",
        )?;
        let n = nb_dims as usize;
        let back = |native: &[i32]| native.iter().rev().map(|&v| v as usize).collect();
        Ok((
            ConvolutionMode::from_cudnn(mode)?,
            back(&padding[..n]),
            back(&stride[..n]),
            back(&upscale[..n]),
        ))
    }

    /// Forward output dimensions for input and filter descriptors, host order
    pub fn output_dims(
        &self,
        input: &TensorDescriptor,
        filter: &FilterDescriptor,
    ) -> Result<Shape> {
        let rank = self.nd + 2;
        let mut native = [0i32; MAX_NATIVE_RANK];
        check_cudnn(
            unsafe {
                cudnnGetConvolutionNdForwardOutputDim(
                    self.desc,
                    input.raw(),
                    filter.raw(),
                    rank as i32,
                    native.as_mut_ptr(),
                )
            },
            "cudnnGetConvolutionNdForwardOutputDim",
        )?;
        Ok(native[..rank].iter().rev().map(|&d| d as usize).collect())
    }

    /// Raw handle for native calls
    #[inline]
    pub(crate) fn raw(&self) -> cudnnConvolutionDescriptor_t {
        self.desc
    }
}

impl Drop for ConvolutionDescriptor {
    fn drop(&mut self) {
        unsafe {
            let _ = cudnnDestroyConvolutionDescriptor(self.desc);
        }
    }
}
