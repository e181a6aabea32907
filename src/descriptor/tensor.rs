//! Tensor descriptor: dtype, rank, per-dimension extent and stride

use crate::context::check_cudnn;
use crate::dtype::DType;
use crate::error::Result;
use crate::shape::{NativeLayout, MAX_NATIVE_RANK, MIN_TENSOR_RANK};
use crate::tensor::Tensor;
use cudarc::cudnn::sys::*;
use std::ptr::null_mut;

/// RAII wrapper for a cuDNN tensor descriptor
pub struct TensorDescriptor {
    desc: cudnnTensorDescriptor_t,
}

impl TensorDescriptor {
    /// Create and configure a descriptor from a native layout
    pub fn new(dtype: DType, layout: &NativeLayout) -> Result<Self> {
        let mut desc = null_mut();
        check_cudnn(
            unsafe { cudnnCreateTensorDescriptor(&mut desc) },
            "cudnnCreateTensorDescriptor",
        )?;
        let td = Self { desc };
        check_cudnn(
            unsafe {
                cudnnSetTensorNdDescriptor(
                    td.desc,
                    dtype.to_cudnn(),
                    layout.rank() as i32,
                    layout.dims.as_ptr(),
                    layout.strides.as_ptr(),
                )
            },
            "cudnnSetTensorNdDescriptor",
        )?;
        Ok(td)
    }

    /// Describe a tensor at the given target rank.
    ///
    /// The rank is clamped to the native minimum of 4; the tensor's layout is
    /// padded or collapsed to fit.
    pub fn from_tensor(tensor: &Tensor, target_rank: usize) -> Result<Self> {
        let layout = tensor.native_layout(target_rank.max(MIN_TENSOR_RANK))?;
        Self::new(tensor.dtype(), &layout)
    }

    /// Query the configured dtype, dimensions, and strides back out
    pub fn read(&self) -> Result<(DType, Vec<i32>, Vec<i32>)> {
        let mut dtype = cudnnDataType_t::CUDNN_DATA_FLOAT;
        let mut nb_dims = 0i32;
        let mut dims = [0i32; MAX_NATIVE_RANK];
        let mut strides = [0i32; MAX_NATIVE_RANK];
        check_cudnn(
            unsafe {
                cudnnGetTensorNdDescriptor(
                    self.desc,
                    MAX_NATIVE_RANK as i32,
                    &mut dtype,
                    &mut nb_dims,
                    dims.as_mut_ptr(),
                    strides.as_mut_ptr(),
                )
            },
            "cudnnGetTensorNdDescriptor",
        )?;
        let n = nb_dims as usize;
        Ok((
            DType::from_cudnn(dtype)?,
            dims[..n].to_vec(),
            strides[..n].to_vec(),
        ))
    }

    /// Raw handle for native calls
    #[inline]
    pub(crate) fn raw(&self) -> cudnnTensorDescriptor_t {
        self.desc
    }
}

impl Drop for TensorDescriptor {
    fn drop(&mut self) {
        unsafe {
            let _ = cudnnDestroyTensorDescriptor(self.desc);
        }
    }
}
