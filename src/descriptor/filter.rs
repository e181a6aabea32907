//! Filter descriptor: dtype and dimensions, dense layout assumed

use crate::context::check_cudnn;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::shape::{is_dense, MAX_NATIVE_RANK, MIN_TENSOR_RANK};
use crate::tensor::Tensor;
use cudarc::cudnn::sys::*;
use std::ptr::null_mut;

/// RAII wrapper for a cuDNN filter descriptor
///
/// Filters carry no stride information; the native library assumes a dense
/// NCHW layout, which for this crate's column-major buffers means the host
/// dimension tuple (S,R,C,K) reversed into (K,C,R,S).
pub struct FilterDescriptor {
    desc: cudnnFilterDescriptor_t,
}

impl FilterDescriptor {
    /// Create and configure a descriptor from native-order dimensions
    pub fn new(dtype: DType, native_dims: &[i32]) -> Result<Self> {
        let mut desc = null_mut();
        check_cudnn(
            unsafe { cudnnCreateFilterDescriptor(&mut desc) },
            "cudnnCreateFilterDescriptor",
        )?;
        let fd = Self { desc };
        check_cudnn(
            unsafe {
                cudnnSetFilterNdDescriptor(
                    fd.desc,
                    dtype.to_cudnn(),
                    cudnnTensorFormat_t::CUDNN_TENSOR_NCHW,
                    native_dims.len() as i32,
                    native_dims.as_ptr(),
                )
            },
            "cudnnSetFilterNdDescriptor",
        )?;
        Ok(fd)
    }

    /// Describe a dense tensor as a filter at the given target rank
    pub fn from_tensor(tensor: &Tensor, target_rank: usize) -> Result<Self> {
        if !is_dense(tensor.dims(), tensor.strides()) {
            return Err(Error::InvalidArgument {
                arg: "filter",
                reason: "filters must be dense; strided buffers are not describable".to_string(),
            });
        }
        let layout = tensor.native_layout(target_rank.max(MIN_TENSOR_RANK))?;
        Self::new(tensor.dtype(), &layout.dims)
    }

    /// Query the configured dtype and dimensions back out
    pub fn read(&self) -> Result<(DType, Vec<i32>)> {
        let mut dtype = cudnnDataType_t::CUDNN_DATA_FLOAT;
        let mut format = cudnnTensorFormat_t::CUDNN_TENSOR_NCHW;
        let mut nb_dims = 0i32;
        let mut dims = [0i32; MAX_NATIVE_RANK];
        check_cudnn(
            unsafe {
                cudnnGetFilterNdDescriptor(
                    self.desc,
                    MAX_NATIVE_RANK as i32,
                    &mut dtype,
                    &mut format,
                    &mut nb_dims,
                    dims.as_mut_ptr(),
                )
            },
            "cudnnGetFilterNdDescriptor",
        )?;
        Ok((DType::from_cudnn(dtype)?, dims[..nb_dims as usize].to_vec()))
    }

    /// Raw handle for native calls
    #[inline]
    pub(crate) fn raw(&self) -> cudnnFilterDescriptor_t {
        self.desc
    }
}

impl Drop for FilterDescriptor {
    fn drop(&mut self) {
        unsafe {
            let _ = cudnnDestroyFilterDescriptor(self.desc);
        }
    }
}
