//! Activation descriptor, built transiently per activation dispatch

use crate::context::check_cudnn;
use crate::error::Result;
use crate::ops::ActivationMode;
use cudarc::cudnn::sys::*;
use std::ptr::null_mut;

/// RAII wrapper for a cuDNN activation descriptor
pub struct ActivationDescriptor {
    desc: cudnnActivationDescriptor_t,
}

impl ActivationDescriptor {
    /// Create and configure an activation descriptor.
    ///
    /// `coef` is only read by clipped modes; the modes surfaced by this crate
    /// ignore it.
    pub fn new(mode: ActivationMode, coef: f64) -> Result<Self> {
        let mut desc = null_mut();
        check_cudnn(
            unsafe { cudnnCreateActivationDescriptor(&mut desc) },
            "cudnnCreateActivationDescriptor",
        )?;
        let ad = Self { desc };
        check_cudnn(
            unsafe {
                cudnnSetActivationDescriptor(
                    ad.desc,
                    mode.as_cudnn(),
                    cudnnNanPropagation_t::CUDNN_NOT_PROPAGATE_NAN,
                    coef,
                )
            },
            "cudnnSetActivationDescriptor",
        )?;
        Ok(ad)
    }

    /// Raw handle for native calls
    #[inline]
    pub(crate) fn raw(&self) -> cudnnActivationDescriptor_t {
        self.desc
    }
}

impl Drop for ActivationDescriptor {
    fn drop(&mut self) {
        unsafe {
            let _ = cudnnDestroyActivationDescriptor(self.desc);
        }
    }
}
