//! Convolution forward/backward dispatchers and scratch workspace

use super::{alloc_dst, ConvBwdBiasConfig, ConvBwdDataConfig, ConvBwdFilterConfig, ConvFwdConfig};
use crate::context::{check_cudnn, AllocGuard, CudaAllocator, CudnnClient};
use crate::descriptor::{ConvolutionDescriptor, FilterDescriptor, TensorDescriptor};
use crate::dtype::ScalingParams;
use crate::error::Result;
use crate::shape::MIN_TENSOR_RANK;
use crate::tensor::Tensor;
use crate::validate;
use cudarc::cudnn::sys::*;
use std::ffi::c_void;

/// Reusable convolution scratch buffer.
///
/// Some algorithms trade device memory for speed; the required size is
/// queried per dispatch. A workspace only ever grows: an undersized buffer is
/// reallocated at the required size, a large-enough one is reused as-is.
pub struct Workspace {
    allocator: CudaAllocator,
    ptr: u64,
    size_bytes: usize,
}

impl Workspace {
    /// Create an empty workspace tied to a client's allocator
    pub fn new(client: &CudnnClient) -> Self {
        Self {
            allocator: client.allocator().clone(),
            ptr: 0,
            size_bytes: 0,
        }
    }

    /// Current capacity in bytes
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Grow to at least `required` bytes and return the device pointer
    pub(crate) fn ensure(&mut self, required: usize) -> Result<u64> {
        if required > self.size_bytes {
            let ptr = self.allocator.allocate(required)?;
            self.allocator.deallocate(self.ptr, self.size_bytes);
            self.ptr = ptr;
            self.size_bytes = required;
        }
        Ok(self.ptr)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.allocator.deallocate(self.ptr, self.size_bytes);
    }
}

/// Scratch for one dispatch: a caller workspace grown to size, or a guarded
/// transient allocation freed when the dispatch returns.
enum Scratch {
    Borrowed(u64),
    Transient(AllocGuard),
    None,
}

impl Scratch {
    fn acquire(
        client: &CudnnClient,
        workspace: Option<&mut Workspace>,
        required: usize,
    ) -> Result<Self> {
        match workspace {
            Some(ws) => Ok(Scratch::Borrowed(ws.ensure(required)?)),
            None if required > 0 => Ok(Scratch::Transient(AllocGuard::new(
                client.allocator(),
                required,
            )?)),
            None => Ok(Scratch::None),
        }
    }

    fn as_mut_ptr(&self) -> *mut c_void {
        let ptr = match self {
            Scratch::Borrowed(ptr) => *ptr,
            Scratch::Transient(guard) => guard.ptr(),
            Scratch::None => 0,
        };
        ptr as usize as *mut c_void
    }
}

impl CudnnClient {
    /// Convolution forward: `dst = alpha * conv(x, w) + beta * dst`.
    ///
    /// The output shape comes from the native forward-shape query; with no
    /// destination a tensor of that shape is allocated. The workspace size
    /// for the configured algorithm is queried per call and the caller's
    /// workspace grown if undersized (or a transient buffer used when none is
    /// supplied).
    pub fn conv_forward(
        &self,
        conv: &ConvolutionDescriptor,
        x: &Tensor,
        w: &Tensor,
        dst: Option<&Tensor>,
        workspace: Option<&mut Workspace>,
        config: &ConvFwdConfig,
    ) -> Result<Tensor> {
        validate::same_dtype(x.dtype(), w.dtype())?;

        let rank = (conv.spatial_rank() + 2).max(MIN_TENSOR_RANK);
        let x_desc = TensorDescriptor::from_tensor(x, rank)?;
        let w_desc = FilterDescriptor::from_tensor(w, rank)?;
        let out_dims = conv.output_dims(&x_desc, &w_desc)?;

        let y = match dst {
            Some(dst) => {
                validate::same_dtype(x.dtype(), dst.dtype())?;
                validate::dst_has_dims(dst, &out_dims)?;
                dst.clone()
            }
            None => alloc_dst(self, &out_dims, x.dtype(), config.beta)?,
        };
        let y_desc = TensorDescriptor::from_tensor(&y, rank)?;

        let mut required = 0usize;
        check_cudnn(
            unsafe {
                cudnnGetConvolutionForwardWorkspaceSize(
                    self.handle(),
                    x_desc.raw(),
                    w_desc.raw(),
                    conv.raw(),
                    y_desc.raw(),
                    config.algo.as_cudnn(),
                    &mut required,
                )
            },
            "cudnnGetConvolutionForwardWorkspaceSize",
        )?;
        let scratch = Scratch::acquire(self, workspace, required)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnConvolutionForward(
                    self.handle(),
                    scale.alpha_ptr(x.dtype()),
                    x_desc.raw(),
                    x.as_ptr(),
                    w_desc.raw(),
                    w.as_ptr(),
                    conv.raw(),
                    config.algo.as_cudnn(),
                    scratch.as_mut_ptr(),
                    required,
                    scale.beta_ptr(x.dtype()),
                    y_desc.raw(),
                    y.as_mut_ptr(),
                )
            },
            "cudnnConvolutionForward",
        )?;
        Ok(y)
    }

    /// Bias gradient: sums `dy` over every dimension except channels.
    ///
    /// With no destination a (1,1,C,1) tensor is allocated (host order).
    pub fn conv_backward_bias(
        &self,
        dy: &Tensor,
        dst: Option<&Tensor>,
        config: &ConvBwdBiasConfig,
    ) -> Result<Tensor> {
        let dy_layout = dy.native_layout(MIN_TENSOR_RANK)?;
        let channels = dy_layout.dims[1] as usize;
        let bias_dims = [1, 1, channels, 1];

        let db = match dst {
            Some(dst) => {
                validate::same_dtype(dy.dtype(), dst.dtype())?;
                validate::dst_has_dims(dst, &bias_dims)?;
                dst.clone()
            }
            None => alloc_dst(self, &bias_dims, dy.dtype(), config.beta)?,
        };

        let dy_desc = TensorDescriptor::new(dy.dtype(), &dy_layout)?;
        let db_desc = TensorDescriptor::from_tensor(&db, MIN_TENSOR_RANK)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnConvolutionBackwardBias(
                    self.handle(),
                    scale.alpha_ptr(dy.dtype()),
                    dy_desc.raw(),
                    dy.as_ptr(),
                    scale.beta_ptr(dy.dtype()),
                    db_desc.raw(),
                    db.as_mut_ptr(),
                )
            },
            "cudnnConvolutionBackwardBias",
        )?;
        Ok(db)
    }

    /// Filter gradient: `dw = alpha * dconv_w(x, dy) + beta * dw`.
    ///
    /// `dw` carries the filter geometry, so it is required rather than
    /// defaulted.
    pub fn conv_backward_filter(
        &self,
        conv: &ConvolutionDescriptor,
        x: &Tensor,
        dy: &Tensor,
        dw: &Tensor,
        workspace: Option<&mut Workspace>,
        config: &ConvBwdFilterConfig,
    ) -> Result<Tensor> {
        validate::same_dtype(x.dtype(), dy.dtype())?;
        validate::same_dtype(x.dtype(), dw.dtype())?;

        let rank = (conv.spatial_rank() + 2).max(MIN_TENSOR_RANK);
        let x_desc = TensorDescriptor::from_tensor(x, rank)?;
        let dy_desc = TensorDescriptor::from_tensor(dy, rank)?;
        let dw_desc = FilterDescriptor::from_tensor(dw, rank)?;

        let mut required = 0usize;
        check_cudnn(
            unsafe {
                cudnnGetConvolutionBackwardFilterWorkspaceSize(
                    self.handle(),
                    x_desc.raw(),
                    dy_desc.raw(),
                    conv.raw(),
                    dw_desc.raw(),
                    config.algo.as_cudnn(),
                    &mut required,
                )
            },
            "cudnnGetConvolutionBackwardFilterWorkspaceSize",
        )?;
        let scratch = Scratch::acquire(self, workspace, required)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnConvolutionBackwardFilter(
                    self.handle(),
                    scale.alpha_ptr(x.dtype()),
                    x_desc.raw(),
                    x.as_ptr(),
                    dy_desc.raw(),
                    dy.as_ptr(),
                    conv.raw(),
                    config.algo.as_cudnn(),
                    scratch.as_mut_ptr(),
                    required,
                    scale.beta_ptr(x.dtype()),
                    dw_desc.raw(),
                    dw.as_mut_ptr(),
                )
            },
            "cudnnConvolutionBackwardFilter",
        )?;
        Ok(dw.clone())
    }

    /// Data gradient: `dx = alpha * dconv_x(w, dy) + beta * dx`.
    ///
    /// `dx` carries the input geometry, so it is required rather than
    /// defaulted.
    pub fn conv_backward_data(
        &self,
        conv: &ConvolutionDescriptor,
        w: &Tensor,
        dy: &Tensor,
        dx: &Tensor,
        workspace: Option<&mut Workspace>,
        config: &ConvBwdDataConfig,
    ) -> Result<Tensor> {
        validate::same_dtype(w.dtype(), dy.dtype())?;
        validate::same_dtype(w.dtype(), dx.dtype())?;

        let rank = (conv.spatial_rank() + 2).max(MIN_TENSOR_RANK);
        let w_desc = FilterDescriptor::from_tensor(w, rank)?;
        let dy_desc = TensorDescriptor::from_tensor(dy, rank)?;
        let dx_desc = TensorDescriptor::from_tensor(dx, rank)?;

        let mut required = 0usize;
        check_cudnn(
            unsafe {
                cudnnGetConvolutionBackwardDataWorkspaceSize(
                    self.handle(),
                    w_desc.raw(),
                    dy_desc.raw(),
                    conv.raw(),
                    dx_desc.raw(),
                    config.algo.as_cudnn(),
                    &mut required,
                )
            },
            "cudnnGetConvolutionBackwardDataWorkspaceSize",
        )?;
        let scratch = Scratch::acquire(self, workspace, required)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnConvolutionBackwardData(
                    self.handle(),
                    scale.alpha_ptr(w.dtype()),
                    w_desc.raw(),
                    w.as_ptr(),
                    dy_desc.raw(),
                    dy.as_ptr(),
                    conv.raw(),
                    config.algo.as_cudnn(),
                    scratch.as_mut_ptr(),
                    required,
                    scale.beta_ptr(w.dtype()),
                    dx_desc.raw(),
                    dx.as_mut_ptr(),
                )
            },
            "cudnnConvolutionBackwardData",
        )?;
        Ok(dx.clone())
    }
}
