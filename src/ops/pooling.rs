//! Pooling forward/backward dispatchers

use super::{alloc_dst, PoolingConfig};
use crate::context::{check_cudnn, CudnnClient};
use crate::descriptor::{PoolingDescriptor, TensorDescriptor};
use crate::dtype::ScalingParams;
use crate::error::Result;
use crate::tensor::Tensor;
use crate::validate;
use cudarc::cudnn::sys::*;

impl CudnnClient {
    /// Pooling: `dst = alpha * pool(x) + beta * dst`.
    ///
    /// With no destination, the output shape is obtained from the native
    /// forward-shape query and a tensor of that shape is allocated.
    pub fn pooling_forward(
        &self,
        pooling: &PoolingDescriptor,
        x: &Tensor,
        dst: Option<&Tensor>,
        config: &PoolingConfig,
    ) -> Result<Tensor> {
        let rank = pooling.spatial_rank() + 2;
        let x_desc = TensorDescriptor::from_tensor(x, rank)?;
        let out_dims = pooling.output_dims(&x_desc)?;

        let y = match dst {
            Some(dst) => {
                validate::same_dtype(x.dtype(), dst.dtype())?;
                validate::dst_has_dims(dst, &out_dims)?;
                dst.clone()
            }
            None => alloc_dst(self, &out_dims, x.dtype(), config.beta)?,
        };

        let y_desc = TensorDescriptor::from_tensor(&y, rank)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnPoolingForward(
                    self.handle(),
                    pooling.raw(),
                    scale.alpha_ptr(x.dtype()),
                    x_desc.raw(),
                    x.as_ptr(),
                    scale.beta_ptr(x.dtype()),
                    y_desc.raw(),
                    y.as_mut_ptr(),
                )
            },
            "cudnnPoolingForward",
        )?;
        Ok(y)
    }

    /// Pooling gradient: `dx = alpha * dpool(y, dy, x) + beta * dx`.
    ///
    /// `y` is the forward output, `dy` its gradient, `x` the forward input.
    /// With no destination a tensor shaped like `x` is allocated.
    pub fn pooling_backward(
        &self,
        pooling: &PoolingDescriptor,
        y: &Tensor,
        dy: &Tensor,
        x: &Tensor,
        dst: Option<&Tensor>,
        config: &PoolingConfig,
    ) -> Result<Tensor> {
        validate::same_dtype(y.dtype(), x.dtype())?;
        validate::dst_matches(dy, y)?;
        let dx = match dst {
            Some(dst) => {
                validate::dst_matches(dst, x)?;
                dst.clone()
            }
            None => alloc_dst(self, x.dims(), x.dtype(), config.beta)?,
        };

        let rank = pooling.spatial_rank() + 2;
        let y_desc = TensorDescriptor::from_tensor(y, rank)?;
        let dy_desc = TensorDescriptor::from_tensor(dy, rank)?;
        let x_desc = TensorDescriptor::from_tensor(x, rank)?;
        let dx_desc = TensorDescriptor::from_tensor(&dx, rank)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnPoolingBackward(
                    self.handle(),
                    pooling.raw(),
                    scale.alpha_ptr(y.dtype()),
                    y_desc.raw(),
                    y.as_ptr(),
                    dy_desc.raw(),
                    dy.as_ptr(),
                    x_desc.raw(),
                    x.as_ptr(),
                    scale.beta_ptr(y.dtype()),
                    dx_desc.raw(),
                    dx.as_mut_ptr(),
                )
            },
            "cudnnPoolingBackward",
        )?;
        Ok(dx)
    }
}
