//! Softmax forward/backward dispatchers

use super::SoftmaxConfig;
use crate::context::{check_cudnn, CudnnClient};
use crate::descriptor::TensorDescriptor;
use crate::dtype::ScalingParams;
use crate::error::Result;
use crate::shape::MIN_TENSOR_RANK;
use crate::tensor::Tensor;
use crate::validate;
use cudarc::cudnn::sys::*;

impl CudnnClient {
    /// Softmax: `dst = alpha * softmax(x) + beta * dst`.
    ///
    /// With no destination the result lands in `x`'s own buffer (in-place).
    pub fn softmax_forward(
        &self,
        x: &Tensor,
        dst: Option<&Tensor>,
        config: &SoftmaxConfig,
    ) -> Result<Tensor> {
        let y = match dst {
            Some(dst) => {
                validate::dst_matches(dst, x)?;
                dst.clone()
            }
            None => x.clone(),
        };

        let x_desc = TensorDescriptor::from_tensor(x, MIN_TENSOR_RANK)?;
        let y_desc = TensorDescriptor::from_tensor(&y, MIN_TENSOR_RANK)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnSoftmaxForward(
                    self.handle(),
                    config.algorithm.as_cudnn(),
                    config.mode.as_cudnn(),
                    scale.alpha_ptr(x.dtype()),
                    x_desc.raw(),
                    x.as_ptr(),
                    scale.beta_ptr(x.dtype()),
                    y_desc.raw(),
                    y.as_mut_ptr(),
                )
            },
            "cudnnSoftmaxForward",
        )?;
        Ok(y)
    }

    /// Softmax gradient from the forward output `y` and incoming gradient
    /// `dy`. With no destination the gradient lands in `dy`'s buffer.
    ///
    /// The gradient's scaling is exactly what the native library computes for
    /// the chosen algorithm and mode; no correction is applied on top.
    pub fn softmax_backward(
        &self,
        y: &Tensor,
        dy: &Tensor,
        dst: Option<&Tensor>,
        config: &SoftmaxConfig,
    ) -> Result<Tensor> {
        validate::dst_matches(dy, y)?;
        let dx = match dst {
            Some(dst) => {
                validate::dst_matches(dst, y)?;
                dst.clone()
            }
            None => dy.clone(),
        };

        let y_desc = TensorDescriptor::from_tensor(y, MIN_TENSOR_RANK)?;
        let dy_desc = TensorDescriptor::from_tensor(dy, MIN_TENSOR_RANK)?;
        let dx_desc = TensorDescriptor::from_tensor(&dx, MIN_TENSOR_RANK)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnSoftmaxBackward(
                    self.handle(),
                    config.algorithm.as_cudnn(),
                    config.mode.as_cudnn(),
                    scale.alpha_ptr(y.dtype()),
                    y_desc.raw(),
                    y.as_ptr(),
                    dy_desc.raw(),
                    dy.as_ptr(),
                    scale.beta_ptr(y.dtype()),
                    dx_desc.raw(),
                    dx.as_mut_ptr(),
                )
            },
            "cudnnSoftmaxBackward",
        )?;
        Ok(dx)
    }
}
