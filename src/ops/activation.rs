//! Activation forward/backward dispatchers

use super::ActivationConfig;
use crate::context::{check_cudnn, CudnnClient};
use crate::descriptor::{ActivationDescriptor, TensorDescriptor};
use crate::dtype::ScalingParams;
use crate::error::Result;
use crate::shape::MIN_TENSOR_RANK;
use crate::tensor::Tensor;
use crate::validate;
use cudarc::cudnn::sys::*;

impl CudnnClient {
    /// Apply an activation function: `dst = alpha * f(x) + beta * dst`.
    ///
    /// With no destination the result lands in `x`'s own buffer (in-place).
    pub fn activation_forward(
        &self,
        x: &Tensor,
        dst: Option<&Tensor>,
        config: &ActivationConfig,
    ) -> Result<Tensor> {
        let y = match dst {
            Some(dst) => {
                validate::dst_matches(dst, x)?;
                dst.clone()
            }
            None => x.clone(),
        };

        let act = ActivationDescriptor::new(config.mode, 0.0)?;
        let x_desc = TensorDescriptor::from_tensor(x, MIN_TENSOR_RANK)?;
        let y_desc = TensorDescriptor::from_tensor(&y, MIN_TENSOR_RANK)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnActivationForward(
                    self.handle(),
                    act.raw(),
                    scale.alpha_ptr(x.dtype()),
                    x_desc.raw(),
                    x.as_ptr(),
                    scale.beta_ptr(x.dtype()),
                    y_desc.raw(),
                    y.as_mut_ptr(),
                )
            },
            "cudnnActivationForward",
        )?;
        Ok(y)
    }

    /// Activation gradient: `dx = alpha * f'(x; y) * dy + beta * dx`.
    ///
    /// `y` is the forward output, `dy` the incoming gradient, `x` the forward
    /// input. With no destination the gradient lands in `dy`'s buffer.
    pub fn activation_backward(
        &self,
        y: &Tensor,
        dy: &Tensor,
        x: &Tensor,
        dst: Option<&Tensor>,
        config: &ActivationConfig,
    ) -> Result<Tensor> {
        validate::same_dtype(y.dtype(), dy.dtype())?;
        validate::dst_matches(dy, y)?;
        validate::dst_matches(x, y)?;
        let dx = match dst {
            Some(dst) => {
                validate::dst_matches(dst, y)?;
                dst.clone()
            }
            None => dy.clone(),
        };

        let act = ActivationDescriptor::new(config.mode, 0.0)?;
        let y_desc = TensorDescriptor::from_tensor(y, MIN_TENSOR_RANK)?;
        let dy_desc = TensorDescriptor::from_tensor(dy, MIN_TENSOR_RANK)?;
        let x_desc = TensorDescriptor::from_tensor(x, MIN_TENSOR_RANK)?;
        let dx_desc = TensorDescriptor::from_tensor(&dx, MIN_TENSOR_RANK)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnActivationBackward(
                    self.handle(),
                    act.raw(),
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
            "cudnnActivationBackward",
        )?;
        Ok(dx)
    }
}
