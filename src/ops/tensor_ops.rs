//! Tensor transform, bias addition, fill, and scale dispatchers

use super::{alloc_dst, AddConfig, AddMode, TransformConfig};
use crate::context::{check_cudnn, CudnnClient};
use crate::descriptor::TensorDescriptor;
use crate::dtype::{DType, ScalingParams};
use crate::error::{Error, Result};
use crate::shape::MIN_TENSOR_RANK;
use crate::tensor::Tensor;
use crate::validate;
use cudarc::cudnn::sys::*;
use std::ffi::c_void;

/// Native dims the bias must have for a broadcast mode, given the destination
pub(crate) fn expected_bias_dims(mode: AddMode, dst: &[i32]) -> Vec<i32> {
    debug_assert_eq!(dst.len(), MIN_TENSOR_RANK);
    match mode {
        AddMode::Image => vec![1, 1, dst[2], dst[3]],
        AddMode::FeatureMap => vec![1, dst[1], dst[2], dst[3]],
        AddMode::SameC => vec![1, dst[1], 1, 1],
        AddMode::FullTensor => dst.to_vec(),
    }
}

impl CudnnClient {
    /// Scaled tensor copy: `dst = alpha * x + beta * dst`.
    ///
    /// With no destination a new tensor of the same shape is allocated.
    pub fn transform(
        &self,
        x: &Tensor,
        dst: Option<&Tensor>,
        config: &TransformConfig,
    ) -> Result<Tensor> {
        let y = match dst {
            Some(dst) => {
                validate::dst_matches(dst, x)?;
                dst.clone()
            }
            None => alloc_dst(self, x.dims(), x.dtype(), config.beta)?,
        };

        let x_desc = TensorDescriptor::from_tensor(x, MIN_TENSOR_RANK)?;
        let y_desc = TensorDescriptor::from_tensor(&y, MIN_TENSOR_RANK)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnTransformTensor(
                    self.handle(),
                    scale.alpha_ptr(x.dtype()),
                    x_desc.raw(),
                    x.as_ptr(),
                    scale.beta_ptr(x.dtype()),
                    y_desc.raw(),
                    y.as_mut_ptr(),
                )
            },
            "cudnnTransformTensor",
        )?;
        Ok(y)
    }

    /// Broadcast bias addition: `dst = alpha * bias + beta * dst`.
    ///
    /// The mode in `config` fixes which destination dimensions the bias may
    /// span; its shape is checked against the mode before dispatch.
    pub fn add(&self, bias: &Tensor, dst: &Tensor, config: &AddConfig) -> Result<Tensor> {
        validate::same_dtype(dst.dtype(), bias.dtype())?;

        let dst_layout = dst.native_layout(MIN_TENSOR_RANK)?;
        let bias_layout = bias.native_layout(MIN_TENSOR_RANK)?;
        let expected = expected_bias_dims(config.mode, &dst_layout.dims);
        if bias_layout.dims.as_slice() != expected.as_slice() {
            return Err(Error::ShapeMismatch {
                expected: expected.iter().map(|&d| d as usize).collect(),
                got: bias_layout.dims.iter().map(|&d| d as usize).collect(),
            });
        }

        let bias_desc = TensorDescriptor::new(bias.dtype(), &bias_layout)?;
        let dst_desc = TensorDescriptor::new(dst.dtype(), &dst_layout)?;
        let scale = ScalingParams::new(config.alpha, config.beta);

        check_cudnn(
            unsafe {
                cudnnAddTensor(
                    self.handle(),
                    scale.alpha_ptr(dst.dtype()),
                    bias_desc.raw(),
                    bias.as_ptr(),
                    scale.beta_ptr(dst.dtype()),
                    dst_desc.raw(),
                    dst.as_mut_ptr(),
                )
            },
            "cudnnAddTensor",
        )?;
        Ok(dst.clone())
    }

    /// Fill every element of `dst` with a scalar value
    pub fn set_tensor(&self, dst: &Tensor, value: f64) -> Result<Tensor> {
        let desc = TensorDescriptor::from_tensor(dst, MIN_TENSOR_RANK)?;

        // cudnnSetTensor reads the value at the tensor's own element type.
        let mut bytes = [0u8; 8];
        match dst.dtype() {
            DType::F64 => bytes.copy_from_slice(&value.to_ne_bytes()),
            DType::F32 => bytes[..4].copy_from_slice(&(value as f32).to_ne_bytes()),
            DType::F16 => {
                bytes[..2].copy_from_slice(&half::f16::from_f64(value).to_ne_bytes());
            }
            DType::BF16 => {
                bytes[..2].copy_from_slice(&half::bf16::from_f64(value).to_ne_bytes());
            }
        }

        check_cudnn(
            unsafe {
                cudnnSetTensor(
                    self.handle(),
                    desc.raw(),
                    dst.as_mut_ptr(),
                    bytes.as_ptr() as *const c_void,
                )
            },
            "cudnnSetTensor",
        )?;
        Ok(dst.clone())
    }

    /// Multiply every element of `dst` by a scalar in place
    pub fn scale_tensor(&self, dst: &Tensor, alpha: f64) -> Result<Tensor> {
        let desc = TensorDescriptor::from_tensor(dst, MIN_TENSOR_RANK)?;
        let scale = ScalingParams::new(alpha, 0.0);

        check_cudnn(
            unsafe {
                cudnnScaleTensor(
                    self.handle(),
                    desc.raw(),
                    dst.as_mut_ptr(),
                    scale.alpha_ptr(dst.dtype()),
                )
            },
            "cudnnScaleTensor",
        )?;
        Ok(dst.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_bias_dims() {
        let dst = [16, 8, 24, 24];
        assert_eq!(expected_bias_dims(AddMode::Image, &dst), vec![1, 1, 24, 24]);
        assert_eq!(
            expected_bias_dims(AddMode::FeatureMap, &dst),
            vec![1, 8, 24, 24]
        );
        assert_eq!(expected_bias_dims(AddMode::SameC, &dst), vec![1, 8, 1, 1]);
        assert_eq!(
            expected_bias_dims(AddMode::FullTensor, &dst),
            vec![16, 8, 24, 24]
        );
    }

    #[test]
    fn test_alias_modes_share_shapes() {
        let dst = [2, 3, 4, 5];
        assert_eq!(
            expected_bias_dims(AddMode::SAME_HW, &dst),
            expected_bias_dims(AddMode::Image, &dst)
        );
        assert_eq!(
            expected_bias_dims(AddMode::SAME_CHW, &dst),
            expected_bias_dims(AddMode::FeatureMap, &dst)
        );
    }
}
