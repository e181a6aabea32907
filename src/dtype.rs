//! Data type system for dnnr tensors
//!
//! cuDNN accepts floating-point element types for the operations this crate
//! binds; `DType` enumerates them and owns the mapping to `cudnnDataType_t`.

use crate::error::{Error, Result};
use cudarc::cudnn::sys::cudnnDataType_t;
use std::ffi::c_void;
use std::fmt;

/// Element type of a device tensor
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DType {
    /// 64-bit floating point
    F64 = 0,
    /// 32-bit floating point (most common)
    F32 = 1,
    /// 16-bit floating point (IEEE 754)
    F16 = 2,
    /// 16-bit brain floating point
    BF16 = 3,
}

impl DType {
    /// Size of one element in bytes
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F64 => 8,
            DType::F32 => 4,
            DType::F16 => 2,
            DType::BF16 => 2,
        }
    }

    /// Decode a raw enumerant value, rejecting anything unrecognized
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(DType::F64),
            1 => Ok(DType::F32),
            2 => Ok(DType::F16),
            3 => Ok(DType::BF16),
            _ => Err(Error::UnknownEnum {
                what: "dtype",
                value,
            }),
        }
    }

    /// The raw enumerant value for this dtype
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Map to the native cuDNN data type enumerant
    pub(crate) fn to_cudnn(self) -> cudnnDataType_t {
        match self {
            DType::F64 => cudnnDataType_t::CUDNN_DATA_DOUBLE,
            DType::F32 => cudnnDataType_t::CUDNN_DATA_FLOAT,
            DType::F16 => cudnnDataType_t::CUDNN_DATA_HALF,
            DType::BF16 => cudnnDataType_t::CUDNN_DATA_BFLOAT16,
        }
    }

    /// Map back from the native cuDNN data type enumerant
    pub(crate) fn from_cudnn(value: cudnnDataType_t) -> Result<Self> {
        match value {
            cudnnDataType_t::CUDNN_DATA_DOUBLE => Ok(DType::F64),
            cudnnDataType_t::CUDNN_DATA_FLOAT => Ok(DType::F32),
            cudnnDataType_t::CUDNN_DATA_HALF => Ok(DType::F16),
            cudnnDataType_t::CUDNN_DATA_BFLOAT16 => Ok(DType::BF16),
            other => Err(Error::UnknownEnum {
                what: "cuDNN data type",
                value: other as i32,
            }),
        }
    }

    /// Compute type used by convolution descriptors for this data type
    ///
    /// Half-precision data accumulates in F32; F32/F64 compute in themselves.
    pub fn compute_dtype(self) -> DType {
        match self {
            DType::F16 | DType::BF16 => DType::F32,
            other => other,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F64 => "f64",
            DType::F32 => "f32",
            DType::F16 => "f16",
            DType::BF16 => "bf16",
        };
        write!(f, "{}", name)
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for half::f16 {}
    impl Sealed for half::bf16 {}
}

/// Host-representable element type, used for host-to-device transfer
pub trait Element: sealed::Sealed + Copy + Default + 'static {
    /// The corresponding runtime dtype
    const DTYPE: DType;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
}

impl Element for half::f16 {
    const DTYPE: DType = DType::F16;
}

impl Element for half::bf16 {
    const DTYPE: DType = DType::BF16;
}

/// Scaling coefficients for a native call
///
/// cuDNN takes `alpha`/`beta` by host pointer, typed to match the operand
/// data: `*const f64` for double tensors, `*const f32` for everything else
/// (including half precision). This struct keeps both representations alive
/// for the duration of the call and hands out the right pointer.
pub struct ScalingParams {
    alpha32: f32,
    beta32: f32,
    alpha64: f64,
    beta64: f64,
}

impl ScalingParams {
    /// Capture alpha/beta in both native widths
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self {
            alpha32: alpha as f32,
            beta32: beta as f32,
            alpha64: alpha,
            beta64: beta,
        }
    }

    /// Pointer to alpha, typed for the given operand dtype
    pub fn alpha_ptr(&self, dtype: DType) -> *const c_void {
        match dtype {
            DType::F64 => &self.alpha64 as *const f64 as *const c_void,
            _ => &self.alpha32 as *const f32 as *const c_void,
        }
    }

    /// Pointer to beta, typed for the given operand dtype
    pub fn beta_ptr(&self, dtype: DType) -> *const c_void {
        match dtype {
            DType::F64 => &self.beta64 as *const f64 as *const c_void,
            _ => &self.beta32 as *const f32 as *const c_void,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::F16.size_in_bytes(), 2);
        assert_eq!(DType::BF16.size_in_bytes(), 2);
    }

    #[test]
    fn test_from_raw_rejects_unknown() {
        assert!(DType::from_raw(0).is_ok());
        assert!(DType::from_raw(3).is_ok());
        assert!(matches!(
            DType::from_raw(4),
            Err(Error::UnknownEnum { value: 4, .. })
        ));
        assert!(DType::from_raw(-1).is_err());
    }

    #[test]
    fn test_raw_roundtrip() {
        for dtype in [DType::F64, DType::F32, DType::F16, DType::BF16] {
            assert_eq!(DType::from_raw(dtype.as_raw()).unwrap(), dtype);
        }
    }

    #[test]
    fn test_compute_dtype() {
        assert_eq!(DType::F16.compute_dtype(), DType::F32);
        assert_eq!(DType::BF16.compute_dtype(), DType::F32);
        assert_eq!(DType::F32.compute_dtype(), DType::F32);
        assert_eq!(DType::F64.compute_dtype(), DType::F64);
    }

    #[test]
    fn test_scaling_params_pointer_width() {
        let params = ScalingParams::new(1.5, 0.25);

        // F64 operands read the f64 slot
        let alpha = unsafe { *(params.alpha_ptr(DType::F64) as *const f64) };
        assert_eq!(alpha, 1.5);

        // Everything else reads the f32 slot
        for dtype in [DType::F32, DType::F16, DType::BF16] {
            let alpha = unsafe { *(params.alpha_ptr(dtype) as *const f32) };
            let beta = unsafe { *(params.beta_ptr(dtype) as *const f32) };
            assert_eq!(alpha, 1.5);
            assert_eq!(beta, 0.25);
        }
    }
}
