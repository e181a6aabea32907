//! Operation dispatchers, mode enumerants, and configuration structs
//!
//! One dispatcher per native entry point, implemented as methods on
//! [`crate::context::CudnnClient`]. Each operation family takes a single
//! explicit configuration struct enumerating its recognized options and their
//! defaults; `Default` gives the conventional coefficients (alpha 1, beta 0,
//! or beta 1 where the operation accumulates).
//!
//! Every enumerant has `from_raw`/`as_raw` conversions; unrecognized raw
//! values are rejected before any native call.

mod activation;
mod convolution;
mod pooling;
mod softmax;
mod tensor_ops;

pub use convolution::Workspace;

use crate::error::{Error, Result};
use cudarc::cudnn::sys::*;

// ============================================================================
// Mode enumerants
// ============================================================================

/// Bias-addition broadcast mode
///
/// Constrains the shape of the source (bias) tensor relative to the
/// destination; the binding realizes the mode as a broadcast-shaped tensor
/// descriptor. The historical same-HW and same-CHW names are aliases of
/// `Image` and `FeatureMap` (see [`AddMode::SAME_HW`], [`AddMode::SAME_CHW`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AddMode {
    /// One image: source shaped (1,1,H,W)
    Image,
    /// One feature map: source shaped (1,C,H,W)
    FeatureMap,
    /// One value per channel: source shaped (1,C,1,1)
    SameC,
    /// Full tensor: source shaped exactly like the destination
    FullTensor,
}

impl AddMode {
    /// Alias: same-HW is the image mode
    pub const SAME_HW: AddMode = AddMode::Image;
    /// Alias: same-CHW is the feature-map mode
    pub const SAME_CHW: AddMode = AddMode::FeatureMap;

    /// Decode a raw enumerant value, rejecting anything unrecognized
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(AddMode::Image),
            1 => Ok(AddMode::FeatureMap),
            2 => Ok(AddMode::SameC),
            3 => Ok(AddMode::FullTensor),
            _ => Err(Error::UnknownEnum {
                what: "add mode",
                value,
            }),
        }
    }

    /// The raw enumerant value
    pub fn as_raw(self) -> i32 {
        match self {
            AddMode::Image => 0,
            AddMode::FeatureMap => 1,
            AddMode::SameC => 2,
            AddMode::FullTensor => 3,
        }
    }
}

/// Activation function selector
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ActivationMode {
    /// Logistic sigmoid
    Sigmoid,
    /// Rectified linear unit
    #[default]
    Relu,
    /// Hyperbolic tangent
    Tanh,
}

impl ActivationMode {
    /// Decode a raw enumerant value, rejecting anything unrecognized
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(ActivationMode::Sigmoid),
            1 => Ok(ActivationMode::Relu),
            2 => Ok(ActivationMode::Tanh),
            _ => Err(Error::UnknownEnum {
                what: "activation mode",
                value,
            }),
        }
    }

    /// The raw enumerant value
    pub fn as_raw(self) -> i32 {
        match self {
            ActivationMode::Sigmoid => 0,
            ActivationMode::Relu => 1,
            ActivationMode::Tanh => 2,
        }
    }

    pub(crate) fn as_cudnn(self) -> cudnnActivationMode_t {
        match self {
            ActivationMode::Sigmoid => cudnnActivationMode_t::CUDNN_ACTIVATION_SIGMOID,
            ActivationMode::Relu => cudnnActivationMode_t::CUDNN_ACTIVATION_RELU,
            ActivationMode::Tanh => cudnnActivationMode_t::CUDNN_ACTIVATION_TANH,
        }
    }
}

/// Pooling reduction selector
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum PoolingMode {
    /// Maximum over the window
    #[default]
    Max,
    /// Average over the window, padded positions included in the divisor
    AverageIncludePadding,
    /// Average over the window, padded positions excluded from the divisor
    AverageExcludePadding,
}

impl PoolingMode {
    /// Decode a raw enumerant value, rejecting anything unrecognized
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(PoolingMode::Max),
            1 => Ok(PoolingMode::AverageIncludePadding),
            2 => Ok(PoolingMode::AverageExcludePadding),
            _ => Err(Error::UnknownEnum {
                what: "pooling mode",
                value,
            }),
        }
    }

    /// The raw enumerant value
    pub fn as_raw(self) -> i32 {
        match self {
            PoolingMode::Max => 0,
            PoolingMode::AverageIncludePadding => 1,
            PoolingMode::AverageExcludePadding => 2,
        }
    }

    pub(crate) fn as_cudnn(self) -> cudnnPoolingMode_t {
        match self {
            PoolingMode::Max => cudnnPoolingMode_t::CUDNN_POOLING_MAX,
            PoolingMode::AverageIncludePadding => {
                cudnnPoolingMode_t::CUDNN_POOLING_AVERAGE_COUNT_INCLUDE_PADDING
            }
            PoolingMode::AverageExcludePadding => {
                cudnnPoolingMode_t::CUDNN_POOLING_AVERAGE_COUNT_EXCLUDE_PADDING
            }
        }
    }

    pub(crate) fn from_cudnn(value: cudnnPoolingMode_t) -> Result<Self> {
        match value {
            cudnnPoolingMode_t::CUDNN_POOLING_MAX => Ok(PoolingMode::Max),
            cudnnPoolingMode_t::CUDNN_POOLING_AVERAGE_COUNT_INCLUDE_PADDING => {
                Ok(PoolingMode::AverageIncludePadding)
            }
            cudnnPoolingMode_t::CUDNN_POOLING_AVERAGE_COUNT_EXCLUDE_PADDING => {
                Ok(PoolingMode::AverageExcludePadding)
            }
            other => Err(Error::UnknownEnum {
                what: "cuDNN pooling mode",
                value: other as i32,
            }),
        }
    }
}

/// Convolution vs. cross-correlation
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConvolutionMode {
    /// True convolution (filter flipped)
    Convolution,
    /// Cross-correlation (filter applied as stored; the common DL choice)
    #[default]
    CrossCorrelation,
}

impl ConvolutionMode {
    /// Decode a raw enumerant value, rejecting anything unrecognized
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(ConvolutionMode::Convolution),
            1 => Ok(ConvolutionMode::CrossCorrelation),
            _ => Err(Error::UnknownEnum {
                what: "convolution mode",
                value,
            }),
        }
    }

    /// The raw enumerant value
    pub fn as_raw(self) -> i32 {
        match self {
            ConvolutionMode::Convolution => 0,
            ConvolutionMode::CrossCorrelation => 1,
        }
    }

    pub(crate) fn as_cudnn(self) -> cudnnConvolutionMode_t {
        match self {
            ConvolutionMode::Convolution => cudnnConvolutionMode_t::CUDNN_CONVOLUTION,
            ConvolutionMode::CrossCorrelation => cudnnConvolutionMode_t::CUDNN_CROSS_CORRELATION,
        }
    }

    pub(crate) fn from_cudnn(value: cudnnConvolutionMode_t) -> Result<Self> {
        match value {
            cudnnConvolutionMode_t::CUDNN_CONVOLUTION => Ok(ConvolutionMode::Convolution),
            cudnnConvolutionMode_t::CUDNN_CROSS_CORRELATION => {
                Ok(ConvolutionMode::CrossCorrelation)
            }
            #[allow(unreachable_patterns)]
            other => Err(Error::UnknownEnum {
                what: "cuDNN convolution mode",
                value: other as i32,
            }),
        }
    }
}

/// Softmax numerical algorithm
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum SoftmaxAlgorithm {
    /// Straightforward exponentials
    Fast,
    /// Max-subtracted for overflow avoidance
    #[default]
    Accurate,
    /// Log-softmax
    Log,
}

impl SoftmaxAlgorithm {
    /// Decode a raw enumerant value, rejecting anything unrecognized
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(SoftmaxAlgorithm::Fast),
            1 => Ok(SoftmaxAlgorithm::Accurate),
            2 => Ok(SoftmaxAlgorithm::Log),
            _ => Err(Error::UnknownEnum {
                what: "softmax algorithm",
                value,
            }),
        }
    }

    /// The raw enumerant value
    pub fn as_raw(self) -> i32 {
        match self {
            SoftmaxAlgorithm::Fast => 0,
            SoftmaxAlgorithm::Accurate => 1,
            SoftmaxAlgorithm::Log => 2,
        }
    }

    pub(crate) fn as_cudnn(self) -> cudnnSoftmaxAlgorithm_t {
        match self {
            SoftmaxAlgorithm::Fast => cudnnSoftmaxAlgorithm_t::CUDNN_SOFTMAX_FAST,
            SoftmaxAlgorithm::Accurate => cudnnSoftmaxAlgorithm_t::CUDNN_SOFTMAX_ACCURATE,
            SoftmaxAlgorithm::Log => cudnnSoftmaxAlgorithm_t::CUDNN_SOFTMAX_LOG,
        }
    }
}

/// Which slice of the tensor each softmax normalizes over
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum SoftmaxMode {
    /// Normalize over C,H,W per image
    #[default]
    Instance,
    /// Normalize over C per spatial position
    Channel,
}

impl SoftmaxMode {
    /// Decode a raw enumerant value, rejecting anything unrecognized
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(SoftmaxMode::Instance),
            1 => Ok(SoftmaxMode::Channel),
            _ => Err(Error::UnknownEnum {
                what: "softmax mode",
                value,
            }),
        }
    }

    /// The raw enumerant value
    pub fn as_raw(self) -> i32 {
        match self {
            SoftmaxMode::Instance => 0,
            SoftmaxMode::Channel => 1,
        }
    }

    pub(crate) fn as_cudnn(self) -> cudnnSoftmaxMode_t {
        match self {
            SoftmaxMode::Instance => cudnnSoftmaxMode_t::CUDNN_SOFTMAX_MODE_INSTANCE,
            SoftmaxMode::Channel => cudnnSoftmaxMode_t::CUDNN_SOFTMAX_MODE_CHANNEL,
        }
    }
}

/// Convolution forward algorithm selector
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConvFwdAlgo {
    /// Implicit GEMM, no workspace
    #[default]
    ImplicitGemm,
    /// Implicit GEMM with precomputed indices
    ImplicitPrecompGemm,
    /// Explicit GEMM
    Gemm,
    /// Direct convolution
    Direct,
    /// FFT-based
    Fft,
    /// FFT with tiling
    FftTiling,
    /// Winograd
    Winograd,
    /// Winograd, non-fused
    WinogradNonfused,
}

impl ConvFwdAlgo {
    /// Decode a raw enumerant value, rejecting anything unrecognized
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(ConvFwdAlgo::ImplicitGemm),
            1 => Ok(ConvFwdAlgo::ImplicitPrecompGemm),
            2 => Ok(ConvFwdAlgo::Gemm),
            3 => Ok(ConvFwdAlgo::Direct),
            4 => Ok(ConvFwdAlgo::Fft),
            5 => Ok(ConvFwdAlgo::FftTiling),
            6 => Ok(ConvFwdAlgo::Winograd),
            7 => Ok(ConvFwdAlgo::WinogradNonfused),
            _ => Err(Error::UnknownEnum {
                what: "convolution forward algorithm",
                value,
            }),
        }
    }

    /// The raw enumerant value
    pub fn as_raw(self) -> i32 {
        match self {
            ConvFwdAlgo::ImplicitGemm => 0,
            ConvFwdAlgo::ImplicitPrecompGemm => 1,
            ConvFwdAlgo::Gemm => 2,
            ConvFwdAlgo::Direct => 3,
            ConvFwdAlgo::Fft => 4,
            ConvFwdAlgo::FftTiling => 5,
            ConvFwdAlgo::Winograd => 6,
            ConvFwdAlgo::WinogradNonfused => 7,
        }
    }

    pub(crate) fn as_cudnn(self) -> cudnnConvolutionFwdAlgo_t {
        match self {
            ConvFwdAlgo::ImplicitGemm => {
                cudnnConvolutionFwdAlgo_t::CUDNN_CONVOLUTION_FWD_ALGO_IMPLICIT_GEMM
            }
            ConvFwdAlgo::ImplicitPrecompGemm => {
                cudnnConvolutionFwdAlgo_t::CUDNN_CONVOLUTION_FWD_ALGO_IMPLICIT_PRECOMP_GEMM
            }
            ConvFwdAlgo::Gemm => cudnnConvolutionFwdAlgo_t::CUDNN_CONVOLUTION_FWD_ALGO_GEMM,
            ConvFwdAlgo::Direct => cudnnConvolutionFwdAlgo_t::CUDNN_CONVOLUTION_FWD_ALGO_DIRECT,
            ConvFwdAlgo::Fft => cudnnConvolutionFwdAlgo_t::CUDNN_CONVOLUTION_FWD_ALGO_FFT,
            ConvFwdAlgo::FftTiling => {
                cudnnConvolutionFwdAlgo_t::CUDNN_CONVOLUTION_FWD_ALGO_FFT_TILING
            }
            ConvFwdAlgo::Winograd => cudnnConvolutionFwdAlgo_t::CUDNN_CONVOLUTION_FWD_ALGO_WINOGRAD,
            ConvFwdAlgo::WinogradNonfused => {
                cudnnConvolutionFwdAlgo_t::CUDNN_CONVOLUTION_FWD_ALGO_WINOGRAD_NONFUSED
            }
        }
    }
}

/// Convolution backward-filter algorithm selector
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConvBwdFilterAlgo {
    /// Non-deterministic accumulation, no workspace
    #[default]
    Algo0,
    /// Deterministic accumulation
    Algo1,
    /// FFT-based
    Fft,
    /// Non-deterministic with workspace
    Algo3,
}

impl ConvBwdFilterAlgo {
    /// Decode a raw enumerant value, rejecting anything unrecognized
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(ConvBwdFilterAlgo::Algo0),
            1 => Ok(ConvBwdFilterAlgo::Algo1),
            2 => Ok(ConvBwdFilterAlgo::Fft),
            3 => Ok(ConvBwdFilterAlgo::Algo3),
            _ => Err(Error::UnknownEnum {
                what: "convolution backward-filter algorithm",
                value,
            }),
        }
    }

    /// The raw enumerant value
    pub fn as_raw(self) -> i32 {
        match self {
            ConvBwdFilterAlgo::Algo0 => 0,
            ConvBwdFilterAlgo::Algo1 => 1,
            ConvBwdFilterAlgo::Fft => 2,
            ConvBwdFilterAlgo::Algo3 => 3,
        }
    }

    pub(crate) fn as_cudnn(self) -> cudnnConvolutionBwdFilterAlgo_t {
        match self {
            ConvBwdFilterAlgo::Algo0 => {
                cudnnConvolutionBwdFilterAlgo_t::CUDNN_CONVOLUTION_BWD_FILTER_ALGO_0
            }
            ConvBwdFilterAlgo::Algo1 => {
                cudnnConvolutionBwdFilterAlgo_t::CUDNN_CONVOLUTION_BWD_FILTER_ALGO_1
            }
            ConvBwdFilterAlgo::Fft => {
                cudnnConvolutionBwdFilterAlgo_t::CUDNN_CONVOLUTION_BWD_FILTER_ALGO_FFT
            }
            ConvBwdFilterAlgo::Algo3 => {
                cudnnConvolutionBwdFilterAlgo_t::CUDNN_CONVOLUTION_BWD_FILTER_ALGO_3
            }
        }
    }
}

/// Convolution backward-data algorithm selector
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConvBwdDataAlgo {
    /// Non-deterministic, no workspace
    #[default]
    Algo0,
    /// Deterministic
    Algo1,
    /// FFT-based
    Fft,
    /// FFT with tiling
    FftTiling,
    /// Winograd
    Winograd,
}

impl ConvBwdDataAlgo {
    /// Decode a raw enumerant value, rejecting anything unrecognized
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(ConvBwdDataAlgo::Algo0),
            1 => Ok(ConvBwdDataAlgo::Algo1),
            2 => Ok(ConvBwdDataAlgo::Fft),
            3 => Ok(ConvBwdDataAlgo::FftTiling),
            4 => Ok(ConvBwdDataAlgo::Winograd),
            _ => Err(Error::UnknownEnum {
                what: "convolution backward-data algorithm",
                value,
            }),
        }
    }

    /// The raw enumerant value
    pub fn as_raw(self) -> i32 {
        match self {
            ConvBwdDataAlgo::Algo0 => 0,
            ConvBwdDataAlgo::Algo1 => 1,
            ConvBwdDataAlgo::Fft => 2,
            ConvBwdDataAlgo::FftTiling => 3,
            ConvBwdDataAlgo::Winograd => 4,
        }
    }

    pub(crate) fn as_cudnn(self) -> cudnnConvolutionBwdDataAlgo_t {
        match self {
            ConvBwdDataAlgo::Algo0 => {
                cudnnConvolutionBwdDataAlgo_t::CUDNN_CONVOLUTION_BWD_DATA_ALGO_0
            }
            ConvBwdDataAlgo::Algo1 => {
                cudnnConvolutionBwdDataAlgo_t::CUDNN_CONVOLUTION_BWD_DATA_ALGO_1
            }
            ConvBwdDataAlgo::Fft => {
                cudnnConvolutionBwdDataAlgo_t::CUDNN_CONVOLUTION_BWD_DATA_ALGO_FFT
            }
            ConvBwdDataAlgo::FftTiling => {
                cudnnConvolutionBwdDataAlgo_t::CUDNN_CONVOLUTION_BWD_DATA_ALGO_FFT_TILING
            }
            ConvBwdDataAlgo::Winograd => {
                cudnnConvolutionBwdDataAlgo_t::CUDNN_CONVOLUTION_BWD_DATA_ALGO_WINOGRAD
            }
        }
    }
}

// ============================================================================
// Per-family configuration
// ============================================================================

/// Options for tensor transform (scaled copy)
#[derive(Clone, Debug)]
pub struct TransformConfig {
    /// Source coefficient
    pub alpha: f64,
    /// Destination blend coefficient
    pub beta: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.0,
        }
    }
}

/// Options for bias addition: `dst = alpha * bias + beta * dst`
#[derive(Clone, Debug)]
pub struct AddConfig {
    /// Broadcast mode constraining the bias shape
    pub mode: AddMode,
    /// Bias coefficient
    pub alpha: f64,
    /// Destination blend coefficient; 1 accumulates into the destination
    pub beta: f64,
}

impl Default for AddConfig {
    fn default() -> Self {
        Self {
            mode: AddMode::FullTensor,
            alpha: 1.0,
            beta: 1.0,
        }
    }
}

/// Options for activation forward/backward
#[derive(Clone, Debug)]
pub struct ActivationConfig {
    /// Activation function
    pub mode: ActivationMode,
    /// Source coefficient
    pub alpha: f64,
    /// Destination blend coefficient
    pub beta: f64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            mode: ActivationMode::Relu,
            alpha: 1.0,
            beta: 0.0,
        }
    }
}

/// Options for softmax forward/backward
#[derive(Clone, Debug)]
pub struct SoftmaxConfig {
    /// Numerical algorithm
    pub algorithm: SoftmaxAlgorithm,
    /// Normalization slice
    pub mode: SoftmaxMode,
    /// Source coefficient
    pub alpha: f64,
    /// Destination blend coefficient
    pub beta: f64,
}

impl Default for SoftmaxConfig {
    fn default() -> Self {
        Self {
            algorithm: SoftmaxAlgorithm::Accurate,
            mode: SoftmaxMode::Instance,
            alpha: 1.0,
            beta: 0.0,
        }
    }
}

/// Options for pooling forward/backward
#[derive(Clone, Debug)]
pub struct PoolingConfig {
    /// Source coefficient
    pub alpha: f64,
    /// Destination blend coefficient
    pub beta: f64,
}

impl Default for PoolingConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.0,
        }
    }
}

/// Options for convolution forward
#[derive(Clone, Debug)]
pub struct ConvFwdConfig {
    /// Forward algorithm
    pub algo: ConvFwdAlgo,
    /// Source coefficient
    pub alpha: f64,
    /// Destination blend coefficient
    pub beta: f64,
}

impl Default for ConvFwdConfig {
    fn default() -> Self {
        Self {
            algo: ConvFwdAlgo::ImplicitGemm,
            alpha: 1.0,
            beta: 0.0,
        }
    }
}

/// Options for convolution backward-bias
#[derive(Clone, Debug)]
pub struct ConvBwdBiasConfig {
    /// Gradient coefficient
    pub alpha: f64,
    /// Destination blend coefficient
    pub beta: f64,
}

impl Default for ConvBwdBiasConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.0,
        }
    }
}

/// Options for convolution backward-filter
#[derive(Clone, Debug)]
pub struct ConvBwdFilterConfig {
    /// Backward-filter algorithm
    pub algo: ConvBwdFilterAlgo,
    /// Gradient coefficient
    pub alpha: f64,
    /// Destination blend coefficient
    pub beta: f64,
}

impl Default for ConvBwdFilterConfig {
    fn default() -> Self {
        Self {
            algo: ConvBwdFilterAlgo::Algo0,
            alpha: 1.0,
            beta: 0.0,
        }
    }
}

/// Options for convolution backward-data
#[derive(Clone, Debug)]
pub struct ConvBwdDataConfig {
    /// Backward-data algorithm
    pub algo: ConvBwdDataAlgo,
    /// Gradient coefficient
    pub alpha: f64,
    /// Destination blend coefficient
    pub beta: f64,
}

impl Default for ConvBwdDataConfig {
    fn default() -> Self {
        Self {
            algo: ConvBwdDataAlgo::Algo0,
            alpha: 1.0,
            beta: 0.0,
        }
    }
}

/// Allocate a default destination for an operation producing `dims`.
///
/// A zero beta means the native call fully overwrites the destination, so an
/// uninitialized buffer is fine; a nonzero beta blends with prior contents,
/// which for a fresh buffer must be zeros.
pub(crate) fn alloc_dst(
    client: &crate::context::CudnnClient,
    dims: &[usize],
    dtype: crate::dtype::DType,
    beta: f64,
) -> Result<crate::tensor::Tensor> {
    if beta == 0.0 {
        crate::tensor::Tensor::uninit(client, dims, dtype)
    } else {
        crate::tensor::Tensor::zeros(client, dims, dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_rejects_unknown_values() {
        assert!(AddMode::from_raw(4).is_err());
        assert!(ActivationMode::from_raw(3).is_err());
        assert!(PoolingMode::from_raw(3).is_err());
        assert!(ConvolutionMode::from_raw(2).is_err());
        assert!(SoftmaxAlgorithm::from_raw(3).is_err());
        assert!(SoftmaxMode::from_raw(2).is_err());
        assert!(ConvFwdAlgo::from_raw(8).is_err());
        assert!(ConvBwdFilterAlgo::from_raw(4).is_err());
        assert!(ConvBwdDataAlgo::from_raw(5).is_err());
        assert!(ActivationMode::from_raw(-1).is_err());
    }

    #[test]
    fn test_raw_roundtrip() {
        for raw in 0..4 {
            assert_eq!(AddMode::from_raw(raw).unwrap().as_raw(), raw);
        }
        for raw in 0..3 {
            assert_eq!(ActivationMode::from_raw(raw).unwrap().as_raw(), raw);
            assert_eq!(PoolingMode::from_raw(raw).unwrap().as_raw(), raw);
            assert_eq!(SoftmaxAlgorithm::from_raw(raw).unwrap().as_raw(), raw);
        }
        for raw in 0..8 {
            assert_eq!(ConvFwdAlgo::from_raw(raw).unwrap().as_raw(), raw);
        }
    }

    #[test]
    fn test_add_mode_aliases() {
        assert_eq!(AddMode::SAME_HW, AddMode::Image);
        assert_eq!(AddMode::SAME_CHW, AddMode::FeatureMap);
    }

    #[test]
    fn test_config_defaults() {
        let transform = TransformConfig::default();
        assert_eq!((transform.alpha, transform.beta), (1.0, 0.0));

        let add = AddConfig::default();
        assert_eq!(add.mode, AddMode::FullTensor);
        assert_eq!((add.alpha, add.beta), (1.0, 1.0));

        let act = ActivationConfig::default();
        assert_eq!(act.mode, ActivationMode::Relu);
        assert_eq!((act.alpha, act.beta), (1.0, 0.0));

        let softmax = SoftmaxConfig::default();
        assert_eq!(softmax.algorithm, SoftmaxAlgorithm::Accurate);
        assert_eq!(softmax.mode, SoftmaxMode::Instance);
        assert_eq!((softmax.alpha, softmax.beta), (1.0, 0.0));

        let pool = PoolingConfig::default();
        assert_eq!((pool.alpha, pool.beta), (1.0, 0.0));

        let fwd = ConvFwdConfig::default();
        assert_eq!(fwd.algo, ConvFwdAlgo::ImplicitGemm);
        assert_eq!((fwd.alpha, fwd.beta), (1.0, 0.0));

        assert_eq!(ConvBwdFilterConfig::default().algo, ConvBwdFilterAlgo::Algo0);
        assert_eq!(ConvBwdDataConfig::default().algo, ConvBwdDataAlgo::Algo0);
    }
}
