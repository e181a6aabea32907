//! Shape, strides, and the host-to-native layout translation
//!
//! Device tensors in this crate are column-major: the first dimension varies
//! fastest in memory, the convention of the BLAS ecosystem these buffers are
//! shared with. cuDNN describes tensors in the opposite, row-major order
//! (N,C,H,W with W fastest) and at a fixed rank, commonly 4. [`native_layout`]
//! reconciles the two: it reverses dimension order, inserts leading unit
//! dimensions when the host array has too few, and collapses surplus
//! dimensions into the fastest-varying one when it has too many.

use crate::error::{Error, Result};
use smallvec::SmallVec;

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// cuDNN's maximum descriptor rank (CUDNN_DIM_MAX)
pub(crate) const MAX_NATIVE_RANK: usize = 8;

/// Minimum rank cuDNN accepts for Nd tensor descriptors
pub(crate) const MIN_TENSOR_RANK: usize = 4;

/// Shape type: dimensions of a tensor, column-major (first dimension fastest)
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Strides type: element offsets between consecutive elements along each dimension
/// NOTE: Strides are in ELEMENTS, not bytes
pub type Strides = SmallVec<[isize; STACK_DIMS]>;

/// Compute dense column-major strides for a shape
///
/// # Example
/// ```
/// use dnnr::shape::col_major_strides;
/// let strides = col_major_strides(&[2, 3, 4]);
/// assert_eq!(strides.as_slice(), &[1, 2, 6]);
/// ```
pub fn col_major_strides(dims: &[usize]) -> Strides {
    let mut strides: Strides = SmallVec::with_capacity(dims.len());
    let mut stride = 1isize;
    for &dim in dims {
        strides.push(stride);
        stride *= dim as isize;
    }
    strides
}

/// Whether the leading `count` dimensions form a dense column-major prefix
fn is_dense_prefix(dims: &[usize], strides: &[isize], count: usize) -> bool {
    let mut expected = 1isize;
    for (&dim, &stride) in dims.iter().zip(strides.iter()).take(count) {
        if stride != expected {
            return false;
        }
        expected *= dim as isize;
    }
    true
}

/// Whether a shape/stride pair describes a fully dense column-major buffer
pub fn is_dense(dims: &[usize], strides: &[isize]) -> bool {
    dims.len() == strides.len() && is_dense_prefix(dims, strides, dims.len())
}

/// Dimension and stride arrays in cuDNN's row-major convention
///
/// Produced by [`native_layout`]; both arrays always have exactly the target
/// rank requested from the translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeLayout {
    /// Extent per dimension, outermost (slowest-varying) first
    pub dims: SmallVec<[i32; MAX_NATIVE_RANK]>,
    /// Element stride per dimension, matching `dims`
    pub strides: SmallVec<[i32; MAX_NATIVE_RANK]>,
}

impl NativeLayout {
    /// Number of native dimensions
    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements described
    pub fn element_count(&self) -> usize {
        self.dims.iter().map(|&d| d as usize).product()
    }
}

fn to_i32(value: usize, arg: &'static str) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::InvalidArgument {
        arg,
        reason: format!("{} does not fit the native 32-bit extent type", value),
    })
}

/// Translate a column-major dimension/stride tuple to a native layout of
/// exactly `target_rank` dimensions
///
/// Host order is reversed into native row-major order. A host array with
/// fewer dimensions than the target rank gets leading unit dimensions; one
/// with more gets its surplus trailing native dimensions (the host's leading,
/// fastest-varying ones) collapsed into a single dimension whose extent is
/// their product and whose stride is 1. Collapsing requires those dimensions
/// to be dense.
///
/// # Example
/// ```
/// use dnnr::shape::{col_major_strides, native_layout};
/// let dims = [5usize, 4, 3, 2];
/// let strides = col_major_strides(&dims);
/// let native = native_layout(&dims, &strides, 4).unwrap();
/// assert_eq!(native.dims.as_slice(), &[2, 3, 4, 5]);
/// assert_eq!(native.strides.as_slice(), &[60, 20, 5, 1]);
/// ```
pub fn native_layout(dims: &[usize], strides: &[isize], target_rank: usize) -> Result<NativeLayout> {
    if target_rank == 0 || target_rank > MAX_NATIVE_RANK {
        return Err(Error::InvalidArgument {
            arg: "target_rank",
            reason: format!("must be in 1..={}, got {}", MAX_NATIVE_RANK, target_rank),
        });
    }
    if dims.len() != strides.len() {
        return Err(Error::InvalidArgument {
            arg: "strides",
            reason: format!(
                "stride tuple length {} does not match dimension tuple length {}",
                strides.len(),
                dims.len()
            ),
        });
    }
    for &dim in dims {
        if dim == 0 {
            return Err(Error::InvalidArgument {
                arg: "dims",
                reason: "zero-extent dimensions are not representable natively".to_string(),
            });
        }
    }
    for &stride in strides {
        if stride <= 0 {
            return Err(Error::InvalidArgument {
                arg: "strides",
                reason: format!("native descriptors require positive strides, got {}", stride),
            });
        }
    }

    let n = dims.len();
    let mut out_dims: SmallVec<[i32; MAX_NATIVE_RANK]> = SmallVec::with_capacity(target_rank);
    let mut out_strides: SmallVec<[i32; MAX_NATIVE_RANK]> = SmallVec::with_capacity(target_rank);

    if n <= target_rank {
        if n < target_rank {
            // Unit dimensions lead in native order. Their stride value is
            // inert as long as it is positive; the whole-array span keeps the
            // layout monotonic.
            let span = match n {
                0 => 1usize,
                _ => dims[n - 1] * strides[n - 1] as usize,
            };
            let span = to_i32(span, "strides")?;
            for _ in 0..target_rank - n {
                out_dims.push(1);
                out_strides.push(span);
            }
        }
        for (&dim, &stride) in dims.iter().zip(strides.iter()).rev() {
            out_dims.push(to_i32(dim, "dims")?);
            out_strides.push(to_i32(stride as usize, "strides")?);
        }
    } else {
        // Collapse the host's leading (fastest) dimensions into the last
        // native one. This only describes the same memory if they are dense.
        let collapse = n - target_rank + 1;
        if !is_dense_prefix(dims, strides, collapse) {
            return Err(Error::InvalidArgument {
                arg: "strides",
                reason: format!(
                    "cannot collapse {} non-dense dimensions to reach rank {}",
                    collapse, target_rank
                ),
            });
        }
        let mut collapsed = 1usize;
        for &dim in &dims[..collapse] {
            collapsed = collapsed.checked_mul(dim).ok_or(Error::InvalidArgument {
                arg: "dims",
                reason: "collapsed extent overflows".to_string(),
            })?;
        }
        for (&dim, &stride) in dims[collapse..].iter().zip(strides[collapse..].iter()).rev() {
            out_dims.push(to_i32(dim, "dims")?);
            out_strides.push(to_i32(stride as usize, "strides")?);
        }
        out_dims.push(to_i32(collapsed, "dims")?);
        out_strides.push(1);
    }

    Ok(NativeLayout {
        dims: out_dims,
        strides: out_strides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(dims: &[usize]) -> (Vec<usize>, Vec<isize>) {
        (dims.to_vec(), col_major_strides(dims).to_vec())
    }

    #[test]
    fn test_col_major_strides() {
        assert_eq!(col_major_strides(&[]).as_slice(), &[] as &[isize]);
        assert_eq!(col_major_strides(&[7]).as_slice(), &[1]);
        assert_eq!(col_major_strides(&[2, 3, 4]).as_slice(), &[1, 2, 6]);
    }

    #[test]
    fn test_exact_rank_reverses_order() {
        let (dims, strides) = dense(&[5, 4, 3, 2]);
        let native = native_layout(&dims, &strides, 4).unwrap();
        assert_eq!(native.dims.as_slice(), &[2, 3, 4, 5]);
        assert_eq!(native.strides.as_slice(), &[60, 20, 5, 1]);
        assert_eq!(native.element_count(), 120);
    }

    #[test]
    fn test_padding_inserts_leading_units() {
        let (dims, strides) = dense(&[10, 3]);
        let native = native_layout(&dims, &strides, 4).unwrap();
        assert_eq!(native.rank(), 4);
        assert_eq!(native.dims.as_slice(), &[1, 1, 3, 10]);
        assert_eq!(native.strides.as_slice(), &[30, 30, 10, 1]);
        assert_eq!(native.element_count(), 30);
    }

    #[test]
    fn test_scalar_pads_to_all_units() {
        let native = native_layout(&[], &[], 4).unwrap();
        assert_eq!(native.dims.as_slice(), &[1, 1, 1, 1]);
        assert_eq!(native.element_count(), 1);
    }

    #[test]
    fn test_collapse_preserves_element_count() {
        let (dims, strides) = dense(&[5, 4, 3, 2, 6]);
        let native = native_layout(&dims, &strides, 4).unwrap();
        assert_eq!(native.rank(), 4);
        // Host (5,4) collapse into the fastest native dimension.
        assert_eq!(native.dims.as_slice(), &[6, 2, 3, 20]);
        assert_eq!(native.strides.as_slice(), &[120, 60, 20, 1]);
        assert_eq!(native.element_count(), 5 * 4 * 3 * 2 * 6);
    }

    #[test]
    fn test_collapse_to_rank_one() {
        let (dims, strides) = dense(&[5, 4, 3]);
        let native = native_layout(&dims, &strides, 1).unwrap();
        assert_eq!(native.dims.as_slice(), &[60]);
        assert_eq!(native.strides.as_slice(), &[1]);
    }

    #[test]
    fn test_output_length_equals_target_rank_everywhere() {
        for host_rank in 0..=6usize {
            let dims: Vec<usize> = (0..host_rank).map(|i| i + 2).collect();
            let strides = col_major_strides(&dims);
            for target in 1..=MAX_NATIVE_RANK {
                let native = native_layout(&dims, &strides, target).unwrap();
                assert_eq!(native.rank(), target);
                assert_eq!(native.strides.len(), target);
                assert_eq!(
                    native.element_count(),
                    dims.iter().product::<usize>().max(1)
                );
            }
        }
    }

    #[test]
    fn test_collapse_rejects_non_dense_prefix() {
        // A transposed-ish buffer: first dimension strided by 4.
        let dims = [3usize, 4, 2, 2, 2];
        let strides = [4isize, 1, 12, 24, 48];
        assert!(matches!(
            native_layout(&dims, &strides, 4),
            Err(Error::InvalidArgument { arg: "strides", .. })
        ));
    }

    #[test]
    fn test_strided_input_passes_through_at_exact_rank() {
        // Non-dense is fine when nothing needs collapsing.
        let dims = [3usize, 4];
        let strides = [1isize, 8];
        let native = native_layout(&dims, &strides, 4).unwrap();
        assert_eq!(native.dims.as_slice(), &[1, 1, 4, 3]);
        assert_eq!(native.strides.as_slice(), &[32, 32, 8, 1]);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let (dims, strides) = dense(&[2, 2]);
        assert!(native_layout(&dims, &strides, 0).is_err());
        assert!(native_layout(&dims, &strides, MAX_NATIVE_RANK + 1).is_err());
        assert!(native_layout(&dims, &strides[..1], 4).is_err());
        assert!(native_layout(&[2, 0], &[1, 2], 4).is_err());
        assert!(native_layout(&[2, 2], &[1, -2], 4).is_err());
        assert!(native_layout(&[2, 2], &[0, 2], 4).is_err());
    }

    #[test]
    fn test_rejects_i32_overflow() {
        let dims = [usize::try_from(i64::from(i32::MAX)).unwrap() + 1];
        let strides = [1isize];
        assert!(native_layout(&dims, &strides, 4).is_err());
    }

    #[test]
    fn test_is_dense() {
        let (dims, strides) = dense(&[2, 3, 4]);
        assert!(is_dense(&dims, &strides));
        assert!(!is_dense(&[2, 3], &[1, 3]));
        assert!(is_dense(&[], &[]));
    }
}
