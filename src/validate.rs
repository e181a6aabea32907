//! Shared pre-call argument validation
//!
//! Every rule here runs before any native call is issued, so rejected
//! arguments never reach the library.

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// Validates that two operands have the same dtype.
#[inline]
pub fn same_dtype(lhs: DType, rhs: DType) -> Result<()> {
    if lhs != rhs {
        return Err(Error::DTypeMismatch { lhs, rhs });
    }
    Ok(())
}

/// Validates that two tuples have equal length.
#[inline]
pub fn same_len(a: &[usize], b: &[usize], a_name: &'static str, b_name: &'static str) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::InvalidArgument {
            arg: b_name,
            reason: format!(
                "{} has length {} but {} has length {}",
                b_name,
                b.len(),
                a_name,
                a.len()
            ),
        });
    }
    Ok(())
}

/// Validates that every tuple entry is nonzero.
#[inline]
pub fn all_nonzero(values: &[usize], name: &'static str) -> Result<()> {
    if values.iter().any(|&v| v == 0) {
        return Err(Error::InvalidArgument {
            arg: name,
            reason: format!("{} entries must be nonzero, got {:?}", name, values),
        });
    }
    Ok(())
}

/// Validates that a destination tensor matches an operand in dtype and dims.
#[inline]
pub fn dst_matches(dst: &Tensor, src: &Tensor) -> Result<()> {
    same_dtype(src.dtype(), dst.dtype())?;
    if dst.dims() != src.dims() {
        return Err(Error::ShapeMismatch {
            expected: src.dims().to_vec(),
            got: dst.dims().to_vec(),
        });
    }
    Ok(())
}

/// Validates that a destination tensor has exactly the given dims.
#[inline]
pub fn dst_has_dims(dst: &Tensor, dims: &[usize]) -> Result<()> {
    if dst.dims() != dims {
        return Err(Error::ShapeMismatch {
            expected: dims.to_vec(),
            got: dst.dims().to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_dtype() {
        assert!(same_dtype(DType::F32, DType::F32).is_ok());
        assert!(matches!(
            same_dtype(DType::F32, DType::F64),
            Err(Error::DTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_same_len() {
        assert!(same_len(&[2, 2], &[0, 0], "window", "padding").is_ok());
        assert!(same_len(&[2, 2], &[0], "window", "padding").is_err());
    }

    #[test]
    fn test_all_nonzero() {
        assert!(all_nonzero(&[1, 2], "stride").is_ok());
        assert!(all_nonzero(&[], "stride").is_ok());
        assert!(all_nonzero(&[1, 0], "stride").is_err());
    }
}
