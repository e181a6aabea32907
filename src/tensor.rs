//! Column-major device tensors
//!
//! A [`Tensor`] is a dense device buffer plus a dimension/stride tuple in
//! column-major order (first dimension fastest) and an element dtype. Storage
//! is `Arc`-shared: cloning a tensor is cheap and yields a second view of the
//! same device memory, which is how in-place dispatch (destination == source
//! buffer) is expressed.

use crate::context::{check_driver, CudaAllocator, CudnnClient};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::shape::{col_major_strides, native_layout, NativeLayout, Shape, Strides};
use std::ffi::c_void;
use std::sync::Arc;

/// Owned device buffer; freed exactly once when the last tensor drops
struct Storage {
    ptr: u64,
    size_bytes: usize,
    allocator: CudaAllocator,
}

impl Drop for Storage {
    fn drop(&mut self) {
        self.allocator.deallocate(self.ptr, self.size_bytes);
    }
}

/// Dense column-major tensor in device memory
#[derive(Clone)]
pub struct Tensor {
    storage: Arc<Storage>,
    dims: Shape,
    strides: Strides,
    dtype: DType,
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("dims", &self.dims.as_slice())
            .field("dtype", &self.dtype)
            .finish_non_exhaustive()
    }
}

impl Tensor {
    fn alloc(client: &CudnnClient, dims: &[usize], dtype: DType, zeroed: bool) -> Result<Tensor> {
        let count: usize = dims.iter().product();
        let size_bytes = count * dtype.size_in_bytes();
        let allocator = client.allocator().clone();
        let ptr = if zeroed {
            allocator.allocate_zeroed(size_bytes)?
        } else {
            allocator.allocate(size_bytes)?
        };
        Ok(Tensor {
            storage: Arc::new(Storage {
                ptr,
                size_bytes,
                allocator,
            }),
            dims: dims.iter().copied().collect(),
            strides: col_major_strides(dims),
            dtype,
        })
    }

    /// Allocate a zero-filled tensor
    pub fn zeros(client: &CudnnClient, dims: &[usize], dtype: DType) -> Result<Tensor> {
        Self::alloc(client, dims, dtype, true)
    }

    /// Allocate without initializing; callers must fully overwrite
    pub(crate) fn uninit(client: &CudnnClient, dims: &[usize], dtype: DType) -> Result<Tensor> {
        Self::alloc(client, dims, dtype, false)
    }

    /// Upload a host slice into a new device tensor.
    ///
    /// The slice is read in column-major element order and must match the
    /// element count of `dims` exactly.
    pub fn from_slice<T: Element>(
        client: &CudnnClient,
        data: &[T],
        dims: &[usize],
    ) -> Result<Tensor> {
        let count: usize = dims.iter().product();
        if data.len() != count {
            return Err(Error::InvalidArgument {
                arg: "data",
                reason: format!(
                    "slice has {} elements but dims {:?} describe {}",
                    data.len(),
                    dims,
                    count
                ),
            });
        }
        let tensor = Self::uninit(client, dims, T::DTYPE)?;
        if count > 0 {
            unsafe {
                let result = cudarc::driver::sys::cuMemcpyHtoDAsync_v2(
                    tensor.ptr(),
                    data.as_ptr() as *const c_void,
                    std::mem::size_of_val(data),
                    client.stream().cu_stream(),
                );
                check_driver(result, "cuMemcpyHtoDAsync_v2")?;
            }
            // The host slice may go away as soon as we return.
            client.synchronize()?;
        }
        Ok(tensor)
    }

    /// Download the tensor into a host `Vec`, synchronizing the stream.
    pub fn to_vec<T: Element>(&self, client: &CudnnClient) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype {
            return Err(Error::DTypeMismatch {
                lhs: T::DTYPE,
                rhs: self.dtype,
            });
        }
        let count = self.len();
        let mut out = vec![T::default(); count];
        if count > 0 {
            unsafe {
                let result = cudarc::driver::sys::cuMemcpyDtoHAsync_v2(
                    out.as_mut_ptr() as *mut c_void,
                    self.ptr(),
                    self.size_bytes(),
                    client.stream().cu_stream(),
                );
                check_driver(result, "cuMemcpyDtoHAsync_v2")?;
            }
            client.synchronize()?;
        }
        Ok(out)
    }

    /// Dimension tuple, column-major order (first dimension fastest)
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Element strides matching [`Tensor::dims`]
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Element dtype
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    /// Whether the tensor holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the underlying buffer in bytes
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.storage.size_bytes
    }

    /// Raw device pointer
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.storage.ptr
    }

    /// Device pointer as a const pointer for native calls
    #[inline]
    pub(crate) fn as_ptr(&self) -> *const c_void {
        self.storage.ptr as usize as *const c_void
    }

    /// Device pointer as a mutable pointer for native calls.
    ///
    /// Takes `&self`: mutation happens device-side, ordered by the client's
    /// stream, never through a host reference.
    #[inline]
    pub(crate) fn as_mut_ptr(&self) -> *mut c_void {
        self.storage.ptr as usize as *mut c_void
    }

    /// Whether two tensors view the same device buffer
    pub fn shares_buffer(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Translate this tensor's layout to the native convention at `target_rank`
    pub fn native_layout(&self, target_rank: usize) -> Result<NativeLayout> {
        native_layout(&self.dims, &self.strides, target_rank)
    }
}
