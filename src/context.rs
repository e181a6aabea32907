//! cuDNN client: library handle, CUDA context/stream, device allocator
//!
//! The cuDNN handle is not a hidden process-wide singleton: [`CudnnClient`]
//! is constructed explicitly and passed to every operation. It owns the CUDA
//! context, the stream all work is ordered on, and the `cudnnHandle_t`, and
//! releases the handle exactly once when dropped.

use crate::error::{Error, Result};
use cudarc::cudnn::sys::*;
use cudarc::driver::safe::{CudaContext, CudaStream};
use std::ptr::null_mut;
use std::sync::Arc;

/// Check a cuDNN status and convert to Result
pub(crate) fn check_cudnn(status: cudnnStatus_t, op: &'static str) -> Result<()> {
    if status == cudnnStatus_t::CUDNN_STATUS_SUCCESS {
        Ok(())
    } else {
        Err(Error::Cudnn {
            op,
            status: format!("{:?}", status),
        })
    }
}

/// Check a CUDA driver status and convert to Result
pub(crate) fn check_driver(result: cudarc::driver::sys::CUresult, op: &'static str) -> Result<()> {
    if result == cudarc::driver::sys::CUresult::CUDA_SUCCESS {
        Ok(())
    } else {
        Err(Error::Driver {
            op,
            status: format!("{:?}", result),
        })
    }
}

/// Log a CUDA memory operation failure.
///
/// Uses stderr with a consistent prefix for easy filtering.
#[cold]
#[inline(never)]
fn log_cuda_memory_error(operation: &str, ptr: u64, result: cudarc::driver::sys::CUresult) {
    eprintln!(
        "[dnnr::cuda] {} failed for ptr 0x{:x}: {:?}",
        operation, ptr, result
    );
}

// ============================================================================
// CudaAllocator
// ============================================================================

/// Stream-ordered device allocator.
///
/// Uses `cuMemAllocAsync` and `cuMemFreeAsync` so allocation and release are
/// ordered with kernel execution on the associated stream. This binding never
/// allocates host-resident memory; everything handed out here is device
/// memory.
#[derive(Clone)]
pub struct CudaAllocator {
    stream: Arc<CudaStream>,
}

impl CudaAllocator {
    /// Allocate `size_bytes` of device memory on the stream.
    ///
    /// Returns the null device pointer (0) for zero-size requests.
    pub fn allocate(&self, size_bytes: usize) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }
        unsafe {
            let mut ptr: u64 = 0;
            let result = cudarc::driver::sys::cuMemAllocAsync(
                &mut ptr,
                size_bytes,
                self.stream.cu_stream(),
            );
            check_driver(result, "cuMemAllocAsync")?;
            Ok(ptr)
        }
    }

    /// Allocate and zero-fill `size_bytes` of device memory.
    pub fn allocate_zeroed(&self, size_bytes: usize) -> Result<u64> {
        let ptr = self.allocate(size_bytes)?;
        if ptr != 0 {
            let result = unsafe {
                cudarc::driver::sys::cuMemsetD8Async(ptr, 0, size_bytes, self.stream.cu_stream())
            };
            if let Err(e) = check_driver(result, "cuMemsetD8Async") {
                self.deallocate(ptr, size_bytes);
                return Err(e);
            }
        }
        Ok(ptr)
    }

    /// Release a device pointer previously handed out by this allocator.
    ///
    /// Failures are logged, not propagated; release runs on drop paths.
    pub fn deallocate(&self, ptr: u64, _size_bytes: usize) {
        if ptr == 0 {
            return;
        }
        unsafe {
            let result = cudarc::driver::sys::cuMemFreeAsync(ptr, self.stream.cu_stream());
            if result != cudarc::driver::sys::CUresult::CUDA_SUCCESS {
                log_cuda_memory_error("cuMemFreeAsync", ptr, result);
            }
        }
    }

}

// ============================================================================
// AllocGuard
// ============================================================================

/// Scoped device allocation, released on all exit paths.
///
/// Call [`AllocGuard::release`] to take ownership of the pointer and skip the
/// automatic free (used when an allocation becomes tensor storage).
pub struct AllocGuard {
    allocator: CudaAllocator,
    ptr: u64,
    size_bytes: usize,
}

impl AllocGuard {
    /// Allocate `size_bytes` guarded by this scope
    pub fn new(allocator: &CudaAllocator, size_bytes: usize) -> Result<Self> {
        let ptr = allocator.allocate(size_bytes)?;
        Ok(Self {
            allocator: allocator.clone(),
            ptr,
            size_bytes,
        })
    }

    /// The guarded device pointer
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.ptr
    }

    /// Give up ownership: the caller becomes responsible for the pointer
    pub fn release(mut self) -> u64 {
        std::mem::replace(&mut self.ptr, 0)
    }
}

impl Drop for AllocGuard {
    fn drop(&mut self) {
        if self.ptr != 0 {
            self.allocator.deallocate(self.ptr, self.size_bytes);
        }
    }
}

// ============================================================================
// CudnnClient
// ============================================================================

/// cuDNN client: context, stream, and library handle for one device.
///
/// All operations dispatch through a client. Construction initializes the
/// CUDA context, creates a stream, creates the cuDNN handle, and binds the
/// handle to the stream; the handle is destroyed exactly once on drop.
///
/// # Thread Safety
///
/// The client can be moved or shared across threads; the stream serializes
/// all native work, and cuDNN permits a handle to be used from one thread at
/// a time, which `&self` dispatch plus the stream ordering satisfies for the
/// single-logical-thread model this crate targets.
pub struct CudnnClient {
    /// GPU device index
    device_index: usize,

    /// CUDA context for this device (owns GPU context)
    context: Arc<CudaContext>,

    /// Stream on which all native calls are ordered
    stream: Arc<CudaStream>,

    /// cuDNN library handle
    handle: cudnnHandle_t,

    /// Allocator for device memory
    allocator: CudaAllocator,
}

impl std::fmt::Debug for CudnnClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CudnnClient")
            .field("device_index", &self.device_index)
            .finish_non_exhaustive()
    }
}

impl CudnnClient {
    /// Create a new cuDNN client for a device.
    ///
    /// # Errors
    ///
    /// Returns an error if the CUDA context or stream cannot be created, or
    /// the cuDNN handle cannot be initialized. The native libraries are
    /// loaded by name on first use; their absence is fatal here, not later.
    pub fn new(device_index: usize) -> Result<Self> {
        let context = CudaContext::new(device_index).map_err(|e| {
            Error::Context(format!(
                "Failed to create CUDA context for device {}: {:?}",
                device_index, e
            ))
        })?;

        context.bind_to_thread().map_err(|e| {
            Error::Context(format!("Failed to bind CUDA context to thread: {:?}", e))
        })?;

        let stream = context
            .new_stream()
            .map_err(|e| Error::Context(format!("Failed to create CUDA stream: {:?}", e)))?;

        let allocator = CudaAllocator {
            stream: stream.clone(),
        };

        let mut handle: cudnnHandle_t = null_mut();
        check_cudnn(unsafe { cudnnCreate(&mut handle) }, "cudnnCreate")?;

        // Wrapped before configuration so a failed cudnnSetStream still
        // destroys the handle exactly once.
        let client = Self {
            device_index,
            context,
            stream,
            handle,
            allocator,
        };

        check_cudnn(
            unsafe { cudnnSetStream(client.handle, client.stream.cu_stream() as cudaStream_t) },
            "cudnnSetStream",
        )?;

        Ok(client)
    }

    /// The device index this client was created for
    #[inline]
    pub fn device_index(&self) -> usize {
        self.device_index
    }

    /// Raw cuDNN handle for native calls
    #[inline]
    pub(crate) fn handle(&self) -> cudnnHandle_t {
        self.handle
    }

    /// The CUDA stream all work is ordered on
    #[inline]
    pub fn stream(&self) -> &Arc<CudaStream> {
        &self.stream
    }

    /// The CUDA context backing this client
    #[inline]
    pub fn context(&self) -> &Arc<CudaContext> {
        &self.context
    }

    /// The device allocator tied to this client's stream
    #[inline]
    pub fn allocator(&self) -> &CudaAllocator {
        &self.allocator
    }

    /// Block until all work queued on the stream has completed
    pub fn synchronize(&self) -> Result<()> {
        self.stream
            .synchronize()
            .map_err(|e| Error::Context(format!("Stream synchronization failed: {:?}", e)))
    }
}

impl Drop for CudnnClient {
    fn drop(&mut self) {
        unsafe {
            let _ = cudnnDestroy(self.handle);
        }
    }
}

// cudnnHandle_t is a raw pointer, so we need to manually implement Send/Sync
// SAFETY: all native work is serialized on the owned stream, and dispatch
// takes &self; the handle is never mutated after construction
unsafe impl Send for CudnnClient {}
unsafe impl Sync for CudnnClient {}
