//! Byte-allocator boundary
//!
//! The planner only ever *simulates* allocation; physical memory is touched
//! once per cached pattern, when the replay arena is created. This module
//! defines the allocator interface that arena creation goes through, plus a
//! host-side implementation over `std::alloc` so the full trace/replay
//! pipeline runs without device hardware. Device backends implement
//! [`DeviceAllocator`] for their own arenas.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Errors from the allocator boundary
#[derive(Error, Debug)]
pub enum MemError {
    /// The underlying allocator could not satisfy the request
    #[error("arena allocation of {size} bytes failed on '{device}'")]
    AllocationFailed { device: String, size: usize },
    /// Zero-byte requests are rejected at this boundary
    #[error("allocation size cannot be zero")]
    ZeroSize,
    /// A byte range does not fit inside the arena
    #[error("range {offset}..{} exceeds arena of {len} bytes", offset + size)]
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },
}

/// Result type for allocator and arena operations
pub type MemResult<T> = Result<T, MemError>;

/// Interface to a device or host byte allocator
///
/// Implementations own the physical memory; callers get raw regions and
/// must return them with [`free`](Self::free). One allocator instance
/// corresponds to one device/arena descriptor.
pub trait DeviceAllocator: Send + Sync {
    /// Descriptor for logs and error messages
    fn name(&self) -> &str;

    /// Allocate `size` bytes
    ///
    /// # Errors
    /// [`MemError::ZeroSize`] for empty requests,
    /// [`MemError::AllocationFailed`] when the device is out of memory.
    fn alloc(&self, size: usize) -> MemResult<NonNull<u8>>;

    /// Release a region previously returned by [`alloc`](Self::alloc)
    ///
    /// # Safety
    /// `ptr` must have been returned by `alloc` on this allocator with the
    /// same `size`, and must not be used afterwards.
    unsafe fn free(&self, ptr: NonNull<u8>, size: usize);
}

/// Host allocator over `std::alloc`
///
/// Regions are zero-initialized and aligned to
/// [`SystemAllocator::ALIGNMENT`] bytes, matching common device-arena
/// alignment so offsets computed against a host arena stay valid on device
/// arenas.
#[derive(Debug, Default)]
pub struct SystemAllocator {
    live: AtomicUsize,
}

impl SystemAllocator {
    /// Alignment of every region handed out, in bytes
    pub const ALIGNMENT: usize = 256;

    /// Create a host allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of regions currently outstanding
    pub fn live_allocations(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn layout(size: usize) -> Option<Layout> {
        Layout::from_size_align(size, Self::ALIGNMENT).ok()
    }
}

impl DeviceAllocator for SystemAllocator {
    fn name(&self) -> &str {
        "system"
    }

    fn alloc(&self, size: usize) -> MemResult<NonNull<u8>> {
        if size == 0 {
            return Err(MemError::ZeroSize);
        }

        let layout = Self::layout(size).ok_or_else(|| MemError::AllocationFailed {
            device: self.name().to_string(),
            size,
        })?;
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| MemError::AllocationFailed {
            device: self.name().to_string(),
            size,
        })?;

        self.live.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(size, device = self.name(), "arena region allocated");
        Ok(ptr)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, size: usize) {
        // ptr came from alloc(), so the same layout is reconstructible.
        if let Some(layout) = Self::layout(size) {
            // SAFETY: caller guarantees ptr/size came from alloc().
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
            self.live.fetch_sub(1, Ordering::SeqCst);
            tracing::trace!(size, device = self.name(), "arena region released");
        }
    }
}
