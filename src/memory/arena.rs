//! Replay arena
//!
//! An [`ArenaBuffer`] is the single contiguous allocation backing one cached
//! memory pattern: `peak_size` bytes carved from a [`DeviceAllocator`] once,
//! then subdivided purely by the offsets in the pattern. The planner never
//! sees this type; it exists on the replay side only.

use crate::memory::allocator::{DeviceAllocator, MemError, MemResult};
use crate::planner::types::MemoryBlock;
use std::ptr::NonNull;
use std::sync::Arc;

/// One owned region plus the allocator that must reclaim it
struct ArenaRegion {
    ptr: NonNull<u8>,
    size: usize,
    allocator: Arc<dyn DeviceAllocator>,
}

// SAFETY: the region is uniquely owned by its ArenaBuffer; the raw pointer
// is never aliased mutably except through `&mut` access.
unsafe impl Send for ArenaRegion {}
unsafe impl Sync for ArenaRegion {}

impl Drop for ArenaRegion {
    fn drop(&mut self) {
        // SAFETY: ptr/size came from this allocator's alloc and the region
        // is dropped exactly once.
        unsafe { self.allocator.free(self.ptr, self.size) };
    }
}

/// Contiguous arena backing one pattern's replay
///
/// Freed on drop through the allocator it was carved from. A zero-size
/// arena (a pattern whose buffers are all zero-size) owns no region and
/// performs no allocator calls.
pub struct ArenaBuffer {
    region: Option<ArenaRegion>,
    size: usize,
}

impl ArenaBuffer {
    /// Allocate an arena of `size` bytes from `allocator`
    ///
    /// `size == 0` yields an empty arena without touching the allocator.
    ///
    /// # Errors
    /// Propagates [`MemError::AllocationFailed`] from the allocator.
    pub fn new(size: usize, allocator: Arc<dyn DeviceAllocator>) -> MemResult<Self> {
        if size == 0 {
            return Ok(Self::empty());
        }

        let ptr = allocator.alloc(size)?;
        tracing::debug!(size, device = allocator.name(), "replay arena allocated");
        Ok(Self {
            region: Some(ArenaRegion {
                ptr,
                size,
                allocator,
            }),
            size,
        })
    }

    /// An arena that owns no memory
    pub fn empty() -> Self {
        Self {
            region: None,
            size: 0,
        }
    }

    /// Base address of the arena; 0 for an empty arena
    pub fn base_addr(&self) -> usize {
        self.region
            .as_ref()
            .map(|r| r.ptr.as_ptr() as usize)
            .unwrap_or(0)
    }

    /// Arena size in bytes
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the arena owns no memory
    pub fn is_empty(&self) -> bool {
        self.region.is_none()
    }

    /// Borrow the bytes of `block` (host arenas only)
    ///
    /// # Errors
    /// [`MemError::OutOfBounds`] if the block does not fit inside the arena.
    pub fn bytes(&self, block: MemoryBlock) -> MemResult<&[u8]> {
        match self.check_range(block)? {
            // SAFETY: range checked above; shared borrow of self guards
            // against concurrent mutation through this arena.
            Some(r) => unsafe {
                Ok(std::slice::from_raw_parts(
                    r.ptr.as_ptr().add(block.offset),
                    block.size,
                ))
            },
            None => Ok(&[]),
        }
    }

    /// Mutably borrow the bytes of `block` (host arenas only)
    ///
    /// # Errors
    /// [`MemError::OutOfBounds`] if the block does not fit inside the arena.
    pub fn bytes_mut(&mut self, block: MemoryBlock) -> MemResult<&mut [u8]> {
        self.check_range(block)?;
        match &self.region {
            // SAFETY: range checked above; exclusive borrow of self.
            Some(r) => unsafe {
                Ok(std::slice::from_raw_parts_mut(
                    r.ptr.as_ptr().add(block.offset),
                    block.size,
                ))
            },
            None => Ok(&mut []),
        }
    }

    fn check_range(&self, block: MemoryBlock) -> MemResult<Option<&ArenaRegion>> {
        if block.end() > self.size {
            return Err(MemError::OutOfBounds {
                offset: block.offset,
                size: block.size,
                len: self.size,
            });
        }
        Ok(self.region.as_ref())
    }
}

impl std::fmt::Debug for ArenaBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaBuffer")
            .field("base", &self.base_addr())
            .field("size", &self.size)
            .finish()
    }
}
