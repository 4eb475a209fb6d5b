//! Physical memory boundary
//!
//! The planner simulates placement; this module is where bytes actually get
//! allocated. One [`ArenaBuffer`] of `peak_size` bytes is created per cached
//! pattern, through the [`DeviceAllocator`] interface. A host-side
//! [`SystemAllocator`] is provided so the pipeline runs without device
//! hardware; device backends supply their own implementations.

pub mod allocator;
pub mod arena;

pub use allocator::{DeviceAllocator, MemError, MemResult, SystemAllocator};
pub use arena::ArenaBuffer;
