//! memforge - Memory-pattern planning core for tensor runtimes
//!
//! Executing a computation plan produces a fixed sequence of buffer
//! allocate/free events. memforge traces that sequence once, packs every
//! buffer into a single contiguous arena using best-fit placement, and
//! caches the resulting layout per input-shape signature. Later executions
//! with the same shapes resolve each buffer to `arena_base + offset`
//! without calling the planner or the underlying allocator again.
//!
//! # Pipeline
//!
//! 1. Cache miss for the run's [`ShapeSignature`]: route every buffer
//!    request through [`MemPatternPlanner`] instead of the real allocator.
//! 2. Finalize the trace into an immutable [`MemoryPattern`].
//! 3. Allocate one [`ArenaBuffer`] of `peak_size` bytes from a
//!    [`DeviceAllocator`] and install both in the [`PatternCache`].
//! 4. Cache hit: resolve value-ids against the cached arena; no planning,
//!    no allocation.
//!
//! [`PatternEngine`] drives the whole flow; the individual layers are
//! usable on their own.
//!
//! # Example
//!
//! ```
//! use memforge::{EngineConfig, PatternEngine, SystemAllocator, TraceEvent};
//! use std::sync::Arc;
//!
//! let mut engine = PatternEngine::new(EngineConfig::default(), Arc::new(SystemAllocator::new()));
//!
//! let shapes = [vec![1usize, 128]];
//! let events = [
//!     TraceEvent::Alloc(0, 1024),
//!     TraceEvent::Alloc(1, 512),
//!     TraceEvent::Free(0),
//!     TraceEvent::Free(1),
//! ];
//!
//! let first = engine.run(&shapes, &events)?;   // traced
//! let second = engine.run(&shapes, &events)?;  // replayed from cache
//! assert!(second.was_replayed());
//!
//! let base = engine.arena_base(&shapes)?;
//! assert_eq!(engine.resolve(&shapes, 1)?, base + 1024);
//! # Ok::<(), memforge::EngineError>(())
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod logging;
pub mod memory;
pub mod planner;

pub use cache::{CacheEntry, CacheError, CacheStats, PatternCache, ShapeSignature};
pub use engine::{EngineConfig, EngineError, EngineStats, PatternEngine, RunOutcome, TraceEvent};
pub use error::{ErrorCategory, ForgeResult, MemForgeError};
pub use logging::{init_logging_default, init_logging_from_env, LogFormat, LogLevel};
pub use memory::{ArenaBuffer, DeviceAllocator, MemError, SystemAllocator};
pub use planner::{MemPatternPlanner, MemoryBlock, MemoryPattern, PatternError, ValueId};
