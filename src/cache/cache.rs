//! Pattern cache
//!
//! Maps shape signatures to finalized memory patterns and the arenas that
//! back them. On a hit, executions resolve buffer addresses straight from
//! the cached pattern; the planner and the underlying allocator are not
//! involved. Entries beyond the configured capacity are evicted in
//! least-recently-used order.

use crate::cache::signature::ShapeSignature;
use crate::memory::allocator::{DeviceAllocator, MemError};
use crate::memory::arena::ArenaBuffer;
use crate::planner::pattern::{MemoryPattern, PatternResult};
use crate::planner::types::ValueId;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Arena allocation for a newly installed pattern failed
    #[error("memory error: {0}")]
    Memory(#[from] MemError),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// A cached pattern plus its backing arena
///
/// The pattern is `Arc`'d so executions can hold it across the entry's
/// lifetime; the arena is owned by the entry and released on eviction.
pub struct CacheEntry {
    pattern: Arc<MemoryPattern>,
    arena: ArenaBuffer,
    last_used: u64,
}

impl CacheEntry {
    /// The immutable pattern for this shape signature
    pub fn pattern(&self) -> &Arc<MemoryPattern> {
        &self.pattern
    }

    /// The arena backing this pattern
    pub fn arena(&self) -> &ArenaBuffer {
        &self.arena
    }

    /// Resolve `value_id` against this entry's arena
    ///
    /// # Errors
    /// [`PatternError::ValueNotFound`](crate::planner::PatternError::ValueNotFound)
    /// if `value_id` was not traced for this pattern.
    pub fn resolve(&self, value_id: ValueId) -> PatternResult<usize> {
        self.pattern.resolve(self.arena.base_addr(), value_id)
    }
}

/// Counters for cache observability
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Bounded LRU cache of memory patterns keyed by shape signature
pub struct PatternCache {
    allocator: Arc<dyn DeviceAllocator>,
    entries: HashMap<ShapeSignature, CacheEntry>,
    capacity: usize,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl PatternCache {
    /// Create a cache that allocates arenas from `allocator`
    ///
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize, allocator: Arc<dyn DeviceAllocator>) -> Self {
        Self {
            allocator,
            entries: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up the pattern for `signature`
    ///
    /// Touches the entry's recency; never creates, mutates, or drops
    /// entries.
    pub fn lookup(&mut self, signature: &ShapeSignature) -> Option<&CacheEntry> {
        self.clock += 1;
        let clock = self.clock;
        let hit = match self.entries.get_mut(signature) {
            Some(entry) => {
                entry.last_used = clock;
                true
            }
            None => false,
        };

        if hit {
            self.hits += 1;
            tracing::trace!(inputs = signature.input_count(), "pattern cache hit");
            self.entries.get(signature)
        } else {
            self.misses += 1;
            tracing::trace!(inputs = signature.input_count(), "pattern cache miss");
            None
        }
    }

    /// Store a freshly generated pattern and allocate its arena
    ///
    /// Allocates one arena of `pattern.peak_size()` bytes from the
    /// configured allocator (none for a zero-size pattern). Installing over
    /// an existing signature replaces its entry and arena. When the cache
    /// is full, the least-recently-used entry is evicted first.
    ///
    /// # Errors
    /// [`CacheError::Memory`] if the arena allocation fails; the cache is
    /// left unchanged in that case.
    pub fn install(
        &mut self,
        signature: ShapeSignature,
        pattern: MemoryPattern,
    ) -> CacheResult<&CacheEntry> {
        let arena = ArenaBuffer::new(pattern.peak_size(), self.allocator.clone())?;

        if !self.entries.contains_key(&signature) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }

        self.clock += 1;
        tracing::debug!(
            peak = pattern.peak_size(),
            buffers = pattern.len(),
            "pattern installed"
        );
        let new_entry = CacheEntry {
            pattern: Arc::new(pattern),
            arena,
            last_used: self.clock,
        };
        match self.entries.entry(signature) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(new_entry);
                Ok(occupied.into_mut())
            }
            Entry::Vacant(vacant) => Ok(vacant.insert(new_entry)),
        }
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            entries: self.entries.len(),
        }
    }

    /// Number of cached patterns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no patterns
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries and their arenas; counters are kept
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_lru(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(sig, _)| sig.clone());

        if let Some(sig) = victim {
            self.entries.remove(&sig);
            self.evictions += 1;
            tracing::debug!(inputs = sig.input_count(), "pattern evicted");
        }
    }
}
