//! Core types for memory-pattern planning
//!
//! This module contains the value types shared by the planner and the
//! emitted patterns: byte-range blocks, the append-only allocation log
//! entry, and the planner error/result types.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during a planning trace
#[derive(Error, Debug)]
pub enum PlannerError {
    /// The planner has already emitted its pattern
    #[error("planner already finalized; call reset() before tracing again")]
    AlreadyFinalized,
}

/// Result type for planner operations
pub type PlanResult<T> = Result<T, PlannerError>;

/// Identifier for a logical buffer slot in the execution plan
///
/// Typically an operator-output index assigned by the execution engine.
/// Unique per allocation call within one trace; may repeat across traces.
pub type ValueId = usize;

/// A contiguous byte range inside the arena
///
/// `(0, 0)` is the sentinel for a zero-byte allocation; it carries no
/// placement meaning and never enters the live-block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryBlock {
    /// Byte offset from arena start
    pub offset: usize,
    /// Size in bytes
    pub size: usize,
}

impl MemoryBlock {
    /// Create a new block
    pub fn new(offset: usize, size: usize) -> Self {
        Self { offset, size }
    }

    /// First byte past this block
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Check strict non-overlap against another block
    pub fn overlaps(&self, other: &MemoryBlock) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// One entry in the planner's append-only allocation log
///
/// A record is appended per allocation request, in request order, and is
/// never rewritten once created.
#[derive(Debug, Clone, Copy)]
pub struct AllocationRecord {
    /// Logical buffer slot this allocation belongs to
    pub value_id: ValueId,
    /// Placement assigned by the planner
    pub block: MemoryBlock,
}

impl AllocationRecord {
    /// Create a new record
    pub fn new(value_id: ValueId, block: MemoryBlock) -> Self {
        Self { value_id, block }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_end() {
        let block = MemoryBlock::new(100, 50);
        assert_eq!(block.end(), 150);
        assert_eq!(MemoryBlock::new(0, 0).end(), 0);
    }

    #[test]
    fn test_block_overlap() {
        let a = MemoryBlock::new(0, 100);
        let b = MemoryBlock::new(100, 50);
        let c = MemoryBlock::new(50, 100);

        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_zero_size_blocks_never_overlap() {
        let sentinel = MemoryBlock::new(0, 0);
        let a = MemoryBlock::new(0, 100);
        assert!(!sentinel.overlaps(&a));
        assert!(!a.overlaps(&sentinel));
    }
}
