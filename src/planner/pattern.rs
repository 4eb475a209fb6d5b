//! Finalized memory patterns
//!
//! A [`MemoryPattern`] is the immutable output of one planning trace: the
//! peak arena size plus the offset assigned to every traced buffer. It
//! outlives the planner that produced it and is safe to share across
//! execution threads replaying against independent arenas.

use crate::planner::types::{MemoryBlock, ValueId};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from replaying a finalized pattern
#[derive(Error, Debug)]
pub enum PatternError {
    /// The requested buffer was never traced
    #[error("value {0} not present in memory pattern")]
    ValueNotFound(ValueId),
}

/// Result type for pattern replay operations
pub type PatternResult<T> = Result<T, PatternError>;

/// Immutable placement table for one plan execution
///
/// Maps every traced [`ValueId`] to its arena block. Zero-size buffers are
/// present with the `(0, 0)` sentinel, so resolving them yields the arena
/// base.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryPattern {
    peak_size: usize,
    placements: HashMap<ValueId, MemoryBlock>,
}

impl MemoryPattern {
    /// Build a pattern from a finished trace
    pub(crate) fn new(peak_size: usize, placements: HashMap<ValueId, MemoryBlock>) -> Self {
        Self {
            peak_size,
            placements,
        }
    }

    /// Total arena bytes required to replay this pattern
    pub fn peak_size(&self) -> usize {
        self.peak_size
    }

    /// Placement for `value_id`, if it was traced
    pub fn get(&self, value_id: ValueId) -> Option<&MemoryBlock> {
        self.placements.get(&value_id)
    }

    /// Resolve `value_id` to an address inside an arena at `arena_base`
    ///
    /// # Errors
    /// Returns [`PatternError::ValueNotFound`] if `value_id` was never
    /// traced.
    pub fn resolve(&self, arena_base: usize, value_id: ValueId) -> PatternResult<usize> {
        self.placements
            .get(&value_id)
            .map(|block| arena_base + block.offset)
            .ok_or(PatternError::ValueNotFound(value_id))
    }

    /// Number of buffers in this pattern
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Whether the pattern contains no buffers
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Iterate over all placements in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&ValueId, &MemoryBlock)> {
        self.placements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryPattern {
        let mut placements = HashMap::new();
        placements.insert(1, MemoryBlock::new(0, 100));
        placements.insert(2, MemoryBlock::new(100, 50));
        placements.insert(3, MemoryBlock::new(0, 0));
        MemoryPattern::new(150, placements)
    }

    #[test]
    fn test_resolve_adds_base() {
        let pattern = sample();
        assert_eq!(pattern.resolve(0x1000, 1).unwrap(), 0x1000);
        assert_eq!(pattern.resolve(0x1000, 2).unwrap(), 0x1000 + 100);
    }

    #[test]
    fn test_resolve_zero_size_yields_base() {
        let pattern = sample();
        assert_eq!(pattern.resolve(0x2000, 3).unwrap(), 0x2000);
    }

    #[test]
    fn test_resolve_unknown_id_fails() {
        let pattern = sample();
        assert!(matches!(
            pattern.resolve(0x1000, 99),
            Err(PatternError::ValueNotFound(99))
        ));
    }

    #[test]
    fn test_pattern_len() {
        let pattern = sample();
        assert_eq!(pattern.len(), 3);
        assert!(!pattern.is_empty());
    }
}
