//! Allocation-pattern planner
//!
//! [`MemPatternPlanner`] traces one execution's allocate/free steps and
//! assigns non-overlapping arena offsets using best-fit placement over the
//! currently live blocks. The resulting [`MemoryPattern`] is recorded once
//! and replayed for future executions with the same input shapes, so the
//! real allocator is never called per buffer after the first run.
//!
//! The planner performs *simulated* allocation only: it never touches
//! physical memory, and the live-block index it maintains exists only for
//! the duration of a single trace.

use crate::planner::pattern::MemoryPattern;
use crate::planner::types::{AllocationRecord, MemoryBlock, PlanResult, PlannerError, ValueId};
use std::collections::HashMap;

/// Traces allocation/free steps of one plan execution and emits a reusable
/// placement pattern.
///
/// Offsets are assigned online, one allocation per call, with no look-ahead
/// and no reordering: among the gaps between live blocks that can hold the
/// request, the one wasting the fewest bytes wins, ties going to the lowest
/// offset. When no gap fits, the request is placed past the last live block.
///
/// # Thread Safety
///
/// A planner traces exactly one execution and is not internally
/// synchronized; drive it from a single logical thread, or use one planner
/// per concurrent trace.
///
/// # Example
///
/// ```
/// use memforge::planner::MemPatternPlanner;
///
/// let mut planner = MemPatternPlanner::new();
/// planner.trace_allocation(0, 256)?;
/// planner.trace_allocation(1, 128)?;
/// planner.trace_free(0)?;
/// planner.trace_allocation(2, 200)?;
///
/// let pattern = planner.generate_pattern()?;
/// assert_eq!(pattern.peak_size(), 384);
/// # Ok::<(), memforge::planner::PlannerError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemPatternPlanner {
    /// Append-only log of every allocation request, in request order
    allocs: Vec<AllocationRecord>,
    /// Indices into `allocs` for blocks currently live, sorted by ascending
    /// block offset
    blocks: Vec<usize>,
    /// Largest `offset + size` seen so far
    peak_size: usize,
    /// Set once the pattern has been emitted
    finalized: bool,
}

impl MemPatternPlanner {
    /// Create a planner for a new trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an allocation of `size` bytes for `value_id`
    ///
    /// Zero-size requests are logged with the `(0, 0)` sentinel block and
    /// occupy no arena space.
    ///
    /// # Errors
    /// Returns [`PlannerError::AlreadyFinalized`] if the pattern has already
    /// been emitted and the planner was not reset.
    pub fn trace_allocation(&mut self, value_id: ValueId, size: usize) -> PlanResult<()> {
        self.check_tracing()?;

        if size == 0 {
            self.allocs
                .push(AllocationRecord::new(value_id, MemoryBlock::new(0, 0)));
            return Ok(());
        }

        let mut cursor = 0usize;
        let mut waste_bytes = usize::MAX;

        // Fallback: append past the last live block (largest offset).
        let mut best_offset = match self.blocks.last() {
            Some(&last) => self.allocs[last].block.end(),
            None => 0,
        };
        let mut insert_at = self.blocks.len();

        for (pos, &log_idx) in self.blocks.iter().enumerate() {
            let live = self.allocs[log_idx].block;
            if live.offset >= cursor {
                let gap = live.offset - cursor;
                if gap >= size && gap - size < waste_bytes {
                    insert_at = pos;
                    waste_bytes = gap - size;
                    best_offset = cursor;
                }
            }
            cursor = live.end();
        }

        let block = MemoryBlock::new(best_offset, size);
        self.allocs.push(AllocationRecord::new(value_id, block));
        self.peak_size = self.peak_size.max(block.end());
        self.blocks.insert(insert_at, self.allocs.len() - 1);

        tracing::trace!(
            value_id,
            size,
            offset = best_offset,
            peak = self.peak_size,
            "traced allocation"
        );
        Ok(())
    }

    /// Record that `value_id`'s buffer is released
    ///
    /// Removes the first live entry matching `value_id` in index order.
    /// Freeing a zero-size id, or an id that is not currently live, is
    /// tolerated as a no-op and diagnosed with a warning.
    ///
    /// # Errors
    /// Returns [`PlannerError::AlreadyFinalized`] if the pattern has already
    /// been emitted and the planner was not reset.
    pub fn trace_free(&mut self, value_id: ValueId) -> PlanResult<()> {
        self.check_tracing()?;

        match self
            .blocks
            .iter()
            .position(|&log_idx| self.allocs[log_idx].value_id == value_id)
        {
            Some(pos) => {
                self.blocks.remove(pos);
                tracing::trace!(value_id, live = self.blocks.len(), "traced free");
            }
            None => {
                tracing::warn!(value_id, "trace_free for id with no live block");
            }
        }
        Ok(())
    }

    /// Emit the placement pattern and finalize this trace
    ///
    /// Includes every logged allocation, zero-size entries mapped to
    /// `(0, 0)`. Leftover live blocks do not block emission; an unbalanced
    /// trace indicates a planning bug upstream and is diagnosed with a
    /// warning.
    ///
    /// # Errors
    /// Returns [`PlannerError::AlreadyFinalized`] on a second call without
    /// an intervening [`reset`](Self::reset).
    pub fn generate_pattern(&mut self) -> PlanResult<MemoryPattern> {
        self.check_tracing()?;
        self.finalized = true;

        if !self.blocks.is_empty() {
            tracing::warn!(
                leftover = self.blocks.len(),
                "trace finalized with live blocks remaining"
            );
        }

        let mut placements: HashMap<ValueId, MemoryBlock> =
            HashMap::with_capacity(self.allocs.len());
        for record in &self.allocs {
            placements.insert(record.value_id, record.block);
        }

        tracing::debug!(
            peak = self.peak_size,
            buffers = placements.len(),
            "memory pattern generated"
        );
        Ok(MemoryPattern::new(self.peak_size, placements))
    }

    /// Clear all state so the planner can trace a new execution
    pub fn reset(&mut self) {
        self.allocs.clear();
        self.blocks.clear();
        self.peak_size = 0;
        self.finalized = false;
    }

    /// Peak arena size tracked so far, in bytes
    pub fn peak_size(&self) -> usize {
        self.peak_size
    }

    /// Total allocation requests logged so far
    pub fn allocation_count(&self) -> usize {
        self.allocs.len()
    }

    /// Number of blocks currently live in the trace
    pub fn live_count(&self) -> usize {
        self.blocks.len()
    }

    fn check_tracing(&self) -> PlanResult<()> {
        if self.finalized {
            return Err(PlannerError::AlreadyFinalized);
        }
        Ok(())
    }

    /// Live blocks in ascending-offset order, for invariant checks
    #[cfg(test)]
    fn live_blocks(&self) -> Vec<MemoryBlock> {
        self.blocks.iter().map(|&i| self.allocs[i].block).collect()
    }
}
