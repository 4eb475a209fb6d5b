//! Trace/replay driver
//!
//! [`PatternEngine`] ties the pieces together the way an execution engine
//! uses them: each run presents its input shapes and its ordered buffer
//! events; on the first run for a shape signature the events are traced
//! through a fresh [`MemPatternPlanner`] and the resulting pattern is
//! installed in the cache with its arena; every later run with the same
//! shapes replays the cached layout and resolves buffer addresses without
//! planning or allocating.

use crate::cache::{PatternCache, ShapeSignature};
use crate::engine::config::EngineConfig;
use crate::engine::stats::EngineStats;
use crate::engine::types::{EngineError, EngineResult, RunOutcome, TraceEvent};
use crate::memory::DeviceAllocator;
use crate::planner::{MemPatternPlanner, MemoryPattern, ValueId};
use std::sync::Arc;

/// Drives tracing and replay of memory patterns per shape signature
pub struct PatternEngine {
    config: EngineConfig,
    cache: PatternCache,
    runs: u64,
    traced: u64,
    replayed: u64,
}

impl PatternEngine {
    /// Create an engine that allocates replay arenas from `allocator`
    pub fn new(config: EngineConfig, allocator: Arc<dyn DeviceAllocator>) -> Self {
        let cache = PatternCache::new(config.max_cached_patterns, allocator);
        Self {
            config,
            cache,
            runs: 0,
            traced: 0,
            replayed: 0,
        }
    }

    /// Satisfy one execution's memory layout
    ///
    /// `shapes` are the run's input tensor shapes; `events` the ordered
    /// allocate/free sequence the execution produces. A cache hit replays
    /// without consuming `events`; a miss traces them and, when patterns
    /// are enabled, installs the result.
    ///
    /// # Errors
    /// Planner and arena-allocation failures propagate as
    /// [`EngineError`] variants.
    pub fn run<S: AsRef<[usize]>>(
        &mut self,
        shapes: &[S],
        events: &[TraceEvent],
    ) -> EngineResult<RunOutcome> {
        self.runs += 1;
        let signature = ShapeSignature::from_shapes(shapes);

        if self.config.enable_mem_pattern {
            if let Some(entry) = self.cache.lookup(&signature) {
                let peak_size = entry.pattern().peak_size();
                self.replayed += 1;
                tracing::debug!(peak = peak_size, "replaying cached memory pattern");
                return Ok(RunOutcome::Replayed { peak_size });
            }
        }

        let pattern = Self::trace(events)?;
        let peak_size = pattern.peak_size();
        if self.config.enable_mem_pattern {
            self.cache.install(signature, pattern)?;
        }
        self.traced += 1;
        tracing::debug!(peak = peak_size, "traced new memory pattern");
        Ok(RunOutcome::Traced { peak_size })
    }

    /// Resolve `value_id` to an address in the cached arena for `shapes`
    ///
    /// # Errors
    /// [`EngineError::PatternNotCached`] when no pattern exists for the
    /// signature (never traced, evicted, or patterns disabled);
    /// [`EngineError::Pattern`] when the id was not part of the trace.
    pub fn resolve<S: AsRef<[usize]>>(
        &mut self,
        shapes: &[S],
        value_id: ValueId,
    ) -> EngineResult<usize> {
        let signature = ShapeSignature::from_shapes(shapes);
        let entry = self
            .cache
            .lookup(&signature)
            .ok_or(EngineError::PatternNotCached)?;
        Ok(entry.resolve(value_id)?)
    }

    /// Arena base address for the cached pattern of `shapes`
    ///
    /// # Errors
    /// [`EngineError::PatternNotCached`] when no pattern exists for the
    /// signature.
    pub fn arena_base<S: AsRef<[usize]>>(&mut self, shapes: &[S]) -> EngineResult<usize> {
        let signature = ShapeSignature::from_shapes(shapes);
        let entry = self
            .cache
            .lookup(&signature)
            .ok_or(EngineError::PatternNotCached)?;
        Ok(entry.arena().base_addr())
    }

    /// Snapshot of run and cache counters
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            runs: self.runs,
            traced: self.traced,
            replayed: self.replayed,
            cache: self.cache.stats(),
        }
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn trace(events: &[TraceEvent]) -> EngineResult<MemoryPattern> {
        let mut planner = MemPatternPlanner::new();
        for event in events {
            match *event {
                TraceEvent::Alloc(value_id, size) => planner.trace_allocation(value_id, size)?,
                TraceEvent::Free(value_id) => planner.trace_free(value_id)?,
            }
        }
        Ok(planner.generate_pattern()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SystemAllocator;

    fn engine() -> PatternEngine {
        PatternEngine::new(EngineConfig::default(), Arc::new(SystemAllocator::new()))
    }

    const EVENTS: &[TraceEvent] = &[
        TraceEvent::Alloc(1, 100),
        TraceEvent::Alloc(2, 50),
        TraceEvent::Free(1),
        TraceEvent::Alloc(3, 80),
        TraceEvent::Free(2),
        TraceEvent::Free(3),
    ];

    #[test]
    fn test_first_run_traces_second_replays() {
        let mut engine = engine();
        let shapes = [vec![1usize, 128]];

        let first = engine.run(&shapes, EVENTS).unwrap();
        assert_eq!(first, RunOutcome::Traced { peak_size: 150 });

        let second = engine.run(&shapes, EVENTS).unwrap();
        assert_eq!(second, RunOutcome::Replayed { peak_size: 150 });

        let stats = engine.stats();
        assert_eq!(stats.runs, 2);
        assert_eq!(stats.traced, 1);
        assert_eq!(stats.replayed, 1);
    }

    #[test]
    fn test_distinct_shapes_trace_separately() {
        let mut engine = engine();
        engine.run(&[vec![1usize, 128]], EVENTS).unwrap();
        let outcome = engine.run(&[vec![1usize, 256]], EVENTS).unwrap();
        assert!(!outcome.was_replayed());
        assert_eq!(engine.stats().cache.entries, 2);
    }

    #[test]
    fn test_resolve_after_trace() {
        let mut engine = engine();
        let shapes = [vec![4usize, 4]];
        engine.run(&shapes, EVENTS).unwrap();

        let base = engine.arena_base(&shapes).unwrap();
        assert_eq!(engine.resolve(&shapes, 1).unwrap(), base);
        assert_eq!(engine.resolve(&shapes, 2).unwrap(), base + 100);
        assert_eq!(engine.resolve(&shapes, 3).unwrap(), base);
    }

    #[test]
    fn test_resolve_unknown_shapes_fails() {
        let mut engine = engine();
        assert!(matches!(
            engine.resolve(&[vec![9usize]], 1),
            Err(EngineError::PatternNotCached)
        ));
    }

    #[test]
    fn test_disabled_patterns_always_trace() {
        let config = EngineConfig::new().with_mem_pattern(false);
        let mut engine = PatternEngine::new(config, Arc::new(SystemAllocator::new()));
        let shapes = [vec![1usize, 128]];

        assert!(!engine.run(&shapes, EVENTS).unwrap().was_replayed());
        assert!(!engine.run(&shapes, EVENTS).unwrap().was_replayed());
        assert_eq!(engine.stats().cache.entries, 0);
        assert!(matches!(
            engine.resolve(&shapes, 1),
            Err(EngineError::PatternNotCached)
        ));
    }
}
