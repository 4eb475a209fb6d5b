//! Integration tests for the pattern cache, replay arenas, and the engine

use anyhow::{Context, Result};
use memforge::{
    EngineConfig, MemPatternPlanner, PatternCache, PatternEngine, ShapeSignature,
    SystemAllocator, TraceEvent,
};
use std::sync::Arc;

fn attention_like_events() -> Vec<TraceEvent> {
    // Rough shape of one transformer block: qkv projections live together,
    // scores are transient, the output outlives the rest.
    vec![
        TraceEvent::Alloc(0, 4096),  // q
        TraceEvent::Alloc(1, 4096),  // k
        TraceEvent::Alloc(2, 4096),  // v
        TraceEvent::Alloc(3, 16384), // scores
        TraceEvent::Free(0),
        TraceEvent::Free(1),
        TraceEvent::Alloc(4, 4096), // context
        TraceEvent::Free(3),
        TraceEvent::Free(2),
        TraceEvent::Alloc(5, 4096), // output
        TraceEvent::Free(4),
        TraceEvent::Free(5),
    ]
}

#[test]
fn test_trace_then_replay_end_to_end() -> Result<()> {
    memforge::init_logging_default();
    let mut engine =
        PatternEngine::new(EngineConfig::default(), Arc::new(SystemAllocator::new()));
    let shapes = [vec![1usize, 128, 768]];
    let events = attention_like_events();

    let first = engine
        .run(&shapes, &events)
        .context("first run should trace")?;
    assert!(!first.was_replayed());

    let second = engine
        .run(&shapes, &events)
        .context("second run should replay")?;
    assert!(second.was_replayed());
    assert_eq!(first.peak_size(), second.peak_size());

    // Every traced id resolves inside the arena.
    let base = engine.arena_base(&shapes)?;
    for id in 0..=5usize {
        let addr = engine.resolve(&shapes, id)?;
        assert!(addr >= base);
        assert!(addr < base + first.peak_size());
    }
    Ok(())
}

#[test]
fn test_resolved_addresses_follow_pattern_offsets() -> Result<()> {
    let allocator = Arc::new(SystemAllocator::new());
    let mut cache = PatternCache::new(4, allocator);

    let mut planner = MemPatternPlanner::new();
    planner.trace_allocation(10, 1000)?;
    planner.trace_allocation(11, 500)?;
    planner.trace_free(10)?;
    planner.trace_allocation(12, 800)?;
    let pattern = planner.generate_pattern()?;

    let signature = ShapeSignature::from_shapes(&[vec![8usize, 8]]);
    cache.install(signature.clone(), pattern)?;

    let entry = cache.lookup(&signature).context("entry just installed")?;
    let base = entry.arena().base_addr();
    let pattern = entry.pattern();
    for id in [10usize, 11, 12] {
        let block = pattern.get(id).context("id was traced")?;
        assert_eq!(entry.resolve(id)?, base + block.offset);
    }
    assert_eq!(entry.arena().len(), pattern.peak_size());
    Ok(())
}

#[test]
fn test_arenas_released_when_entries_evicted() -> Result<()> {
    let allocator = Arc::new(SystemAllocator::new());
    let mut engine = PatternEngine::new(
        EngineConfig::new().with_max_cached_patterns(2),
        allocator.clone(),
    );
    let events = attention_like_events();

    for batch in 1..=5usize {
        engine.run(&[vec![batch, 128]], &events)?;
    }

    // Only two arenas may be outstanding, regardless of how many
    // signatures were traced.
    assert_eq!(allocator.live_allocations(), 2);
    assert_eq!(engine.stats().cache.entries, 2);
    assert_eq!(engine.stats().cache.evictions, 3);
    Ok(())
}

#[test]
fn test_shared_patterns_survive_cache_interaction() -> Result<()> {
    // A pattern handle taken from the cache stays valid while executions
    // hold it, independent of the cache's own lifetime.
    let allocator = Arc::new(SystemAllocator::new());
    let mut cache = PatternCache::new(2, allocator);

    let mut planner = MemPatternPlanner::new();
    planner.trace_allocation(0, 256)?;
    let pattern = planner.generate_pattern()?;

    let signature = ShapeSignature::from_shapes(&[vec![2usize]]);
    cache.install(signature.clone(), pattern)?;
    let held = cache
        .lookup(&signature)
        .context("just installed")?
        .pattern()
        .clone();

    cache.clear();
    assert_eq!(held.peak_size(), 256);
    assert_eq!(held.resolve(0, 0)?, 0);
    Ok(())
}

#[test]
fn test_distinct_signatures_get_distinct_arenas() -> Result<()> {
    let mut engine =
        PatternEngine::new(EngineConfig::default(), Arc::new(SystemAllocator::new()));
    let events = attention_like_events();

    let small = [vec![1usize, 64]];
    let large = [vec![1usize, 512]];
    engine.run(&small, &events)?;
    engine.run(&large, &events)?;

    let base_small = engine.arena_base(&small)?;
    let base_large = engine.arena_base(&large)?;
    assert_ne!(base_small, base_large);
    Ok(())
}

#[test]
fn test_engine_stats_serialize() -> Result<()> {
    let mut engine =
        PatternEngine::new(EngineConfig::default(), Arc::new(SystemAllocator::new()));
    let events = attention_like_events();
    let shapes = [vec![1usize, 32]];
    engine.run(&shapes, &events)?;
    engine.run(&shapes, &events)?;

    let stats = engine.stats();
    assert_eq!(stats.runs, 2);
    assert_eq!(stats.traced, 1);
    assert_eq!(stats.replayed, 1);

    let dump = serde_json::to_value(stats)?;
    assert_eq!(dump["cache"]["hits"], 1);
    assert_eq!(dump["cache"]["entries"], 1);
    Ok(())
}
