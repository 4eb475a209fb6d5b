//! Engine statistics
//!
//! This module provides [`EngineStats`], a snapshot of run counters and
//! pattern-cache state for monitoring and diagnostics.

use crate::cache::CacheStats;
use serde::Serialize;

/// Runtime statistics for the pattern engine
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineStats {
    /// Total runs driven through the engine
    pub runs: u64,

    /// Runs that required a fresh planning trace
    pub traced: u64,

    /// Runs satisfied from the pattern cache
    pub replayed: u64,

    /// Pattern-cache counters
    pub cache: CacheStats,
}

impl EngineStats {
    /// Fraction of runs replayed from cache, 0.0 when no runs happened
    pub fn replay_ratio(&self) -> f64 {
        if self.runs == 0 {
            return 0.0;
        }
        self.replayed as f64 / self.runs as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_ratio() {
        let stats = EngineStats {
            runs: 4,
            traced: 1,
            replayed: 3,
            cache: CacheStats::default(),
        };
        assert!((stats.replay_ratio() - 0.75).abs() < f64::EPSILON);

        let empty = EngineStats {
            runs: 0,
            traced: 0,
            replayed: 0,
            cache: CacheStats::default(),
        };
        assert_eq!(empty.replay_ratio(), 0.0);
    }
}
