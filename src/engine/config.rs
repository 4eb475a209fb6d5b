//! Configuration for the pattern engine
//!
//! This module defines [`EngineConfig`] which controls whether memory
//! patterns are cached and how many shape signatures the cache may hold.

/// Configuration for the pattern engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cache and replay memory patterns; when false every run is traced
    /// and nothing is cached
    pub enable_mem_pattern: bool,

    /// Maximum number of shape signatures kept in the pattern cache
    pub max_cached_patterns: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            enable_mem_pattern: true,
            max_cached_patterns: 16,
        }
    }
}

impl EngineConfig {
    /// Create a new engine config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable pattern caching
    pub fn with_mem_pattern(mut self, enable_mem_pattern: bool) -> Self {
        self.enable_mem_pattern = enable_mem_pattern;
        self
    }

    /// Set the pattern cache capacity
    pub fn with_max_cached_patterns(mut self, max_cached_patterns: usize) -> Self {
        self.max_cached_patterns = max_cached_patterns;
        self
    }
}
