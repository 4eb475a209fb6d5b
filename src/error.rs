//! Unified error handling for memforge
//!
//! This module provides a centralized error type that consolidates the
//! domain-specific errors of the crate. It implements error categorization
//! for:
//! - User errors (recoverable, actionable by callers)
//! - Recoverable errors (temporary conditions such as memory pressure)
//! - Internal errors (bugs, misuse of the planning state machine)

use crate::cache::CacheError;
use crate::engine::EngineError;
use crate::memory::MemError;
use crate::planner::{PatternError, PlannerError};

/// Unified error type for memforge
///
/// Consolidates the module-level errors into a single type for callers
/// that drive the whole trace/replay pipeline. Supports categorization via
/// the `category()` method.
#[derive(Debug, thiserror::Error)]
pub enum MemForgeError {
    /// Planning trace misuse
    #[error("planner error: {0}")]
    Planner(#[from] PlannerError),

    /// Pattern replay failure
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Arena or allocator failure
    #[error("memory error: {0}")]
    Memory(#[from] MemError),

    /// Pattern cache failure
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Engine-level failure
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Result type alias using the unified error
pub type ForgeResult<T> = Result<T, MemForgeError>;

/// Category of an error, for handling decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Actionable by the caller (bad ids, unknown signatures)
    User,
    /// Temporary conditions that may succeed on retry (memory pressure)
    Recoverable,
    /// Bugs or state-machine misuse
    Internal,
}

impl MemForgeError {
    /// Categorize the error for handling decisions
    pub fn category(&self) -> ErrorCategory {
        match self {
            MemForgeError::Pattern(PatternError::ValueNotFound(_)) => ErrorCategory::User,

            MemForgeError::Memory(MemError::AllocationFailed { .. })
            | MemForgeError::Cache(CacheError::Memory(MemError::AllocationFailed { .. })) => {
                ErrorCategory::Recoverable
            }

            MemForgeError::Engine(inner) => match inner {
                EngineError::PatternNotCached => ErrorCategory::User,
                EngineError::Pattern(PatternError::ValueNotFound(_)) => ErrorCategory::User,
                EngineError::Cache(CacheError::Memory(MemError::AllocationFailed { .. })) => {
                    ErrorCategory::Recoverable
                }
                _ => ErrorCategory::Internal,
            },

            _ => ErrorCategory::Internal,
        }
    }
}
