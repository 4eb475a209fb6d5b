//! Shape signatures
//!
//! A memory pattern is only valid for executions whose tensor shapes match
//! the trace that produced it. [`ShapeSignature`] is the cache key that
//! captures this: a canonical encoding of the input shape set, compared and
//! hashed structurally. The planner treats it as opaque.

use serde::Serialize;

/// Cache key derived from the input tensor shapes of one execution
///
/// Two executions share a signature exactly when their input shapes match
/// dimension for dimension, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ShapeSignature {
    dims: Vec<Vec<usize>>,
}

impl ShapeSignature {
    /// Build a signature from per-input dimension lists
    pub fn from_shapes<S: AsRef<[usize]>>(shapes: &[S]) -> Self {
        Self {
            dims: shapes.iter().map(|s| s.as_ref().to_vec()).collect(),
        }
    }

    /// Number of input shapes captured
    pub fn input_count(&self) -> usize {
        self.dims.len()
    }

    /// Total element count across all inputs, for logging
    pub fn total_elements(&self) -> usize {
        self.dims
            .iter()
            .map(|d| d.iter().product::<usize>())
            .sum()
    }
}
