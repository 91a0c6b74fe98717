//! Graph configuration.

use derive_builder::Builder;

/// Configuration for a [`Graph`](crate::Graph).
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct GraphConfig {
    /// Maximum nesting of plug evaluations before evaluation fails with
    /// [`GraphError::RecursionLimit`](crate::GraphError::RecursionLimit).
    #[builder(default = "256")]
    pub max_evaluation_depth: usize,

    /// Maximum number of events dispatched by a single edit before it fails
    /// with [`GraphError::EventCascade`](crate::GraphError::EventCascade).
    #[builder(default = "10_000")]
    pub max_event_cascade: usize,

    /// Maximum number of `(plug, context)` hashes kept in the hash cache.
    ///
    /// Zero disables hash caching.
    #[builder(default = "16_384")]
    pub hash_cache_capacity: usize,

    /// Maximum number of computed values kept in the value cache.
    ///
    /// Zero disables value caching.
    #[builder(default = "4096")]
    pub value_cache_capacity: usize,
}

impl GraphConfig {
    /// Returns a builder for creating a graph configuration.
    pub fn builder() -> GraphConfigBuilder {
        GraphConfigBuilder::default()
    }
}

impl GraphConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(depth) = self.max_evaluation_depth {
            if depth == 0 {
                return Err("max_evaluation_depth must be at least 1".into());
            }
        }
        if let Some(limit) = self.max_event_cascade {
            if limit == 0 {
                return Err("max_event_cascade must be at least 1".into());
            }
        }
        Ok(())
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_evaluation_depth: 256,
            max_event_cascade: 10_000,
            hash_cache_capacity: 16_384,
            value_cache_capacity: 4096,
        }
    }
}
