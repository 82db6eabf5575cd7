//! Request descriptors and fetch priorities.

use std::sync::Arc;

// =============================================================================
// Priority
// =============================================================================

/// Ordering hint for pipeline scheduling.
///
/// Priorities are totally ordered: `VeryLow < Low < Normal < High < VeryHigh`.
/// The loader forwards priority changes to an in-flight task without
/// restarting it; whether the pipeline honors them is best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    VeryLow,
    Low,
    #[default]
    Normal,
    High,
    VeryHigh,
}

// =============================================================================
// Image Request
// =============================================================================

/// An immutable descriptor of what to fetch.
///
/// A request is a resource URL plus a [`Priority`] hint. It is cheap to clone
/// (the URL is reference-counted) and implements `Eq + Hash` so pipelines can
/// key caches and dedup maps on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRequest {
    url: Arc<str>,
    priority: Priority,
}

impl ImageRequest {
    /// Create a request with the default (`Normal`) priority.
    pub fn new(url: impl Into<Arc<str>>) -> Self {
        Self {
            url: url.into(),
            priority: Priority::default(),
        }
    }

    /// Create a request with an explicit priority hint.
    pub fn with_priority(url: impl Into<Arc<str>>, priority: Priority) -> Self {
        Self {
            url: url.into(),
            priority,
        }
    }

    /// The resource URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The priority hint the request was created with.
    pub fn priority(&self) -> Priority {
        self.priority
    }
}

// =============================================================================
// Tests
// =============================================================================
