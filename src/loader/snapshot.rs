//! The observable state published by the loader.

use image::RgbaImage;

use crate::error::FetchError;
use crate::request::ImageRequest;
use crate::SharedImage;

use super::phase::LoadPhase;

// =============================================================================
// Progress
// =============================================================================

/// Download progress of one fetch attempt.
///
/// `total` is a best-effort estimate; 0 means unknown. `completed` is
/// monotonically non-decreasing within a single attempt and both fields are
/// reset to zero at the start of every new asynchronous attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Units (typically bytes) received so far.
    pub completed: u64,

    /// Best-guess total units, 0 when unknown.
    pub total: u64,
}

impl Progress {
    /// The completed fraction in `0.0..=1.0`, or `None` while `total` is
    /// unknown.
    pub fn fraction(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.completed as f64 / self.total as f64)
        }
    }

    /// Merge a pipeline report into this progress value.
    ///
    /// `completed` never goes backwards within one attempt, and a known
    /// `total` is never overwritten by an unknown one.
    pub fn advanced(self, completed: u64, total: u64) -> Self {
        Self {
            completed: self.completed.max(completed),
            total: if total == 0 { self.total } else { total },
        }
    }
}

// =============================================================================
// Loader Snapshot
// =============================================================================

/// One coherent view of every observable loader field.
///
/// The loader publishes a full snapshot through a `tokio::sync::watch`
/// channel on every applied transition, so observers always read a
/// consistent set of fields. Intermediate snapshots may coalesce under load;
/// the last one is always delivered.
#[derive(Debug, Clone, Default)]
pub struct LoaderSnapshot {
    /// The fetched image, or the latest partial decode while downloading.
    ///
    /// Survives `cancel()`; cleared only by `reset()` or replaced by a newer
    /// load.
    pub image: Option<SharedImage>,

    /// The failure of the previous attempt, if any. Cleared when a new load
    /// starts.
    pub error: Option<FetchError>,

    /// `true` while an asynchronous fetch is in flight. Cache-resident loads
    /// resolve synchronously and never observably set this.
    pub is_loading: bool,

    /// Download progress of the current attempt.
    pub progress: Progress,

    /// The currently active (or last issued) request.
    pub request: Option<ImageRequest>,

    /// Where the load lifecycle currently stands.
    pub phase: LoadPhase,
}

impl LoaderSnapshot {
    /// A renderable RGBA copy of [`image`](Self::image) for display layers.
    pub fn renderable(&self) -> Option<RgbaImage> {
        self.image.as_ref().map(|image| image.to_rgba8())
    }
}

// =============================================================================
// Tests
// =============================================================================
