//! Traits a fetch/cache pipeline must implement.

use crate::request::{ImageRequest, Priority};
use crate::SharedImage;

use super::events::EventSink;

/// A fetch/cache pipeline the loader drives.
///
/// Implementations own networking, disk/memory caching and image decoding.
/// The loader only issues lookup, fetch and cancel requests against them; the
/// pipeline itself is a long-lived, shared resource the loader never owns.
///
/// # Contract
///
/// - [`cached`](Self::cached) is synchronous and non-blocking, with no side
///   effects on a miss.
/// - [`fetch`](Self::fetch) returns immediately after scheduling work. The
///   pipeline reports through the [`EventSink`]: zero or more progress
///   reports (optionally carrying a partial decode), then exactly one
///   completion, unless the task is cancelled first, in which case the
///   completion must not be delivered. [`EventSink::finish`] consumes the
///   sink, so "exactly once" is enforced by the type system.
///
/// The loader additionally discards any event arriving from a retired fetch,
/// so a pipeline that keeps reporting after cancellation cannot corrupt
/// observable state.
pub trait FetchPipeline: Send + Sync + 'static {
    /// Handle type for an in-flight fetch scheduled by this pipeline.
    type Task: FetchTask;

    /// Synchronous cache probe.
    ///
    /// Returns the decoded image if `request` is cache-resident, `None`
    /// otherwise. Must not block and must not start any work on a miss.
    fn cached(&self, request: &ImageRequest) -> Option<SharedImage>;

    /// Start an asynchronous fetch for `request`, reporting through `events`.
    fn fetch(&self, request: ImageRequest, events: EventSink) -> Self::Task;
}

/// Handle to an in-flight fetch.
///
/// The loader owns at most one task at a time; a superseded task is
/// cancelled, never reused.
pub trait FetchTask: Send + Sync + 'static {
    /// Cancel the fetch.
    ///
    /// Idempotent and non-blocking. After this returns the pipeline must stop
    /// reporting on the task's sink; in particular the completion must never
    /// be delivered.
    fn cancel(&self);

    /// Update the task's scheduling priority.
    ///
    /// Best-effort; may be applied to an already-running fetch.
    fn set_priority(&self, priority: Priority);
}
