//! The reporting channel between a pipeline fetch and the loader.

use tokio::sync::mpsc;

use crate::error::FetchError;
use crate::SharedImage;

/// An event reported by a fetch.
#[derive(Debug)]
pub(crate) enum FetchEvent {
    /// A progress report, optionally carrying a partially decoded image.
    Progress {
        partial: Option<SharedImage>,
        completed: u64,
        total: u64,
    },

    /// The final outcome. Delivered at most once per fetch.
    Finished(Result<SharedImage, FetchError>),
}

/// Receiving half of a fetch's event channel, consumed by the loader.
pub(crate) type EventReceiver = mpsc::UnboundedReceiver<FetchEvent>;

/// Create a fresh event channel for one fetch.
pub(crate) fn event_channel() -> (EventSink, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, rx)
}

// =============================================================================
// Event Sink
// =============================================================================

/// The pipeline's reporting handle for one fetch.
///
/// A sink belongs to exactly one fetch attempt. The pipeline may call
/// [`progress`](Self::progress) any number of times, then must call
/// [`finish`](Self::finish) exactly once, unless the task was cancelled
/// first. `finish` consumes the sink, so reporting two outcomes for the same
/// fetch does not compile.
///
/// Sends after the loader has retired the fetch are silently dropped.
#[derive(Debug)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<FetchEvent>,
}

impl EventSink {
    /// Report download progress.
    ///
    /// `total` is a best-effort estimate and may be 0 when unknown.
    /// `partial` carries a progressively decoded image when the pipeline
    /// supports incremental decodes.
    pub fn progress(&self, partial: Option<SharedImage>, completed: u64, total: u64) {
        let _ = self.tx.send(FetchEvent::Progress {
            partial,
            completed,
            total,
        });
    }

    /// Report the final outcome and consume the sink.
    pub fn finish(self, result: Result<SharedImage, FetchError>) {
        let _ = self.tx.send(FetchEvent::Finished(result));
    }
}

// =============================================================================
// Tests
// =============================================================================
