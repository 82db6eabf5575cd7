//! The loader controller: state transitions, supersession and event driving.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ImageLoader                           │
//! │  load() / load_with_preview() / cancel() / reset()           │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  ┌───────────────┐   cache probe   ┌──────────────────────┐  │
//! │  │  begin_fetch  │───────────────▶ │    FetchPipeline     │  │
//! │  └───────────────┘   fetch+sink    └──────────────────────┘  │
//! │        │                                      │              │
//! │        ▼                                      ▼              │
//! │  ┌───────────────┐    events      ┌──────────────────────┐   │
//! │  │  event driver │◀───────────────│      EventSink       │   │
//! │  └───────────────┘                └──────────────────────┘   │
//! │        │ apply under lock, stamped with a generation         │
//! │        ▼                                                     │
//! │  watch::Sender<LoaderSnapshot>  ──▶  observers               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All mutation, whether from the public API or from a pipeline event,
//! funnels through one async mutex and is published as a whole
//! [`LoaderSnapshot`], so observers never see torn state.
//!
//! # Supersession
//!
//! When a new fetch replaces an old one, the old task is retired only after
//! the new one is in place, so the loader never observes a gap with no fetch
//! running. Two pipeline tasks may therefore briefly coexist; the generation
//! counter makes the old task's events unobservable, which keeps the overlap
//! harmless.

use std::sync::{Arc, Weak};

use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::pipeline::{event_channel, EventReceiver, FetchEvent, FetchPipeline, FetchTask};
use crate::request::{ImageRequest, Priority};
use crate::SharedImage;

use super::phase::LoadPhase;
use super::snapshot::{LoaderSnapshot, Progress};

// =============================================================================
// Active Fetch
// =============================================================================

/// An in-flight fetch owned by the loader.
///
/// Dropping the handle retires the fetch: the pipeline task is cancelled and
/// the event driver aborted. This is what makes `cancel()`, supersession and
/// loader destruction all release background work promptly.
struct ActiveFetch<T: FetchTask> {
    task: T,
    driver: tokio::task::JoinHandle<()>,
}

impl<T: FetchTask> Drop for ActiveFetch<T> {
    fn drop(&mut self) {
        self.task.cancel();
        self.driver.abort();
    }
}

// =============================================================================
// Loader State
// =============================================================================

/// Everything behind the loader's state mutex.
struct LoaderState<T: FetchTask> {
    /// The observable fields, published as one value after every transition.
    snapshot: LoaderSnapshot,

    /// The loader-level priority, forwarded to in-flight tasks.
    priority: Priority,

    /// Stamp for the current fetch; events carrying an older stamp are
    /// discarded. Bumped when a fetch starts and when one is cancelled.
    generation: u64,

    /// The full-quality request to issue once the preview phase succeeds.
    escalation: Option<ImageRequest>,

    /// The in-flight fetch, if any. At most one exists at a time.
    active: Option<ActiveFetch<T>>,
}

impl<T: FetchTask> LoaderState<T> {
    /// Cancel the active fetch and make its late events unobservable.
    ///
    /// Leaves the snapshot alone apart from `is_loading`; callers publish.
    fn retire_active(&mut self) {
        self.escalation = None;
        if let Some(fetch) = self.active.take() {
            self.generation += 1;
            drop(fetch);
            debug!(generation = self.generation, "cancelled in-flight fetch");
        }
        self.snapshot.is_loading = false;
    }
}

// =============================================================================
// Loader Core
// =============================================================================

/// Shared core behind an [`ImageLoader`].
///
/// Event drivers hold only a `Weak` reference to it, so dropping the loader
/// releases the core (and with it the active fetch) promptly, mid-fetch or
/// not.
struct LoaderCore<P: FetchPipeline> {
    pipeline: Arc<P>,
    state: Mutex<LoaderState<P::Task>>,
    publish: watch::Sender<LoaderSnapshot>,
}

impl<P: FetchPipeline> LoaderCore<P> {
    fn publish_locked(&self, state: &LoaderState<P::Task>) {
        self.publish.send_replace(state.snapshot.clone());
    }

    /// The shared begin-a-fetch routine behind every load path.
    ///
    /// Runs entirely under the state lock. The previous fetch, if any, is
    /// retired only after the new one is in place (see the module docs on
    /// supersession).
    fn begin_fetch(
        core: &Arc<Self>,
        state: &mut LoaderState<P::Task>,
        request: ImageRequest,
        phase: LoadPhase,
    ) {
        state.snapshot.phase = phase;
        let previous = state.active.take();
        state.snapshot.request = Some(request.clone());
        state.snapshot.error = None;

        // Cache-first fast path: resolve synchronously, no task created.
        if let Some(image) = core.pipeline.cached(&request) {
            debug!(url = request.url(), ?phase, "cache hit, resolving synchronously");
            state.snapshot.is_loading = false;
            state.snapshot.image = Some(image);
            state.snapshot.phase = phase.completed();
            drop(previous);
            core.publish_locked(state);

            if state.snapshot.phase == LoadPhase::PreviewComplete {
                if let Some(target) = state.escalation.take() {
                    debug!(url = target.url(), "escalating to full-quality load");
                    Self::begin_fetch(core, state, target, LoadPhase::LoadingFull);
                }
            }
            return;
        }

        debug!(url = request.url(), ?phase, "starting fetch");
        state.snapshot.is_loading = true;
        state.snapshot.progress = Progress::default();
        state.generation += 1;
        let generation = state.generation;

        let (sink, events) = event_channel();
        let task = core.pipeline.fetch(request.clone(), sink);
        if state.priority != request.priority() {
            task.set_priority(state.priority);
        }
        let driver = tokio::spawn(drive_events(Arc::downgrade(core), generation, events));
        state.active = Some(ActiveFetch { task, driver });

        // Retire the previous fetch only now, after the new one is in place.
        drop(previous);
        core.publish_locked(state);
    }

    /// Apply a fetch's final outcome under the state lock.
    fn apply_completion(
        core: &Arc<Self>,
        state: &mut LoaderState<P::Task>,
        result: Result<SharedImage, FetchError>,
    ) {
        // The fetch resolved; drop the handle to clear the reference.
        // cancel() on a finished task is an idempotent no-op by the pipeline
        // contract, and the driver (the task running this very code) has no
        // await left for the abort to land on.
        state.active = None;
        state.snapshot.is_loading = false;

        match result {
            Ok(image) => {
                state.snapshot.image = Some(image);
                state.snapshot.phase = state.snapshot.phase.completed();
                debug!(phase = ?state.snapshot.phase, "fetch finished");
                core.publish_locked(state);

                if state.snapshot.phase == LoadPhase::PreviewComplete {
                    if let Some(target) = state.escalation.take() {
                        debug!(url = target.url(), "escalating to full-quality load");
                        Self::begin_fetch(core, state, target, LoadPhase::LoadingFull);
                    }
                }
            }
            Err(error) => {
                warn!(%error, "fetch failed");
                state.escalation = None;
                state.snapshot.error = Some(error);
                state.snapshot.phase = LoadPhase::Failed;
                core.publish_locked(state);
            }
        }
    }
}

// =============================================================================
// Event Driver
// =============================================================================

/// Consume one fetch's event channel and apply events to the loader.
///
/// Each applied event is gated on the generation stamp the driver was spawned
/// with; once the loader has moved on (supersession, cancel, reset), the
/// driver finds itself stale and exits without touching anything. Holding
/// only a `Weak` core reference keeps a dropped loader from being kept alive
/// by its own driver.
async fn drive_events<P: FetchPipeline>(
    core: Weak<LoaderCore<P>>,
    generation: u64,
    mut events: EventReceiver,
) {
    while let Some(event) = events.recv().await {
        let Some(core) = core.upgrade() else { return };
        let mut state = core.state.lock().await;

        if state.generation != generation {
            debug!(generation, current = state.generation, "discarding stale fetch event");
            return;
        }

        match event {
            FetchEvent::Progress {
                partial,
                completed,
                total,
            } => {
                state.snapshot.progress = state.snapshot.progress.advanced(completed, total);
                if let Some(image) = partial {
                    state.snapshot.image = Some(image);
                }
                core.publish_locked(&state);
            }
            FetchEvent::Finished(result) => {
                LoaderCore::apply_completion(&core, &mut state, result);
                // Exactly one completion per fetch; anything a misbehaving
                // pipeline queues afterwards is never read.
                return;
            }
        }
    }
    // Channel closed without a completion: the fetch was cancelled or the
    // pipeline dropped its sink. Nothing to apply.
}

// =============================================================================
// Image Loader
// =============================================================================

/// An observable, progressive image loader.
///
/// A loader drives one load lifecycle per [`reset`](Self::reset): an
/// optional preview fetch, then the full-quality fetch, against an injected
/// [`FetchPipeline`]. Every state change is published as a whole
/// [`LoaderSnapshot`] that UI layers subscribe to.
///
/// All state-mutating methods are `async` only because they serialize on the
/// internal state lock; none of them blocks on I/O or waits for a fetch.
///
/// # Example
///
/// ```ignore
/// use imgload::{ImageLoader, ImageRequest};
///
/// let loader = ImageLoader::new(pipeline);
/// let mut updates = loader.subscribe();
///
/// loader
///     .load_with_preview(
///         ImageRequest::new("https://x/full.jpg"),
///         ImageRequest::new("https://x/thumb.jpg"),
///     )
///     .await;
///
/// while updates.changed().await.is_ok() {
///     let snapshot = updates.borrow().clone();
///     // Render snapshot.image / snapshot.progress / snapshot.error ...
/// }
/// ```
pub struct ImageLoader<P: FetchPipeline> {
    core: Arc<LoaderCore<P>>,
}

impl<P: FetchPipeline> ImageLoader<P> {
    /// Create an idle loader over `pipeline`.
    pub fn new(pipeline: P) -> Self {
        Self::with_shared_pipeline(Arc::new(pipeline))
    }

    /// Create an idle loader over an already-shared pipeline.
    pub fn with_shared_pipeline(pipeline: Arc<P>) -> Self {
        let (publish, _) = watch::channel(LoaderSnapshot::default());
        Self {
            core: Arc::new(LoaderCore {
                pipeline,
                state: Mutex::new(LoaderState {
                    snapshot: LoaderSnapshot::default(),
                    priority: Priority::default(),
                    generation: 0,
                    escalation: None,
                    active: None,
                }),
                publish,
            }),
        }
    }

    /// The pipeline this loader fetches through.
    pub fn pipeline(&self) -> &Arc<P> {
        &self.core.pipeline
    }

    /// Load `target` directly, with no preview phase.
    ///
    /// A no-op unless the loader is in [`LoadPhase::NotStarted`]; a loader
    /// instance is driven through exactly one lifecycle per
    /// [`reset`](Self::reset).
    pub async fn load(&self, target: ImageRequest) {
        let mut state = self.lock_if_idle(&target).await;
        if let Some(state) = state.as_mut() {
            LoaderCore::begin_fetch(&self.core, state, target, LoadPhase::LoadingFull);
        }
    }

    /// Load `preview` first, then escalate to `target` once the preview
    /// completes successfully.
    ///
    /// Same idle guard as [`load`](Self::load). A preview failure moves the
    /// loader to [`LoadPhase::Failed`] without ever fetching `target`; the
    /// pending escalation is likewise discarded by `cancel()` and `reset()`.
    pub async fn load_with_preview(&self, target: ImageRequest, preview: ImageRequest) {
        let mut state = self.lock_if_idle(&target).await;
        if let Some(state) = state.as_mut() {
            state.escalation = Some(target);
            LoaderCore::begin_fetch(&self.core, state, preview, LoadPhase::LoadingPreview);
        }
    }

    async fn lock_if_idle(
        &self,
        target: &ImageRequest,
    ) -> Option<MutexGuard<'_, LoaderState<P::Task>>> {
        let state = self.core.state.lock().await;
        if state.snapshot.phase == LoadPhase::NotStarted {
            Some(state)
        } else {
            debug!(
                url = target.url(),
                phase = ?state.snapshot.phase,
                "ignoring load(): lifecycle already started"
            );
            None
        }
    }

    /// Stop the in-flight fetch, if any.
    ///
    /// Guarantees that the cancelled fetch's callbacks never mutate
    /// observable state again, even if the underlying work races past the
    /// cancellation point. An already-displayed `image` or `error` is left
    /// untouched: cancellation means "stop trying", not "discard result".
    pub async fn cancel(&self) {
        let mut state = self.core.state.lock().await;
        let was_loading = state.snapshot.is_loading;
        state.retire_active();
        if was_loading {
            self.core.publish_locked(&state);
        }
    }

    /// Cancel and restore the initial snapshot, re-enabling `load()`.
    pub async fn reset(&self) {
        let mut state = self.core.state.lock().await;
        state.retire_active();
        state.snapshot = LoaderSnapshot::default();
        self.core.publish_locked(&state);
    }

    /// Update the loader priority, forwarding it to the in-flight task
    /// immediately. Has no effect on the state machine.
    pub async fn set_priority(&self, priority: Priority) {
        let mut state = self.core.state.lock().await;
        state.priority = priority;
        if let Some(fetch) = &state.active {
            fetch.task.set_priority(priority);
        }
    }

    /// The current loader priority.
    pub async fn priority(&self) -> Priority {
        self.core.state.lock().await.priority
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    /// Subscribe to snapshot updates.
    ///
    /// The receiver immediately holds the latest snapshot; every applied
    /// transition publishes a new one. Updates may coalesce under load, but
    /// the last snapshot is always delivered.
    pub fn subscribe(&self) -> watch::Receiver<LoaderSnapshot> {
        self.core.publish.subscribe()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> LoaderSnapshot {
        self.core.publish.borrow().clone()
    }

    /// The fetched (or partially decoded) image, if any.
    pub fn image(&self) -> Option<SharedImage> {
        self.core.publish.borrow().image.clone()
    }

    /// The failure of the previous attempt, if any.
    pub fn error(&self) -> Option<FetchError> {
        self.core.publish.borrow().error.clone()
    }

    /// Whether an asynchronous fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.core.publish.borrow().is_loading
    }

    /// Download progress of the current attempt.
    pub fn progress(&self) -> Progress {
        self.core.publish.borrow().progress
    }

    /// The currently active (or last issued) request.
    pub fn request(&self) -> Option<ImageRequest> {
        self.core.publish.borrow().request.clone()
    }

    /// Where the load lifecycle currently stands.
    pub fn phase(&self) -> LoadPhase {
        self.core.publish.borrow().phase
    }

    /// A renderable RGBA copy of the current image for display layers.
    pub fn renderable(&self) -> Option<image::RgbaImage> {
        self.core.publish.borrow().renderable()
    }
}

// =============================================================================
// Tests
// =============================================================================
