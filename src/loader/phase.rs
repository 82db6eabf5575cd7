//! The load lifecycle state machine.

/// The phase of a loader's single load lifecycle.
///
/// Phases advance monotonically along
/// `NotStarted → LoadingPreview → PreviewComplete → LoadingFull →
/// FullComplete`, with `LoadingFull` reachable directly from `NotStarted`
/// when no preview was requested, and `Failed` reachable from either loading
/// phase. There is no transition out of `FullComplete` or `Failed` except an
/// explicit [`reset`](crate::ImageLoader::reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadPhase {
    /// No load has been issued since creation or the last reset.
    #[default]
    NotStarted,

    /// The preview (low-quality) fetch is in flight.
    LoadingPreview,

    /// The preview fetch finished successfully.
    PreviewComplete,

    /// The full-quality fetch is in flight.
    LoadingFull,

    /// The full-quality fetch finished successfully.
    FullComplete,

    /// A fetch failed; see the snapshot's `error` field.
    Failed,
}

impl LoadPhase {
    /// Map a loading phase to the phase reached when its fetch succeeds.
    ///
    /// Non-loading phases map to themselves.
    pub fn completed(self) -> Self {
        match self {
            LoadPhase::LoadingPreview => LoadPhase::PreviewComplete,
            LoadPhase::LoadingFull => LoadPhase::FullComplete,
            other => other,
        }
    }

    /// Whether a fetch is currently expected for this phase.
    pub fn is_in_flight(self) -> bool {
        matches!(self, LoadPhase::LoadingPreview | LoadPhase::LoadingFull)
    }

    /// Whether this phase ends the lifecycle (only `reset()` leaves it).
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadPhase::FullComplete | LoadPhase::Failed)
    }
}

// =============================================================================
// Tests
// =============================================================================
