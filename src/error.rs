use thiserror::Error;

/// Errors surfaced by a fetch pipeline.
///
/// This is the only error type the loader ever exposes. Failures are never
/// returned from the public API; they are recorded into the `error` field of
/// the observable snapshot and the loader moves to [`LoadPhase::Failed`].
/// Cancellation is not an error: a cancelled fetch simply stops reporting.
///
/// [`LoadPhase::Failed`]: crate::LoadPhase::Failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network or connection failure while downloading the resource
    #[error("network error: {0}")]
    Network(String),

    /// The downloaded bytes could not be decoded into an image
    #[error("decode error: {0}")]
    Decode(String),

    /// The resource does not exist
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Any other pipeline failure, carried as an opaque message
    #[error("fetch failed: {0}")]
    Other(String),
}
