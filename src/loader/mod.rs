//! The progressive image loader.
//!
//! [`ImageLoader`] is the stateful controller at the center of the crate: it
//! drives a [`FetchPipeline`](crate::FetchPipeline) through an optional
//! preview phase and a full-quality phase, publishes every state change as a
//! [`LoaderSnapshot`], and guarantees that superseded or cancelled fetches
//! can never mutate observable state.

mod controller;
mod phase;
mod snapshot;

pub use controller::ImageLoader;
pub use phase::LoadPhase;
pub use snapshot::{LoaderSnapshot, Progress};
