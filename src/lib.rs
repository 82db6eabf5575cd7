//! # imgload
//!
//! An observable, progressive image loader.
//!
//! The crate provides one controller, [`ImageLoader`], that sits between a
//! UI layer and a fetch/cache pipeline. Given a target resource (and
//! optionally a cheaper preview), it drives the pipeline through a
//! preview-then-full-quality load, publishing every state change — decoded
//! image, error, busy flag, download progress — as a single coherent
//! [`LoaderSnapshot`] that observers subscribe to.
//!
//! ## Features
//!
//! - **Progressive loading**: an optional preview fetch that automatically
//!   escalates to the full-quality fetch on success
//! - **Cache-first fast path**: a synchronous cache probe resolves
//!   cache-resident requests without scheduling any work
//! - **Clean supersession**: a generation counter guarantees that cancelled
//!   or replaced fetches can never mutate observable state
//! - **Live priority**: priority changes reach an in-flight fetch without
//!   restarting it
//!
//! ## Architecture
//!
//! - [`loader`] - the [`ImageLoader`] controller, its [`LoadPhase`] state
//!   machine and the published [`LoaderSnapshot`]
//! - [`pipeline`] - the [`FetchPipeline`] contract the application
//!   implements, and the [`EventSink`] fetches report through
//! - [`request`] - [`ImageRequest`] descriptors and [`Priority`] hints
//! - [`error`] - the [`FetchError`] taxonomy
//!
//! Networking, caching and decoding are deliberately outside the crate: the
//! loader only orchestrates calls against an injected pipeline.
//!
//! ## Example
//!
//! ```ignore
//! use imgload::{ImageLoader, ImageRequest, LoadPhase};
//!
//! // `pipeline` is your FetchPipeline implementation.
//! let loader = ImageLoader::new(pipeline);
//! let mut updates = loader.subscribe();
//!
//! loader
//!     .load_with_preview(
//!         ImageRequest::new("https://x/full.jpg"),
//!         ImageRequest::new("https://x/thumb.jpg"),
//!     )
//!     .await;
//!
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow_and_update().clone();
//!     // Bind snapshot.image / snapshot.progress / snapshot.error to views.
//!     if snapshot.phase.is_terminal() {
//!         break;
//!     }
//! }
//! ```

use std::sync::Arc;

pub mod error;
pub mod loader;
pub mod pipeline;
pub mod request;

/// The decoded-image representation shared between pipeline, loader and
/// observers.
pub type SharedImage = Arc<image::DynamicImage>;

// Re-export commonly used types
pub use error::FetchError;
pub use loader::{ImageLoader, LoadPhase, LoaderSnapshot, Progress};
pub use pipeline::{EventSink, FetchPipeline, FetchTask};
pub use request::{ImageRequest, Priority};
