//! The fetch pipeline contract.
//!
//! The loader never performs network I/O, caching or decoding itself. All of
//! that lives behind the [`FetchPipeline`] trait, which the application (or a
//! test) implements and injects into the loader. The pipeline reports back
//! through an [`EventSink`] handed to it at fetch time.

mod contract;
mod events;

pub use contract::{FetchPipeline, FetchTask};
pub use events::EventSink;

pub(crate) use events::{event_channel, EventReceiver, FetchEvent};
