//! Sequential presentation of bot output
//!
//! Bot content is parsed into a flat list of reveal nodes ahead of time and
//! handed to a single-consumer queue that types it into the transcript one
//! bubble at a time.

mod item;
mod markup;
mod queue;
mod renderer;

pub use item::{Content, PresentationItem};
pub use markup::MarkupTag;
pub use queue::PresentationQueue;
pub use renderer::{BubbleId, InputField, InputSurface, Renderer};
