//! Listing logic: which events a viewer gets to see, and in what order.

pub mod priority;
pub mod visibility;

pub use priority::{prioritize, Bucket, RankedEvent};
pub use visibility::{EventScope, Viewer};
