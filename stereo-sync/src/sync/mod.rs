//! Cross-stream timestamp and frame consistency.
//!
//! - [`TimestampArbiter`]: latest canonical instant taken from the reference stream
//! - [`relabel`]: header rewrite applied to every relayed image and camera info

mod arbiter;
mod relabel;

pub use arbiter::TimestampArbiter;
pub use relabel::relabel;
