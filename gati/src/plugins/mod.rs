//! Bundled plugins.

mod pose_lock;
mod stats;

pub use pose_lock::PoseLock;
pub use stats::{StatHandle, StatTracker, Stats};
