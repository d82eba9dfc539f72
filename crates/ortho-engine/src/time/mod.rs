//! Frame timing.
//!
//! One `FrameClock` per canvas; `tick()` once per painted frame.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
