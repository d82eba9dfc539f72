//! Input subsystem.
//!
//! Public event types are platform-agnostic and carry device pixels. The
//! runtime translates platform events through `platform`.

mod frame;
pub mod platform;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{InputEvent, MouseWheelDelta, PointerMoveEvent};
