use crate::input::InputEvent;

use super::ctx::{FrameCtx, WindowCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the host binary.
///
/// Call order guaranteed by the runtime: `on_resize` with the initial drawable
/// size before the first frame, and again for every resize before the redraw
/// it triggers.
pub trait App {
    /// Drawable size changed (physical pixels). Either dimension may be zero
    /// while the window is minimized.
    fn on_resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// Called for every translated input event. Request a redraw through
    /// `window` when the event changes what is drawn.
    fn on_input(&mut self, window: &WindowCtx<'_>, event: &InputEvent) -> AppControl {
        let _ = (window, event);
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
