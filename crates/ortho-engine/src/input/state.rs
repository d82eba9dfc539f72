use super::frame::InputFrame;
use super::types::{InputEvent, PointerMoveEvent};

/// Current input state for the window.
#[derive(Debug, Default)]
pub struct InputState {
    pub focused: bool,

    /// Pointer position in device pixels, `None` while outside the window.
    pub pointer_pos: Option<(f32, f32)>,
}

impl InputState {
    /// Applies `ev` to the current state and records it in `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::Focused(f) => self.focused = *f,
            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.pointer_pos = Some((*x, *y));
            }
            InputEvent::PointerLeft => self.pointer_pos = None,
            InputEvent::MouseWheel { delta } => frame.wheel_y += delta.vertical(),
        }

        frame.push_event(ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseWheelDelta;

    #[test]
    fn pointer_tracking_follows_enter_and_leave() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::PointerMoved(PointerMoveEvent { x: 3.0, y: 4.0 }));
        assert_eq!(state.pointer_pos, Some((3.0, 4.0)));

        state.apply_event(&mut frame, InputEvent::PointerLeft);
        assert_eq!(state.pointer_pos, None);
        assert_eq!(frame.events.len(), 2);
    }

    #[test]
    fn wheel_deltas_accumulate_until_cleared() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::MouseWheel { delta: MouseWheelDelta::Line { x: 0.0, y: 1.0 } });
        state.apply_event(&mut frame, InputEvent::MouseWheel { delta: MouseWheelDelta::Pixel { x: 4.0, y: -0.5 } });
        assert_eq!(frame.wheel_y, 0.5);

        frame.clear();
        assert_eq!(frame.wheel_y, 0.0);
        assert!(frame.events.is_empty());
    }
}
