use glam::{Mat4, Vec3};

use crate::coords::Vec2;

/// Smallest zoom scale. There is no upper bound.
pub const MIN_ZOOM: f32 = 0.1;

/// One discrete wheel step.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ZoomStep {
    In,
    Out,
}

impl ZoomStep {
    /// Positive vertical wheel delta zooms in, negative zooms out. A zero (or
    /// non-finite) delta is not a step.
    pub fn from_wheel(dy: f32) -> Option<Self> {
        if dy > 0.0 {
            Some(Self::In)
        } else if dy < 0.0 {
            Some(Self::Out)
        } else {
            None
        }
    }

    pub fn factor(self) -> f32 {
        match self {
            Self::In => 2.0,
            Self::Out => 0.5,
        }
    }
}

/// Pointer and zoom state of the canvas.
///
/// `pointer_logical_pos` is derived from `pointer_device_pos`; the owner
/// refreshes it whenever the mapping changes so it never goes stale.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    zoom_scale: f32,
    pointer_device_pos: Option<Vec2>,
    pointer_logical_pos: Option<Vec2>,
}

impl ViewState {
    pub fn new(initial_zoom: f32) -> Self {
        let zoom_scale = if initial_zoom.is_finite() {
            initial_zoom.max(MIN_ZOOM)
        } else {
            1.0
        };
        Self {
            zoom_scale,
            pointer_device_pos: None,
            pointer_logical_pos: None,
        }
    }

    pub fn zoom_scale(&self) -> f32 {
        self.zoom_scale
    }

    /// Doubles or halves the zoom, never going below `MIN_ZOOM`.
    ///
    /// A step whose result would overflow `f32` is refused and the current
    /// scale kept.
    pub fn apply_zoom(&mut self, step: ZoomStep) -> f32 {
        let next = (self.zoom_scale * step.factor()).max(MIN_ZOOM);
        if next.is_finite() {
            self.zoom_scale = next;
        } else {
            log::debug!("zoom {step:?} refused at scale {}", self.zoom_scale);
        }
        self.zoom_scale
    }

    /// Uniform XY scale by the zoom factor.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_scale(Vec3::new(self.zoom_scale, self.zoom_scale, 1.0))
    }

    pub fn pointer_device_pos(&self) -> Option<Vec2> {
        self.pointer_device_pos
    }

    pub fn pointer_logical_pos(&self) -> Option<Vec2> {
        self.pointer_logical_pos
    }

    /// Records the pointer in device space. The logical position is cleared
    /// until `set_pointer_logical` runs.
    pub fn set_pointer_device(&mut self, device: Vec2) {
        self.pointer_device_pos = Some(device);
        self.pointer_logical_pos = None;
    }

    pub fn set_pointer_logical(&mut self, logical: Option<Vec2>) {
        self.pointer_logical_pos = logical;
    }

    pub fn clear_pointer(&mut self) {
        self.pointer_device_pos = None;
        self.pointer_logical_pos = None;
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(1.0)
    }
}
