use glam::{DVec3, Mat4};
use thiserror::Error;

use crate::coords::Vec2;

/// A window size that cannot carry a projection.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("invalid window size {width}x{height}: both dimensions must be non-zero")]
pub struct InvalidDimensionError {
    pub width: u32,
    pub height: u32,
}

/// A logical target region that cannot be kept visible.
#[derive(Error, Debug, Copy, Clone, PartialEq)]
#[error(
    "invalid logical target: extent {logical_extent} and aspect {target_aspect} must be finite and positive"
)]
pub struct InvalidTargetError {
    pub logical_extent: f32,
    pub target_aspect: f32,
}

/// Visible logical rectangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LogicalBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl LogicalBounds {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Orthographic projection for one window size.
///
/// Recomputed as a whole on every valid resize. `matrix` maps logical space
/// (centred, +Y up) to clip space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectionState {
    window_width: u32,
    window_height: u32,
    logical_extent: f32,
    half_extent: Vec2,
    matrix: Mat4,
}

impl ProjectionState {
    pub fn window_width(&self) -> u32 {
        self.window_width
    }

    pub fn window_height(&self) -> u32 {
        self.window_height
    }

    pub fn logical_extent(&self) -> f32 {
        self.logical_extent
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Half-size of the visible logical rectangle per axis.
    pub fn half_extent(&self) -> Vec2 {
        self.half_extent
    }

    pub fn visible_bounds(&self) -> LogicalBounds {
        LogicalBounds {
            min: Vec2::new(-self.half_extent.x, -self.half_extent.y),
            max: self.half_extent,
        }
    }
}

/// Turns window sizes into `ProjectionState`s.
///
/// The target region is `logical_extent` wide and
/// `logical_extent / target_aspect` tall, centred on the logical origin. It
/// always stays fully visible: the axis that constrains it shows exactly the
/// target span, the other one is widened (letterboxed) to keep pixels square.
#[derive(Debug, Clone)]
pub struct ProjectionController {
    logical_extent: f32,
    target_aspect: f32,
    current: Option<ProjectionState>,
}

impl ProjectionController {
    pub fn new(logical_extent: f32, target_aspect: f32) -> Result<Self, InvalidTargetError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(logical_extent) || !positive(target_aspect) {
            return Err(InvalidTargetError {
                logical_extent,
                target_aspect,
            });
        }
        Ok(Self {
            logical_extent,
            target_aspect,
            current: None,
        })
    }

    pub fn logical_extent(&self) -> f32 {
        self.logical_extent
    }

    /// Last valid state, if any resize has been accepted.
    pub fn current(&self) -> Option<&ProjectionState> {
        self.current.as_ref()
    }

    /// Computes and stores the projection for a `width` x `height` window.
    ///
    /// A zero dimension is rejected and the previous state kept.
    pub fn on_resize(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<ProjectionState, InvalidDimensionError> {
        if width == 0 || height == 0 {
            return Err(InvalidDimensionError { width, height });
        }

        let viewport_aspect = width as f32 / height as f32;
        let half_extent = if viewport_aspect >= self.target_aspect {
            fit_height(self.logical_extent, self.target_aspect, viewport_aspect)
        } else {
            fit_width(self.logical_extent, self.target_aspect, viewport_aspect)
        };

        let state = ProjectionState {
            window_width: width,
            window_height: height,
            logical_extent: self.logical_extent,
            half_extent,
            matrix: Mat4::orthographic_rh(
                -half_extent.x,
                half_extent.x,
                -half_extent.y,
                half_extent.y,
                -1.0,
                1.0,
            ),
        };

        self.current = Some(state);
        Ok(state)
    }
}

/// Window at least as wide as the target: height is the constraint.
fn fit_height(extent: f32, target_aspect: f32, viewport_aspect: f32) -> Vec2 {
    let target_height = extent / target_aspect;
    Vec2::new(
        viewport_aspect / target_aspect * extent / 2.0,
        target_height / 2.0,
    )
}

/// Window narrower than the target: width is the constraint.
fn fit_width(extent: f32, target_aspect: f32, viewport_aspect: f32) -> Vec2 {
    let target_height = extent / target_aspect;
    Vec2::new(
        extent / 2.0,
        target_aspect / viewport_aspect * target_height / 2.0,
    )
}

/// Maps a device pixel (top-left origin, +Y down) to logical space.
pub fn device_to_logical(device: Vec2, state: &ProjectionState) -> Vec2 {
    unproject(
        device,
        state.window_width,
        state.window_height,
        state.matrix,
    )
}

/// Maps a logical point to device pixels. Inverse of `device_to_logical`.
pub fn logical_to_device(logical: Vec2, state: &ProjectionState) -> Vec2 {
    project(
        logical,
        state.window_width,
        state.window_height,
        state.matrix,
    )
}

/// `device_to_logical` through an arbitrary clip-from-logical matrix, e.g.
/// the projection combined with a zoom view matrix.
///
/// Evaluated in `f64` so large windows round-trip to within 1e-4 px.
pub fn unproject(device: Vec2, width: u32, height: u32, clip_from_logical: Mat4) -> Vec2 {
    let (w, h) = (f64::from(width), f64::from(height));
    // The only place the Y axis flips.
    let ndc = DVec3::new(
        2.0 * f64::from(device.x) / w - 1.0,
        2.0 * (h - f64::from(device.y)) / h - 1.0,
        0.0,
    );
    let p = clip_from_logical.as_dmat4().inverse().project_point3(ndc);
    Vec2::new(p.x as f32, p.y as f32)
}

pub fn project(logical: Vec2, width: u32, height: u32, clip_from_logical: Mat4) -> Vec2 {
    let (w, h) = (f64::from(width), f64::from(height));
    let ndc = clip_from_logical
        .as_dmat4()
        .project_point3(DVec3::new(f64::from(logical.x), f64::from(logical.y), 0.0));
    Vec2::new(
        ((ndc.x + 1.0) * w / 2.0) as f32,
        (h - (ndc.y + 1.0) * h / 2.0) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn controller() -> ProjectionController {
        ProjectionController::new(10.0, 1.0).unwrap()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= EPS
    }

    #[test]
    fn constraining_axis_shows_the_full_extent() {
        let mut c = controller();
        for (w, h) in [(800, 800), (1600, 800), (800, 1600), (1920, 1080), (333, 1001)] {
            let s = c.on_resize(w, h).unwrap();
            let half = s.half_extent();
            if w >= h {
                assert!(approx(half.y, 5.0), "{w}x{h}: {half:?}");
                assert!(half.x >= 5.0 - EPS);
            } else {
                assert!(approx(half.x, 5.0), "{w}x{h}: {half:?}");
                assert!(half.y >= 5.0 - EPS);
            }
        }
    }

    #[test]
    fn square_window_is_the_same_from_both_branches() {
        let a = fit_height(10.0, 1.0, 1.0);
        let b = fit_width(10.0, 1.0, 1.0);
        assert_eq!(a, b);

        let s = controller().on_resize(640, 640).unwrap();
        assert_eq!(s.half_extent(), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn wide_window_doubles_the_horizontal_extent() {
        let s = controller().on_resize(1600, 800).unwrap();
        let bounds = s.visible_bounds();
        assert!(approx(bounds.width(), 20.0));
        assert!(approx(bounds.height(), 10.0));
        assert!(approx(bounds.min.x, -10.0));
        assert!(approx(bounds.max.y, 5.0));
    }

    #[test]
    fn zero_dimension_is_rejected_and_state_kept() {
        let mut c = controller();
        let before = c.on_resize(800, 600).unwrap();

        let err = c.on_resize(0, 600).unwrap_err();
        assert_eq!(err, InvalidDimensionError { width: 0, height: 600 });
        assert!(c.on_resize(800, 0).is_err());

        assert_eq!(c.current(), Some(&before));
    }

    #[test]
    fn degenerate_targets_are_rejected() {
        for (extent, aspect) in [(0.0, 1.0), (-10.0, 1.0), (f32::NAN, 1.0), (10.0, 0.0), (10.0, f32::INFINITY)] {
            let err = ProjectionController::new(extent, aspect).unwrap_err();
            assert_eq!(err.logical_extent.to_bits(), extent.to_bits());
            assert_eq!(err.target_aspect.to_bits(), aspect.to_bits());
        }
    }

    #[test]
    fn no_state_before_first_resize() {
        let mut c = controller();
        assert!(c.current().is_none());
        assert!(c.on_resize(0, 0).is_err());
        assert!(c.current().is_none());
    }

    #[test]
    fn device_corners_map_to_visible_corners() {
        let s = controller().on_resize(800, 800).unwrap();

        let top_left = device_to_logical(Vec2::new(0.0, 0.0), &s);
        assert!(approx(top_left.x, -5.0) && approx(top_left.y, 5.0), "{top_left:?}");

        let bottom_right = device_to_logical(Vec2::new(800.0, 800.0), &s);
        assert!(approx(bottom_right.x, 5.0) && approx(bottom_right.y, -5.0));

        let centre = device_to_logical(Vec2::new(400.0, 400.0), &s);
        assert!(approx(centre.x, 0.0) && approx(centre.y, 0.0));
    }

    #[test]
    fn device_logical_round_trip() {
        let mut c = controller();
        for (w, h) in [(800, 800), (1600, 800), (640, 1280), (1, 1), (1919, 7), (2047, 1151)] {
            let s = c.on_resize(w, h).unwrap();
            for (x, y) in [(0.0, 0.0), (12.5, 3.0), (w as f32, h as f32), (w as f32 / 3.0, 0.75)] {
                let device = Vec2::new(x, y);
                let back = logical_to_device(device_to_logical(device, &s), &s);
                assert!(back.distance(device) <= EPS, "{w}x{h} {device:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn non_square_target_keeps_its_aspect_visible() {
        let mut c = ProjectionController::new(16.0, 2.0).unwrap();
        let s = c.on_resize(1000, 500).unwrap();
        assert_eq!(s.half_extent(), Vec2::new(8.0, 4.0));

        let s = c.on_resize(500, 500).unwrap();
        assert!(approx(s.half_extent().x, 8.0));
        assert!(approx(s.half_extent().y, 8.0));
    }

    #[test]
    fn unproject_honours_extra_scaling() {
        let s = controller().on_resize(800, 800).unwrap();
        let zoomed = s.matrix() * Mat4::from_scale(glam::Vec3::new(2.0, 2.0, 1.0));
        let p = unproject(Vec2::new(800.0, 0.0), 800, 800, zoomed);
        assert!(approx(p.x, 2.5) && approx(p.y, 2.5), "{p:?}");
    }
}
