//! The interactive canvas.
//!
//! `Canvas` owns the projection, the view state and every GPU resource it
//! draws with. The host forwards window events to it and calls `on_paint`
//! once per frame with a cleared target.
//!
//! GPU resources are created on the first paint (`CanvasState`). If that
//! fails, the canvas stays failed and keeps returning the same error.
//! Until then the state is `None`.

mod config;
mod error;
mod layer;

use glam::Mat4;

use crate::coords::Vec2;
use crate::paint::Color;
use crate::render::{RenderCtx, RenderError, RenderTarget};
use crate::time::FrameClock;
use crate::view::{unproject, ProjectionController, ProjectionState, ViewState, ZoomStep};

pub use config::{default_shape_offsets, CanvasConfig, ZOOM_RENDER_ENV};
pub use error::CanvasError;

use layer::{build_layers, draw_layer, Layer};

enum CanvasState {
    Ready(Vec<Layer>),
    Failed(CanvasError),
}

pub struct Canvas {
    config: CanvasConfig,
    projection: ProjectionController,
    view: ViewState,
    state: Option<CanvasState>,
    clock: FrameClock,
}

impl Canvas {
    /// Fails when the configured logical target is empty or not finite.
    pub fn new(config: CanvasConfig) -> Result<Self, CanvasError> {
        let projection = ProjectionController::new(config.logical_extent, config.target_aspect)?;
        Ok(Self {
            projection,
            view: ViewState::new(config.initial_zoom),
            state: None,
            clock: FrameClock::new(),
            config,
        })
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Preferred window size in device pixels.
    pub fn size_hint(&self) -> (u32, u32) {
        self.config.size_hint
    }

    pub fn clear_color(&self) -> Color {
        self.config.clear_color
    }

    pub fn projection(&self) -> Option<&ProjectionState> {
        self.projection.current()
    }

    pub fn zoom_scale(&self) -> f32 {
        self.view.zoom_scale()
    }

    /// Pointer position in logical units, if the pointer is over the window
    /// and a projection exists.
    pub fn pointer_logical(&self) -> Option<Vec2> {
        self.view.pointer_logical_pos()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, Some(CanvasState::Ready(_)))
    }

    /// The setup error the canvas is stuck on, if any.
    pub fn failure(&self) -> Option<&CanvasError> {
        match &self.state {
            Some(CanvasState::Failed(err)) => Some(err),
            _ => None,
        }
    }

    /// Recomputes the projection. Invalid sizes are logged and ignored.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        match self.projection.on_resize(width, height) {
            Ok(state) => {
                let half = state.half_extent();
                log::debug!(
                    "projection for {width}x{height}: visible half extent {:.3} x {:.3}",
                    half.x,
                    half.y
                );
                self.refresh_pointer();
            }
            Err(err) => log::warn!("ignoring resize: {err}"),
        }
    }

    /// Stores the logical position of device point (`x`, `y`).
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.view.set_pointer_device(Vec2::new(x, y));
        self.refresh_pointer();
        if let Some(p) = self.view.pointer_logical_pos() {
            log::debug!("pointer ({x:.1}, {y:.1}) -> logical ({:.3}, {:.3})", p.x, p.y);
        }
    }

    pub fn on_pointer_left(&mut self) {
        self.view.clear_pointer();
    }

    /// Applies one wheel step and returns the new zoom scale.
    pub fn on_wheel(&mut self, step: ZoomStep) -> f32 {
        let zoom = self.view.apply_zoom(step);
        log::debug!("zoom {step:?} -> {zoom}");
        if self.config.zoom_affects_rendering {
            self.refresh_pointer();
        }
        zoom
    }

    /// Draws the grid, then the shape batch, in one render pass over `target`.
    ///
    /// The target must already be cleared. Creates GPU resources on the first
    /// call.
    pub fn on_paint(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
    ) -> Result<(), CanvasError> {
        if let Some((width, height)) = ctx.viewport.to_pixels() {
            let current = self
                .projection
                .current()
                .map(|s| (s.window_width(), s.window_height()));
            if current != Some((width, height)) {
                self.on_resize(width, height);
            }
        }

        let state = *self.projection.current().ok_or(RenderError::Unsized)?;
        let clip_from_logical = self.clip_from_logical(&state);

        let frame = self.clock.tick();
        log::trace!("paint frame {} (dt {:.4}s)", frame.frame_index, frame.dt);

        let layers = ready_layers(&mut self.state, ctx, &self.config)?;

        let mut pass = target.begin_pass("ortho canvas");
        for layer in layers {
            draw_layer(layer, ctx.queue, &mut pass, &clip_from_logical)?;
        }
        Ok(())
    }

    fn clip_from_logical(&self, state: &ProjectionState) -> Mat4 {
        if self.config.zoom_affects_rendering {
            state.matrix() * self.view.view_matrix()
        } else {
            state.matrix()
        }
    }

    /// Re-derives the logical pointer position from the device position with
    /// the same transform the next frame renders with.
    fn refresh_pointer(&mut self) {
        let logical = match (self.view.pointer_device_pos(), self.projection.current()) {
            (Some(device), Some(state)) => Some(unproject(
                device,
                state.window_width(),
                state.window_height(),
                self.clip_from_logical(state),
            )),
            _ => None,
        };
        self.view.set_pointer_logical(logical);
    }
}

fn ready_layers<'s>(
    state: &'s mut Option<CanvasState>,
    ctx: &RenderCtx<'_>,
    config: &CanvasConfig,
) -> Result<&'s [Layer], CanvasError> {
    let state = state.get_or_insert_with(|| match build_layers(ctx, config) {
        Ok(layers) => {
            log::info!("canvas ready ({} layers)", layers.len());
            CanvasState::Ready(layers)
        }
        Err(err) => {
            log::error!("canvas setup failed: {err}");
            CanvasState::Failed(err)
        }
    });

    match state {
        CanvasState::Ready(layers) => Ok(layers.as_slice()),
        CanvasState::Failed(err) => Err(err.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new(CanvasConfig::default()).unwrap();
        canvas.on_resize(800, 800);
        canvas
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        a.distance(b) <= 1e-4
    }

    #[test]
    fn starts_uninitialized_with_size_hint() {
        let canvas = Canvas::new(CanvasConfig::default()).unwrap();
        assert!(!canvas.is_ready());
        assert!(canvas.failure().is_none());
        assert!(canvas.projection().is_none());
        assert_eq!(canvas.size_hint(), (800, 800));
        assert_eq!(canvas.zoom_scale(), 1.0);
    }

    #[test]
    fn degenerate_logical_extent_is_a_config_error() {
        for extent in [0.0, -4.0, f32::NAN] {
            let config = CanvasConfig::default().with_logical_extent(extent);
            let err = Canvas::new(config).err().unwrap();
            assert!(matches!(err, CanvasError::Config(_)), "{extent}: {err}");
            assert!(err.is_fatal());
        }
    }

    #[test]
    fn pointer_maps_into_logical_space() {
        let mut canvas = canvas();
        canvas.on_pointer_move(0.0, 0.0);
        assert!(approx(canvas.pointer_logical().unwrap(), Vec2::new(-5.0, 5.0)));

        canvas.on_pointer_move(600.0, 200.0);
        assert!(approx(canvas.pointer_logical().unwrap(), Vec2::new(2.5, 2.5)));

        canvas.on_pointer_left();
        assert_eq!(canvas.pointer_logical(), None);
    }

    #[test]
    fn pointer_before_first_resize_has_no_logical_position() {
        let mut canvas = Canvas::new(CanvasConfig::default()).unwrap();
        canvas.on_pointer_move(10.0, 10.0);
        assert_eq!(canvas.pointer_logical(), None);

        canvas.on_resize(20, 20);
        assert!(approx(canvas.pointer_logical().unwrap(), Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn resize_remaps_a_resting_pointer() {
        let mut canvas = canvas();
        canvas.on_pointer_move(800.0, 400.0);
        assert!(approx(canvas.pointer_logical().unwrap(), Vec2::new(5.0, 0.0)));

        canvas.on_resize(1600, 800);
        assert!(approx(canvas.pointer_logical().unwrap(), Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn invalid_resize_keeps_projection() {
        let mut canvas = canvas();
        let before = *canvas.projection().unwrap();
        canvas.on_resize(0, 600);
        assert_eq!(canvas.projection(), Some(&before));
    }

    #[test]
    fn zoom_is_tracked_but_not_rendered_by_default() {
        let mut canvas = canvas();
        canvas.on_pointer_move(600.0, 200.0);
        assert_eq!(canvas.on_wheel(ZoomStep::In), 2.0);

        let state = *canvas.projection().unwrap();
        assert_eq!(canvas.clip_from_logical(&state), state.matrix());
        assert!(approx(canvas.pointer_logical().unwrap(), Vec2::new(2.5, 2.5)));
    }

    #[test]
    fn rendered_zoom_also_drives_pointer_mapping() {
        let config = CanvasConfig::default().with_zoom_affects_rendering(true);
        let mut canvas = Canvas::new(config).unwrap();
        canvas.on_resize(800, 800);
        canvas.on_pointer_move(600.0, 200.0);

        canvas.on_wheel(ZoomStep::In);
        assert!(approx(canvas.pointer_logical().unwrap(), Vec2::new(1.25, 1.25)));

        canvas.on_wheel(ZoomStep::Out);
        canvas.on_wheel(ZoomStep::Out);
        assert_eq!(canvas.zoom_scale(), 0.5);
        assert!(approx(canvas.pointer_logical().unwrap(), Vec2::new(5.0, 5.0)));
    }
}
