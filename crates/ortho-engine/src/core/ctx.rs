use winit::window::Window;

use crate::coords::Viewport;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::{InputFrame, InputState};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderError, RenderTarget};
use crate::time::FrameTime;

use super::app::AppControl;

/// Window handle exposed to app callbacks.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    /// Schedules a `RedrawRequested` for this window.
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires a frame, clears it to `clear`, lets `draw` record into it, then
    /// submits and presents.
    ///
    /// If `draw` fails or the device reports an error while recording, the
    /// frame is dropped without being submitted and the error returned. Surface
    /// acquisition problems are handled here: the frame is skipped, or
    /// `AppControl::Exit` is returned when they are fatal.
    pub fn render<F, E>(&mut self, clear: Color, draw: F) -> Result<AppControl, E>
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>) -> Result<(), E>,
        E: From<RenderError>,
    {
        let size = self.gpu.size();
        if size.width == 0 || size.height == 0 {
            log::trace!("skipping frame for zero-sized surface");
            return Ok(AppControl::Continue);
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return Ok(match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    SurfaceErrorAction::Reconfigured => {
                        self.window.request_redraw();
                        AppControl::Continue
                    }
                    SurfaceErrorAction::SkipFrame => AppControl::Continue,
                });
            }
        };

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            Viewport::new(size.width as f32, size.height as f32),
            self.gpu.errors(),
        );

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            target.clear(clear.to_wgpu());
            if let Err(err) = draw(&rctx, &mut target) {
                // Messages were logged on arrival; they belong to this frame.
                rctx.errors.drain();
                return Err(err);
            }
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame)?;

        Ok(AppControl::Continue)
    }
}
