use ortho_engine::canvas::{Canvas, CanvasConfig};
use ortho_engine::coords::Vec2;
use ortho_engine::core::{App, AppControl, FrameCtx, WindowCtx};
use ortho_engine::device::GpuInit;
use ortho_engine::input::InputEvent;
use ortho_engine::logging::{init_logging, LoggingConfig};
use ortho_engine::view::ZoomStep;
use ortho_engine::window::{LogicalSize, Runtime, RuntimeConfig};

const TITLE: &str = "ortho canvas";

fn main() {
    init_logging(LoggingConfig::default());

    if let Err(err) = run() {
        log::error!("ortho runtime error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = CanvasConfig::default().with_env_overrides();
    let (width, height) = config.size_hint;

    let runtime = RuntimeConfig {
        title: TITLE.to_string(),
        initial_size: LogicalSize::new(width as f64, height as f64),
    };

    let canvas = Canvas::new(config)?;
    Runtime::run(runtime, GpuInit::default(), StudioApp::new(canvas))
}

/// Forwards window events to the canvas and reports its state in the title.
struct StudioApp {
    canvas: Canvas,
    title: String,
}

impl StudioApp {
    fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            title: TITLE.to_string(),
        }
    }

    fn update_title(&mut self, window: &WindowCtx<'_>) {
        let title = status_title(TITLE, self.canvas.pointer_logical(), self.canvas.zoom_scale());
        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }
}

impl App for StudioApp {
    fn on_resize(&mut self, width: u32, height: u32) {
        self.canvas.on_resize(width, height);
    }

    fn on_input(&mut self, window: &WindowCtx<'_>, event: &InputEvent) -> AppControl {
        match event {
            InputEvent::PointerMoved(p) => self.canvas.on_pointer_move(p.x, p.y),
            InputEvent::PointerLeft => self.canvas.on_pointer_left(),
            InputEvent::MouseWheel { delta } => {
                if let Some(step) = ZoomStep::from_wheel(delta.vertical()) {
                    self.canvas.on_wheel(step);
                    if self.canvas.config().zoom_affects_rendering {
                        window.request_redraw();
                    }
                }
            }
            InputEvent::Focused(_) => {}
        }

        self.update_title(window);
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        log::trace!(
            "frame {}: {} input event(s) since last paint",
            ctx.time.frame_index,
            ctx.input_frame.events.len()
        );

        let clear = self.canvas.clear_color();
        let canvas = &mut self.canvas;

        match ctx.render(clear, |rctx, target| canvas.on_paint(rctx, target)) {
            Ok(control) => control,
            Err(err) if err.is_fatal() => {
                log::error!("canvas cannot render, exiting: {err}");
                AppControl::Exit
            }
            Err(err) => {
                log::warn!("dropped frame {}: {err}", ctx.time.frame_index);
                AppControl::Continue
            }
        }
    }
}

fn status_title(base: &str, pointer: Option<Vec2>, zoom: f32) -> String {
    match pointer {
        Some(p) => format!("{base} | ({:.2}, {:.2}) | zoom {zoom}", p.x, p.y),
        None => format!("{base} | zoom {zoom}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_shows_pointer_when_inside() {
        assert_eq!(
            status_title("ortho", Some(Vec2::new(2.5, -1.0)), 2.0),
            "ortho | (2.50, -1.00) | zoom 2"
        );
        assert_eq!(status_title("ortho", None, 0.5), "ortho | zoom 0.5");
    }
}
