//! GPU-backed checks against a headless adapter.
//!
//! Each test returns early when the machine has no usable adapter.

use ortho_engine::canvas::{Canvas, CanvasConfig, CanvasError};
use ortho_engine::coords::Viewport;
use ortho_engine::device::{GpuInit, HeadlessGpu};
use ortho_engine::paint::Color;
use ortho_engine::render::geometry::vertex_layouts;
use ortho_engine::render::{
    compile, sources, BaseVertex, GeometryBuffer, GeometryError, GeometrySpec, RenderCtx,
    RenderError, RenderTarget, ShaderBuildError, ShaderProgram, ShaderProgramDesc,
};

fn headless() -> Option<HeadlessGpu> {
    match pollster::block_on(HeadlessGpu::new(GpuInit::default())) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping GPU test: {err:#}");
            None
        }
    }
}

fn render_ctx(gpu: &HeadlessGpu, width: u32, height: u32) -> RenderCtx<'_> {
    RenderCtx::new(
        gpu.device(),
        gpu.queue(),
        gpu.format(),
        Viewport::new(width as f32, height as f32),
        gpu.errors(),
    )
}

fn shape_program(ctx: &RenderCtx<'_>) -> ShaderProgram {
    let compiled = compile(sources::INSTANCED_VERTEX, sources::SHAPE_FRAGMENT).unwrap();
    let layouts = vertex_layouts();
    ShaderProgram::new(
        ctx,
        &compiled,
        &ShaderProgramDesc {
            label: "test shapes",
            vertex_buffers: &layouts,
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: None,
        },
    )
    .unwrap()
}

#[test]
fn canvas_paints_into_an_offscreen_target() {
    let Some(gpu) = headless() else { return };
    let ctx = render_ctx(&gpu, 800, 600);
    let texture = gpu.create_target(800, 600);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut canvas = Canvas::new(CanvasConfig::default()).unwrap();
    assert!(!canvas.is_ready());

    for _ in 0..2 {
        let mut encoder = gpu.create_encoder();
        {
            let mut target = RenderTarget::new(&mut encoder, &view);
            target.clear(Color::BLACK.to_wgpu());
            canvas.on_paint(&ctx, &mut target).unwrap();
        }
        gpu.submit(encoder).unwrap();
    }

    assert!(canvas.is_ready());
    let projection = canvas.projection().unwrap();
    assert_eq!(
        (projection.window_width(), projection.window_height()),
        (800, 600)
    );
}

#[test]
fn paint_without_a_size_is_a_render_error() {
    let Some(gpu) = headless() else { return };
    let ctx = RenderCtx::new(
        gpu.device(),
        gpu.queue(),
        gpu.format(),
        Viewport::new(0.0, 0.0),
        gpu.errors(),
    );
    let texture = gpu.create_target(4, 4);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut canvas = Canvas::new(CanvasConfig::default()).unwrap();
    let mut encoder = gpu.create_encoder();
    let mut target = RenderTarget::new(&mut encoder, &view);

    let err = canvas.on_paint(&ctx, &mut target).unwrap_err();
    assert_eq!(err, CanvasError::Render(RenderError::Unsized));
    assert!(!err.is_fatal());
}

#[test]
fn out_of_range_draws_are_rejected() {
    let Some(gpu) = headless() else { return };
    let ctx = render_ctx(&gpu, 64, 64);
    let program = shape_program(&ctx);

    let offsets = CanvasConfig::default().shape_offsets;
    let geometry =
        GeometryBuffer::upload(gpu.device(), "test", &GeometrySpec::triangle_batch(&offsets)).unwrap();
    assert_eq!(geometry.vertex_count(), 3);
    assert_eq!(geometry.instance_count(), 9);

    let texture = gpu.create_target(64, 64);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = gpu.create_encoder();
    {
        let mut target = RenderTarget::new(&mut encoder, &view);
        let mut pass = target.begin_pass("test pass");
        program.bind(&mut pass);

        assert!(matches!(
            geometry.draw(&mut pass, 4, 1),
            Err(RenderError::DrawOutOfRange { .. })
        ));
        assert!(matches!(
            geometry.draw(&mut pass, 3, 10),
            Err(RenderError::DrawOutOfRange { .. })
        ));
        geometry.draw(&mut pass, 3, 9).unwrap();
    }
    gpu.submit(encoder).unwrap();
}

#[test]
fn uniform_writes_are_checked() {
    let Some(gpu) = headless() else { return };
    let ctx = render_ctx(&gpu, 64, 64);
    let program = shape_program(&ctx);

    let fill = program.uniform_location("fill_color").unwrap();
    program
        .write_uniform(gpu.queue(), fill, bytemuck::cast_slice(&Color::GREEN.to_array()))
        .unwrap();

    let err = program.write_uniform(gpu.queue(), fill, &[0u8; 8]).unwrap_err();
    assert!(matches!(err, RenderError::UniformSize { expected: 16, actual: 8, .. }));

    let err = program.write_uniform(gpu.queue(), 7, &[0u8; 16]).unwrap_err();
    assert_eq!(err, RenderError::UnknownUniform(7));
}

#[test]
fn geometry_upload_rules() {
    let Some(gpu) = headless() else { return };

    let err = GeometryBuffer::upload(gpu.device(), "empty", &GeometrySpec::default()).err();
    assert_eq!(err, Some(GeometryError::EmptyVertices));

    let single = GeometrySpec::new(vec![BaseVertex::new(0.0, 0.0)], Vec::new());
    let buffer = GeometryBuffer::upload(gpu.device(), "single", &single).unwrap();
    assert_eq!(buffer.instance_count(), 1);
}

#[test]
fn unfed_vertex_inputs_fail_to_link() {
    let Some(gpu) = headless() else { return };
    let ctx = render_ctx(&gpu, 64, 64);
    let compiled = compile(sources::INSTANCED_VERTEX, sources::SHAPE_FRAGMENT).unwrap();

    let only_base = [BaseVertex::layout()];
    let err = ShaderProgram::new(
        &ctx,
        &compiled,
        &ShaderProgramDesc {
            label: "missing offsets",
            vertex_buffers: &only_base,
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: None,
        },
    )
    .err()
    .unwrap();
    assert!(matches!(err, ShaderBuildError::Link { .. }));
    assert!(err.log().contains("[1]"));
}

#[test]
fn device_error_drops_only_the_failing_frame() {
    let Some(gpu) = headless() else { return };
    let ctx = render_ctx(&gpu, 320, 240);
    let texture = gpu.create_target(320, 240);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let paint = |canvas: &mut Canvas| {
        let mut encoder = gpu.create_encoder();
        {
            let mut target = RenderTarget::new(&mut encoder, &view);
            target.clear(Color::BLACK.to_wgpu());
            canvas.on_paint(&ctx, &mut target).unwrap();
        }
        gpu.submit(encoder)
    };

    let mut canvas = Canvas::new(CanvasConfig::default()).unwrap();
    paint(&mut canvas).unwrap();
    let before = *canvas.projection().unwrap();

    // A draw with no pipeline set only fails on the device side.
    let geometry =
        GeometryBuffer::upload(gpu.device(), "unbound", &GeometrySpec::triangle_batch(&[[0.0, 0.0]]))
            .unwrap();
    let mut encoder = gpu.create_encoder();
    {
        let mut target = RenderTarget::new(&mut encoder, &view);
        let mut pass = target.begin_pass("unbound pass");
        geometry.draw(&mut pass, 3, 1).unwrap();
    }
    let err = gpu.submit(encoder).unwrap_err();
    assert!(matches!(err, RenderError::Gpu(_)), "{err}");
    assert!(gpu.errors().is_empty());

    paint(&mut canvas).unwrap();
    assert!(canvas.is_ready());
    assert_eq!(canvas.projection(), Some(&before));
}
