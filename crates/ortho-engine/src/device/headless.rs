use anyhow::{Context, Result};

use crate::render::RenderError;

use super::init::{create_instance, request_device};
use super::{ErrorSink, GpuInit};

/// Device and queue without a window or surface.
///
/// Renders into textures created by `create_target`. Used by integration tests
/// and for offscreen rendering.
pub struct HeadlessGpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
    errors: ErrorSink,
    format: wgpu::TextureFormat,
}

impl HeadlessGpu {
    /// Fails when no adapter is available (e.g. CI machines without a GPU or
    /// software rasterizer).
    pub async fn new(init: GpuInit) -> Result<Self> {
        let instance = create_instance();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter available for headless rendering")?;

        let (device, queue) = request_device(&adapter, &init, "ortho headless device").await?;
        let errors = ErrorSink::install(&device);

        let format = if init.prefer_srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        Ok(Self {
            device,
            queue,
            errors,
            format,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn errors(&self) -> &ErrorSink {
        &self.errors
    }

    /// Color format of targets created by `create_target`.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn create_target(&self, width: u32, height: u32) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ortho headless target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    pub fn create_encoder(&self) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ortho headless encoder"),
            })
    }

    /// Same contract as `Gpu::submit`: nothing is submitted when the device
    /// reported an error during recording.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) -> std::result::Result<(), RenderError> {
        let commands = encoder.finish();
        if let Some(message) = self.errors.take_joined() {
            return Err(RenderError::Gpu(message));
        }
        self.queue.submit(std::iter::once(commands));
        Ok(())
    }
}
