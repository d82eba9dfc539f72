use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::error::{GeometryError, RenderError};

/// Shared shape vertex, in logical units.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BaseVertex {
    pub position: [f32; 3],
}

impl BaseVertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            position: [x, y, 0.0],
        }
    }

    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BaseVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Per-instance translation, in logical units.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceOffset {
    pub offset: [f32; 2],
}

impl InstanceOffset {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { offset: [x, y] }
    }

    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceOffset>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Vertex buffer layouts in slot order, matching `GeometryBuffer::draw`.
pub fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [BaseVertex::layout(), InstanceOffset::layout()]
}

/// CPU-side description of an instanced primitive set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometrySpec {
    pub base_vertices: Vec<BaseVertex>,
    pub instance_offsets: Vec<InstanceOffset>,
}

impl GeometrySpec {
    pub fn new(base_vertices: Vec<BaseVertex>, instance_offsets: Vec<InstanceOffset>) -> Self {
        Self {
            base_vertices,
            instance_offsets,
        }
    }

    /// A `cells` x `cells` grid of unit squares centred on the origin, as a
    /// line list. Both axes get `cells + 1` lines so the closing edges exist.
    pub fn grid(cells: u32) -> Self {
        let half = cells as f32 / 2.0;
        let mut base_vertices = Vec::with_capacity(4 * (cells as usize + 1));

        for i in 0..=cells {
            let t = i as f32 - half;
            // vertical
            base_vertices.push(BaseVertex::new(t, -half));
            base_vertices.push(BaseVertex::new(t, half));
            // horizontal
            base_vertices.push(BaseVertex::new(-half, t));
            base_vertices.push(BaseVertex::new(half, t));
        }

        Self {
            base_vertices,
            instance_offsets: Vec::new(),
        }
    }

    /// One triangle repeated at every offset.
    pub fn triangle_batch(offsets: &[[f32; 2]]) -> Self {
        Self {
            base_vertices: vec![
                BaseVertex::new(0.0, -1.0),
                BaseVertex::new(-1.0, 1.0),
                BaseVertex::new(1.0, 1.0),
            ],
            instance_offsets: offsets
                .iter()
                .map(|&[x, y]| InstanceOffset::new(x, y))
                .collect(),
        }
    }
}

/// Vertex and instance buffers uploaded once.
///
/// Slot 0 holds base vertices (location 0), slot 1 instance offsets
/// (location 1). Both are immutable after `upload`.
pub struct GeometryBuffer {
    vertices: wgpu::Buffer,
    instances: wgpu::Buffer,
    vertex_count: u32,
    instance_count: u32,
}

impl GeometryBuffer {
    /// Creates both GPU buffers from `spec`.
    ///
    /// An empty `instance_offsets` uploads a single zero offset.
    pub fn upload(
        device: &wgpu::Device,
        label: &str,
        spec: &GeometrySpec,
    ) -> Result<Self, GeometryError> {
        if spec.base_vertices.is_empty() {
            return Err(GeometryError::EmptyVertices);
        }

        let zero = [InstanceOffset::default()];
        let offsets: &[InstanceOffset] = if spec.instance_offsets.is_empty() {
            &zero
        } else {
            &spec.instance_offsets
        };

        let vertex_count = draw_len(spec.base_vertices.len())?;
        let instance_count = draw_len(offsets.len())?;

        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertices")),
            contents: bytemuck::cast_slice(&spec.base_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} instances")),
            contents: bytemuck::cast_slice(offsets),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::debug!("uploaded `{label}`: {vertex_count} vertices, {instance_count} instance(s)");

        Ok(Self {
            vertices,
            instances,
            vertex_count,
            instance_count,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    /// Binds both buffers on `pass` and draws `instance_count` copies of the
    /// first `primitive_count` vertices.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        primitive_count: u32,
        instance_count: u32,
    ) -> Result<(), RenderError> {
        check_draw_range(
            primitive_count,
            instance_count,
            self.vertex_count,
            self.instance_count,
        )?;

        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.set_vertex_buffer(1, self.instances.slice(..));
        pass.draw(0..primitive_count, 0..instance_count);
        Ok(())
    }
}

fn draw_len(len: usize) -> Result<u32, GeometryError> {
    u32::try_from(len).map_err(|_| GeometryError::TooLarge { len })
}

/// Rejects draws that would read past the uploaded data.
pub(crate) fn check_draw_range(
    primitive_count: u32,
    instance_count: u32,
    uploaded_vertices: u32,
    uploaded_instances: u32,
) -> Result<(), RenderError> {
    if primitive_count > uploaded_vertices || instance_count > uploaded_instances {
        return Err(RenderError::DrawOutOfRange {
            primitive_count,
            instance_count,
            uploaded_vertices,
            uploaded_instances,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_includes_closing_lines() {
        let grid = GeometrySpec::grid(10);
        // 11 vertical + 11 horizontal lines, two vertices each.
        assert_eq!(grid.base_vertices.len(), 44);
        assert!(grid.instance_offsets.is_empty());

        let max_x = grid
            .base_vertices
            .iter()
            .map(|v| v.position[0])
            .fold(f32::MIN, f32::max);
        assert_eq!(max_x, 5.0);
        assert!(grid.base_vertices.contains(&BaseVertex::new(5.0, -5.0)));
        assert!(grid.base_vertices.contains(&BaseVertex::new(-5.0, 5.0)));
    }

    #[test]
    fn triangle_batch_uses_every_offset() {
        let offsets = [[-2.0, -2.0], [0.0, 0.0], [2.0, 2.0]];
        let batch = GeometrySpec::triangle_batch(&offsets);
        assert_eq!(batch.base_vertices.len(), 3);
        assert_eq!(batch.base_vertices[0], BaseVertex::new(0.0, -1.0));
        assert_eq!(batch.instance_offsets.len(), 3);
        assert_eq!(batch.instance_offsets[2], InstanceOffset::new(2.0, 2.0));
    }

    #[test]
    fn draw_range_is_checked_per_axis() {
        assert!(check_draw_range(3, 9, 3, 9).is_ok());
        assert!(check_draw_range(0, 0, 3, 9).is_ok());

        let err = check_draw_range(4, 1, 3, 9).unwrap_err();
        assert!(matches!(err, RenderError::DrawOutOfRange { primitive_count: 4, .. }));

        let err = check_draw_range(3, 10, 3, 9).unwrap_err();
        assert!(matches!(err, RenderError::DrawOutOfRange { instance_count: 10, .. }));
    }

    #[test]
    fn layouts_match_shader_locations() {
        let [base, instance] = vertex_layouts();
        assert_eq!(base.attributes[0].shader_location, 0);
        assert_eq!(base.attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(base.step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(instance.attributes[0].shader_location, 1);
        assert_eq!(instance.attributes[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(instance.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(base.array_stride, 12);
        assert_eq!(instance.array_stride, 8);
    }
}
