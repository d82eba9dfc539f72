use glam::Mat4;

use crate::paint::Color;
use crate::render::geometry::vertex_layouts;
use crate::render::shader::premul_alpha_blend;
use crate::render::{
    compile, sources, GeometryBuffer, GeometrySpec, RenderCtx, RenderError, ShaderBuildError,
    ShaderProgram, ShaderProgramDesc,
};

use super::config::CanvasConfig;
use super::error::CanvasError;

const MVP: &str = "mvp";
const LINE_COLOR: &str = "line_color";
const FILL_COLOR: &str = "fill_color";

/// Drawable content of the canvas, in paint order.
pub(crate) enum Layer {
    Grid {
        program: ShaderProgram,
        lines: GeometryBuffer,
        mvp: u32,
        line_color: u32,
        color: Color,
    },
    ShapeBatch {
        program: ShaderProgram,
        shapes: GeometryBuffer,
        mvp: u32,
        fill_color: u32,
        color: Color,
    },
}

/// Compiles both programs and uploads both geometry sets.
pub(crate) fn build_layers(
    ctx: &RenderCtx<'_>,
    config: &CanvasConfig,
) -> Result<Vec<Layer>, CanvasError> {
    let layouts = vertex_layouts();

    let grid_program = ShaderProgram::new(
        ctx,
        &compile(sources::INSTANCED_VERTEX, sources::GRID_FRAGMENT)?,
        &ShaderProgramDesc {
            label: "ortho grid",
            vertex_buffers: &layouts,
            topology: wgpu::PrimitiveTopology::LineList,
            blend: Some(premul_alpha_blend()),
        },
    )?;
    let lines = GeometryBuffer::upload(ctx.device, "ortho grid", &GeometrySpec::grid(config.grid_cells))?;

    let shape_program = ShaderProgram::new(
        ctx,
        &compile(sources::INSTANCED_VERTEX, sources::SHAPE_FRAGMENT)?,
        &ShaderProgramDesc {
            label: "ortho shapes",
            vertex_buffers: &layouts,
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: Some(premul_alpha_blend()),
        },
    )?;
    let shapes = GeometryBuffer::upload(
        ctx.device,
        "ortho shapes",
        &GeometrySpec::triangle_batch(&config.shape_offsets),
    )?;

    Ok(vec![
        Layer::Grid {
            mvp: require_uniform(&grid_program, MVP)?,
            line_color: require_uniform(&grid_program, LINE_COLOR)?,
            program: grid_program,
            lines,
            color: config.grid_color,
        },
        Layer::ShapeBatch {
            mvp: require_uniform(&shape_program, MVP)?,
            fill_color: require_uniform(&shape_program, FILL_COLOR)?,
            program: shape_program,
            shapes,
            color: config.shape_color,
        },
    ])
}

fn require_uniform(program: &ShaderProgram, name: &str) -> Result<u32, ShaderBuildError> {
    program
        .uniform_location(name)
        .ok_or_else(|| ShaderBuildError::link(format!("program has no `{name}` uniform")))
}

/// Draws one layer on `pass` with the given clip-from-logical transform.
pub(crate) fn draw_layer(
    layer: &Layer,
    queue: &wgpu::Queue,
    pass: &mut wgpu::RenderPass<'_>,
    clip_from_logical: &Mat4,
) -> Result<(), RenderError> {
    let mvp_bytes = clip_from_logical.to_cols_array();

    match layer {
        Layer::Grid {
            program,
            lines,
            mvp,
            line_color,
            color,
        } => {
            program.write_uniform(queue, *mvp, bytemuck::cast_slice(&mvp_bytes))?;
            program.write_uniform(queue, *line_color, bytemuck::cast_slice(&color.to_array()))?;
            program.bind(pass);
            lines.draw(pass, lines.vertex_count(), 1)
        }
        Layer::ShapeBatch {
            program,
            shapes,
            mvp,
            fill_color,
            color,
        } => {
            program.write_uniform(queue, *mvp, bytemuck::cast_slice(&mvp_bytes))?;
            program.write_uniform(queue, *fill_color, bytemuck::cast_slice(&color.to_array()))?;
            program.bind(pass);
            shapes.draw(pass, shapes.vertex_count(), shapes.instance_count())
        }
    }
}
