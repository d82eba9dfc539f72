//! GPU rendering primitives.
//!
//! - `shader`: compile + link WGSL programs and build their pipelines
//! - `geometry`: instanced vertex data uploaded once, drawn per frame
//!
//! Every draw takes the render pass explicitly; nothing here tracks a
//! "currently bound" program or buffer.

mod ctx;
mod error;
pub mod geometry;
pub mod shader;

pub use ctx::{RenderCtx, RenderTarget};
pub use error::{GeometryError, RenderError, ShaderBuildError, ShaderStage};
pub use geometry::{BaseVertex, GeometryBuffer, GeometrySpec, InstanceOffset};
pub use shader::{
    compile, CompiledProgram, ProgramId, ShaderHandle, ShaderProgram, ShaderProgramDesc,
    UniformSlot,
};

/// Bundled WGSL sources.
pub mod sources {
    pub const INSTANCED_VERTEX: &str = include_str!("shaders/instanced.vert.wgsl");
    pub const GRID_FRAGMENT: &str = include_str!("shaders/grid.frag.wgsl");
    pub const SHAPE_FRAGMENT: &str = include_str!("shaders/shape.frag.wgsl");
}
