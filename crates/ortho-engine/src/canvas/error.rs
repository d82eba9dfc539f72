use thiserror::Error;

use crate::render::{GeometryError, RenderError, ShaderBuildError};
use crate::view::InvalidTargetError;

/// Failure of `Canvas::new` or `Canvas::on_paint`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error(transparent)]
    Config(#[from] InvalidTargetError),

    #[error(transparent)]
    Shader(#[from] ShaderBuildError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl CanvasError {
    /// Setup failures are permanent; a render failure only loses its frame.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CanvasError::Render(_))
    }
}
