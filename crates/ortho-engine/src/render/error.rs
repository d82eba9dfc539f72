use std::fmt;

use thiserror::Error;

/// Pipeline stage a shader source belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Building a shader program failed. `log` is never empty.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShaderBuildError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

impl ShaderBuildError {
    pub(crate) fn compile(stage: ShaderStage, log: String) -> Self {
        Self::Compile {
            stage,
            log: non_empty(log, "unknown compile error"),
        }
    }

    pub(crate) fn link(log: impl Into<String>) -> Self {
        Self::Link {
            log: non_empty(log.into(), "unknown link error"),
        }
    }

    /// Diagnostic text from the compiler or linker.
    pub fn log(&self) -> &str {
        match self {
            Self::Compile { log, .. } | Self::Link { log } => log,
        }
    }
}

fn non_empty(log: String, fallback: &str) -> String {
    if log.trim().is_empty() {
        fallback.to_string()
    } else {
        log
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("geometry has no base vertices")]
    EmptyVertices,

    #[error("geometry buffer of {len} elements exceeds the u32 draw range")]
    TooLarge { len: usize },
}

/// A frame could not be recorded or submitted. Only that frame is lost.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("gpu error: {0}")]
    Gpu(String),

    #[error(
        "draw of {instance_count} instance(s) of {primitive_count} vertices exceeds uploaded \
         data ({uploaded_instances} instance(s) of {uploaded_vertices} vertices)"
    )]
    DrawOutOfRange {
        primitive_count: u32,
        instance_count: u32,
        uploaded_vertices: u32,
        uploaded_instances: u32,
    },

    #[error("no uniform at location {0}")]
    UnknownUniform(u32),

    #[error("uniform `{name}` holds {expected} bytes, got {actual}")]
    UniformSize {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("no valid window size has been received yet")]
    Unsized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_logs_are_replaced() {
        let err = ShaderBuildError::compile(ShaderStage::Fragment, "  \n".into());
        assert!(!err.log().trim().is_empty());
        assert!(matches!(err, ShaderBuildError::Compile { stage: ShaderStage::Fragment, .. }));

        let err = ShaderBuildError::link("");
        assert_eq!(err.log(), "unknown link error");
    }

    #[test]
    fn display_names_the_stage() {
        let err = ShaderBuildError::compile(ShaderStage::Vertex, "expected `;`".into());
        assert!(err.to_string().starts_with("vertex shader failed to compile"));
    }
}
