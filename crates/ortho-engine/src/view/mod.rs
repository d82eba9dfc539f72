//! Viewing transform: window-size driven orthographic projection, device <->
//! logical mapping and the zoom/pointer view state.

mod projection;
mod zoom;

pub use projection::{
    device_to_logical, logical_to_device, project, unproject, InvalidDimensionError,
    InvalidTargetError, LogicalBounds, ProjectionController, ProjectionState,
};
pub use zoom::{ViewState, ZoomStep, MIN_ZOOM};
