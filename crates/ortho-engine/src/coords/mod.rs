//! Coordinate types shared by the projection, the canvas and the runtime.
//!
//! Two spaces are in play:
//! - Device space: physical pixels, origin top-left, +X right, +Y down.
//!   Window sizes and pointer positions arrive in this space.
//! - Logical space: the canvas' own units, origin at the centre of the
//!   logical extent, +X right, +Y up. Geometry is authored here.
//!
//! `view::ProjectionState` owns the mapping between the two.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
