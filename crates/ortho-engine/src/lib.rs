//! Ortho engine crate.
//!
//! An interactive 2D canvas with an aspect-preserving orthographic projection:
//! - `view`: window size -> projection, device <-> logical mapping, zoom
//! - `render`: shader programs and instanced geometry on wgpu
//! - `canvas`: per-frame orchestration of the above
//!
//! plus the platform and GPU runtime pieces that host it.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod paint;
pub mod render;
pub mod view;
pub mod canvas;
