//! Colors used for clearing and filling.
//!
//! All colors are linear with premultiplied alpha, matching the blend state the
//! shader programs are built with.

pub mod color;

pub use color::Color;
