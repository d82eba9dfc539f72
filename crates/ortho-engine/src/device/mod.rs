//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface for the canvas window
//! - acquiring frames and submitting them once recording succeeded
//! - collecting device errors raised outside an explicit call site
//!
//! `headless` offers the same device bring-up without a window, for tests and
//! offscreen rendering.

mod context;
mod error;
mod frame;
mod headless;
mod init;
mod surface;

pub use context::Gpu;
pub use error::{ErrorSink, SurfaceErrorAction};
pub use frame::GpuFrame;
pub use headless::HeadlessGpu;
pub use init::GpuInit;
