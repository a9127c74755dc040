//! Plan execution: the [`PassBackend`] protocol, the CPU raster backend, and pixel kernels.

pub mod backend;
pub mod composite;
pub mod cpu;
pub mod passes;

pub use backend::{BackendKind, Frame, FrameRGBA, RenderBackend, create_backend};
pub use passes::{PassBackend, execute_plan, validate_plan};
