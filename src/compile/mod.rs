//! Frame compilation: samples a snapshot of resolved layers at one instant and produces a
//! backend-agnostic [`RenderPlan`].
//!
//! Per frame the plan clears the accumulation, clip and mask surfaces, then for every enabled
//! layer (ascending z-index) draws its active objects grouped by render target in the fixed order
//! clip-a, clip-b, image. Clip groups are resolved into masks right after they are drawn; image
//! groups of layers with a non-normal blend mode go through an auxiliary surface. The accumulated
//! result is presented over black.

pub mod attributes;
pub mod camera;
pub mod plan;
pub mod scheduler;

pub use camera::CameraState;
pub use plan::{DrawOp, Pass, RenderPlan, SurfaceId};
pub use scheduler::{FontRef, FrameCompiler, FrameInputs};
