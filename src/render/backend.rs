use crate::compile::plan::RenderPlan;
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::render::passes::{PassBackend, execute_plan};

/// A rendered surface as RGBA8 pixels.
///
/// Surfaces are premultiplied; the `premultiplied` flag makes that explicit at API boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha copy suitable for image encoders.
    pub fn to_rgba_image(&self) -> LayerplayResult<image::RgbaImage> {
        let mut data = self.data.clone();
        if self.premultiplied {
            for px in data.chunks_exact_mut(4) {
                let a = u32::from(px[3]);
                if a == 0 || a == 255 {
                    continue;
                }
                for c in &mut px[0..3] {
                    *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| LayerplayError::evaluation("frame byte length does not match its size"))
    }
}

/// Output of one rendered plan.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Composited frame, opaque.
    pub color: FrameRGBA,
    /// Resolved clip masks `[a, b]`, for debug overlays.
    pub masks: [FrameRGBA; 2],
}

/// A renderer that can execute a compiled [`RenderPlan`] into a [`Frame`].
pub trait RenderBackend: PassBackend {
    fn render_plan(&mut self, plan: &RenderPlan) -> LayerplayResult<Frame> {
        execute_plan(self, plan)
    }

    /// Drop cached per-asset paints; called when a new snapshot replaces the assets.
    fn clear_caches(&mut self) {}
}

/// Available backend kinds.
#[derive(Clone, Copy, Debug, Default)]
pub enum BackendKind {
    /// CPU raster backend powered by `vello_cpu`.
    #[default]
    Cpu,
}

pub fn create_backend(kind: BackendKind) -> Box<dyn RenderBackend> {
    match kind {
        BackendKind::Cpu => Box::new(crate::render::cpu::CpuBackend::new()),
    }
}
