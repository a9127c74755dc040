use std::sync::Arc;

use glam::DMat4;

use crate::assets::decode::DecodedImage;
use crate::assets::svg::Contour;
use crate::foundation::core::{Canvas, Point, Rect, Rgba};
use crate::layer::model::{BlendMode, ClipMask};

/// Backend-agnostic render plan for a single frame.
///
/// A plan consists of:
/// - surface declarations (`surfaces`, indexed by [`SurfaceId`])
/// - a sequence of passes (`passes`)
/// - the surface holding the presented frame (`final_surface`)
/// - the two resolved clip-mask surfaces exposed for debug overlays (`masks`)
#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub canvas: Canvas,
    pub surfaces: Vec<SurfaceDesc>,
    pub passes: Vec<Pass>,
    pub final_surface: SurfaceId,
    pub masks: [SurfaceId; 2],
}

/// Identifier for a render surface declared in [`RenderPlan::surfaces`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl SurfaceId {
    /// Shared layer accumulation buffer.
    pub const ACCUM: Self = Self(0);
    /// Off-screen image target for layers with a non-normal blend mode.
    pub const BLEND_AUX: Self = Self(1);
    pub const CLIP_A: Self = Self(2);
    pub const CLIP_B: Self = Self(3);
    /// Resolved single-channel mask of [`SurfaceId::CLIP_A`].
    pub const MASK_A: Self = Self(4);
    pub const MASK_B: Self = Self(5);
    /// Presented frame, opaque.
    pub const FINAL: Self = Self(6);

    pub const COUNT: usize = 7;

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Surfaces a scene pass may draw into.
    pub fn is_drawable(self) -> bool {
        matches!(self, Self::ACCUM | Self::BLEND_AUX | Self::CLIP_A | Self::CLIP_B)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8Premul,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// A single pass in a [`RenderPlan`].
#[derive(Clone, Debug)]
pub enum Pass {
    Clear(ClearPass),
    Scene(ScenePass),
    MaskResolve(MaskResolvePass),
    Blend(BlendPass),
    Present(PresentPass),
}

impl Pass {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clear(_) => "clear",
            Self::Scene(_) => "scene",
            Self::MaskResolve(_) => "mask_resolve",
            Self::Blend(_) => "blend",
            Self::Present(_) => "present",
        }
    }
}

/// Reset surfaces to transparent.
#[derive(Clone, Debug)]
pub struct ClearPass {
    pub targets: Vec<SurfaceId>,
}

/// Bind `target`, draw `ops` in order, unbind.
#[derive(Clone, Debug)]
pub struct ScenePass {
    pub target: SurfaceId,
    pub ops: Vec<DrawOp>,
    /// Resolved mask surfaces sampled by ops with a clip mask: `[a, b]`.
    pub masks: [SurfaceId; 2],
    /// Layer file stem, for diagnostics.
    pub label: String,
}

/// Copy the alpha of `input` into the red (and green, blue) channel of an opaque `output`.
#[derive(Clone, Debug)]
pub struct MaskResolvePass {
    pub input: SurfaceId,
    pub output: SurfaceId,
}

/// Combine `src` into `dst` with `mode`, writing the result back into `dst`.
#[derive(Clone, Debug)]
pub struct BlendPass {
    pub src: SurfaceId,
    pub dst: SurfaceId,
    pub mode: BlendMode,
}

/// Draw `src` over an opaque `background` into `target`.
#[derive(Clone, Debug)]
pub struct PresentPass {
    pub src: SurfaceId,
    pub target: SurfaceId,
    pub background: Rgba,
}

/// How an op's fill and stroke alpha are scaled by a resolved clip mask.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipApply {
    pub mask: ClipMask,
    /// Cross-fade between unmasked (`0`) and fully masked (`1`).
    pub blend: f64,
}

impl ClipApply {
    pub const NONE: Self = Self {
        mask: ClipMask::None,
        blend: 1.0,
    };

    /// Mask factor for a resolved mask sample `m` in `[0, 1]`.
    pub fn factor(self, m: f64) -> f64 {
        let m = match self.mask {
            ClipMask::None => return 1.0,
            ClipMask::A | ClipMask::B => m,
            ClipMask::InvertA | ClipMask::InvertB => 1.0 - m,
        };
        1.0 + (m - 1.0) * self.blend.clamp(0.0, 1.0)
    }

    /// Which of the two resolved masks this op samples, if any.
    pub fn slot(self) -> Option<usize> {
        match self.mask {
            ClipMask::None => None,
            ClipMask::A | ClipMask::InvertA => Some(0),
            ClipMask::B | ClipMask::InvertB => Some(1),
        }
    }
}

/// Draw operation emitted by the frame compiler.
///
/// Geometry stays in asset space; `mvp` maps it to clip space.
#[derive(Clone, Debug)]
pub enum DrawOp {
    Fill {
        contours: Vec<Contour>,
        mvp: DMat4,
        color: Rgba,
        clip: ClipApply,
    },
    Stroke {
        contours: Vec<Contour>,
        mvp: DMat4,
        color: Rgba,
        /// Stroke width in model units.
        weight: f64,
        clip: ClipApply,
    },
    Image {
        image: Arc<DecodedImage>,
        /// Source rectangle in image pixels.
        source: Rect,
        /// Destination rectangle in model units.
        dest: Rect,
        mvp: DMat4,
        tint: Rgba,
        clip: ClipApply,
    },
    Text {
        lines: Vec<String>,
        font_key: String,
        font: Arc<Vec<u8>>,
        /// Pixel position of the first line's baseline origin.
        origin: Point,
        line_height_px: f64,
        size_px: f32,
        color: Rgba,
        clip: ClipApply,
    },
    /// Opaque 3D model; backends without a scene renderer skip it.
    Model {
        asset: String,
        mvp: DMat4,
        clip: ClipApply,
    },
}

impl DrawOp {
    pub fn clip(&self) -> ClipApply {
        match self {
            Self::Fill { clip, .. }
            | Self::Stroke { clip, .. }
            | Self::Image { clip, .. }
            | Self::Text { clip, .. }
            | Self::Model { clip, .. } => *clip,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/plan.rs"]
mod tests;
