use std::sync::Arc;

use glam::{DMat4, DVec3};

use crate::animation::keyframer::ChannelValues;
use crate::animation::stagger::{ShapeOrderCache, stagger_time};
use crate::assets::{AssetCache, AssetKind};
use crate::assets::store::asset_error;
use crate::compile::attributes::{resolve_color, resolve_weight};
use crate::compile::camera::CameraState;
use crate::compile::plan::{
    BlendPass, ClearPass, ClipApply, DrawOp, MaskResolvePass, Pass, PixelFormat, PresentPass,
    RenderPlan, ScenePass, SurfaceDesc, SurfaceId,
};
use crate::foundation::core::{Canvas, Rect, Rgba, Vec2};
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::foundation::math::{model_matrix, project_to_pixels};
use crate::layer::model::{BlendMode, CameraKind, ObjectKind, RenderTarget};
use crate::layer::resolve::ResolvedObject;
use crate::layer::ResolvedLayer;

/// Stroke weight multiplier for `svg-3d` objects seen through a perspective camera.
pub const PERSPECTIVE_STROKE_GAIN: f64 = 256.0;
/// Baseline distance between text-curtain rows, in canvas pixels.
pub const CURTAIN_LINE_HEIGHT: f64 = 14.0;
pub const CURTAIN_FONT_SIZE: f64 = 12.0;

/// Active objects of one layer split by render target, each group in drawing order.
#[derive(Debug, Default)]
pub struct TargetGroups<'a> {
    pub clip_a: Vec<&'a ResolvedObject>,
    pub clip_b: Vec<&'a ResolvedObject>,
    pub image: Vec<&'a ResolvedObject>,
}

impl<'a> TargetGroups<'a> {
    pub fn get(&self, target: RenderTarget) -> &[&'a ResolvedObject] {
        match target {
            RenderTarget::ClipA => &self.clip_a,
            RenderTarget::ClipB => &self.clip_b,
            RenderTarget::Image => &self.image,
        }
    }

    /// Groups in processing order: clip-a, clip-b, image.
    pub fn in_order(&self) -> impl Iterator<Item = (RenderTarget, &[&'a ResolvedObject])> {
        RenderTarget::ORDER.into_iter().map(|t| (t, self.get(t)))
    }
}

/// Objects of `layer` active at `t`, stable-sorted by z-index and grouped by target.
pub fn group_active_objects(layer: &ResolvedLayer, t: f64) -> TargetGroups<'_> {
    let mut active: Vec<&ResolvedObject> = layer.objects.iter().filter(|o| o.is_active(t)).collect();
    active.sort_by_key(|o| o.z_index);

    let mut groups = TargetGroups::default();
    for obj in active {
        match obj.target {
            RenderTarget::ClipA => groups.clip_a.push(obj),
            RenderTarget::ClipB => groups.clip_b.push(obj),
            RenderTarget::Image => groups.image.push(obj),
        }
    }
    groups
}

/// Enabled layers in ascending z-index; ties keep their input order.
pub fn ordered_layers(layers: &[Arc<ResolvedLayer>]) -> Vec<&ResolvedLayer> {
    let mut out: Vec<&ResolvedLayer> = layers.iter().map(Arc::as_ref).filter(|l| l.enabled).collect();
    out.sort_by_key(|l| l.z_index);
    out
}

/// Font used for text-curtain glyphs.
#[derive(Clone, Debug)]
pub struct FontRef {
    /// Asset path of the font; keys the shaper's family registry.
    pub key: String,
    pub bytes: Arc<Vec<u8>>,
}

/// Everything one frame compilation reads.
#[derive(Clone, Copy)]
pub struct FrameInputs<'a> {
    pub layers: &'a [Arc<ResolvedLayer>],
    /// Animation time in seconds.
    pub time: f64,
    pub canvas: Canvas,
    pub assets: &'a AssetCache,
    pub font: Option<&'a FontRef>,
}

/// Compiles snapshots into per-frame [`RenderPlan`]s.
///
/// Holds the shape-order permutations, which stay valid until [`FrameCompiler::reset`] is called
/// for a new snapshot.
#[derive(Debug, Default)]
pub struct FrameCompiler {
    orders: ShapeOrderCache,
}

impl FrameCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop cached permutations.
    pub fn reset(&mut self) {
        self.orders.clear();
    }

    #[tracing::instrument(skip_all, fields(time = inputs.time))]
    pub fn compile(&mut self, inputs: &FrameInputs<'_>) -> LayerplayResult<RenderPlan> {
        let desc = SurfaceDesc {
            width: inputs.canvas.width,
            height: inputs.canvas.height,
            format: PixelFormat::Rgba8Premul,
        };
        let masks = [SurfaceId::MASK_A, SurfaceId::MASK_B];

        let mut passes = vec![Pass::Clear(ClearPass {
            targets: vec![
                SurfaceId::ACCUM,
                SurfaceId::CLIP_A,
                SurfaceId::CLIP_B,
                SurfaceId::MASK_A,
                SurfaceId::MASK_B,
            ],
        })];

        for layer in ordered_layers(inputs.layers) {
            let camera = CameraState::sample(&layer.camera, inputs.time);
            let vp = camera.view_projection(inputs.canvas);
            let groups = group_active_objects(layer, inputs.time);
            let label = layer.name();

            for (target, objects) in groups.in_order() {
                if objects.is_empty() {
                    continue;
                }
                let mut ops = Vec::new();
                for obj in objects {
                    self.emit_object(layer, obj, &camera, vp, inputs, &mut ops)?;
                }

                match target {
                    RenderTarget::ClipA | RenderTarget::ClipB => {
                        let (clip, mask) = if target == RenderTarget::ClipA {
                            (SurfaceId::CLIP_A, SurfaceId::MASK_A)
                        } else {
                            (SurfaceId::CLIP_B, SurfaceId::MASK_B)
                        };
                        passes.push(Pass::Scene(ScenePass {
                            target: clip,
                            ops,
                            masks,
                            label: label.clone(),
                        }));
                        passes.push(Pass::MaskResolve(MaskResolvePass {
                            input: clip,
                            output: mask,
                        }));
                    }
                    RenderTarget::Image if layer.blend != BlendMode::Normal => {
                        passes.push(Pass::Clear(ClearPass {
                            targets: vec![SurfaceId::BLEND_AUX],
                        }));
                        passes.push(Pass::Scene(ScenePass {
                            target: SurfaceId::BLEND_AUX,
                            ops,
                            masks,
                            label: label.clone(),
                        }));
                        passes.push(Pass::Blend(BlendPass {
                            src: SurfaceId::BLEND_AUX,
                            dst: SurfaceId::ACCUM,
                            mode: layer.blend,
                        }));
                    }
                    RenderTarget::Image => passes.push(Pass::Scene(ScenePass {
                        target: SurfaceId::ACCUM,
                        ops,
                        masks,
                        label: label.clone(),
                    })),
                }
            }
        }

        passes.push(Pass::Present(PresentPass {
            src: SurfaceId::ACCUM,
            target: SurfaceId::FINAL,
            background: Rgba::BLACK,
        }));

        Ok(RenderPlan {
            canvas: inputs.canvas,
            surfaces: vec![desc; SurfaceId::COUNT],
            passes,
            final_surface: SurfaceId::FINAL,
            masks,
        })
    }

    fn emit_object(
        &mut self,
        layer: &ResolvedLayer,
        obj: &ResolvedObject,
        camera: &CameraState,
        vp: DMat4,
        inputs: &FrameInputs<'_>,
        ops: &mut Vec<DrawOp>,
    ) -> LayerplayResult<()> {
        let object_time = inputs.time - obj.time;
        let a = obj.animation.sample(object_time);
        let object_clip_blend = a.value("object-clip-blend", 1.0);
        let asset = select_asset(obj, &a);
        let with_context = |e: LayerplayError| asset_error(asset, &layer.file, &obj.describe(), e);

        match obj.kind {
            ObjectKind::Svg | ObjectKind::Svg3d => {
                let comp = inputs.assets.vector(asset).map_err(with_context)?;
                let gain = match (obj.kind, camera.kind) {
                    (ObjectKind::Svg3d, CameraKind::Perspective) => PERSPECTIVE_STROKE_GAIN,
                    _ => 1.0,
                };
                let center = DMat4::from_translation(DVec3::new(
                    -comp.width / 2.0,
                    -comp.height / 2.0,
                    0.0,
                ));
                let shapes = comp.find_shapes();
                for (index, shape) in shapes.iter().enumerate() {
                    let staggered =
                        stagger_time(&obj.staggers, &mut self.orders, object_time, shapes.len(), index);
                    let s = obj.animation.sample(obj.stepping.apply(obj.duration(), staggered));
                    let clip = ClipApply {
                        mask: obj.clip_mask,
                        blend: object_clip_blend * s.value("clip-blend", 1.0),
                    };
                    let mvp = vp * object_model(&s) * flip_y() * center;

                    let fill = resolve_color(
                        obj.attributes.fill,
                        s.color("fill", Rgba::TRANSPARENT),
                        shape.fill,
                    );
                    if !fill.is_invisible() && !shape.contours.is_empty() {
                        ops.push(DrawOp::Fill {
                            contours: shape.contours.clone(),
                            mvp,
                            color: fill,
                            clip,
                        });
                    }

                    let stroke = resolve_color(
                        obj.attributes.stroke,
                        s.color("stroke", Rgba::WHITE),
                        shape.stroke,
                    );
                    let weight = resolve_weight(
                        obj.attributes.stroke_weight,
                        s.value("stroke-weight", 1.0),
                        shape.stroke_weight,
                    ) * gain;
                    if stroke.is_invisible() || weight <= 0.0 {
                        continue;
                    }
                    let (c0, c1) = (s.value("c0", 0.0), s.value("c1", 1.0));
                    let contours: Vec<_> = if c0 == 0.0 && c1 == 1.0 {
                        shape.contours.clone()
                    } else {
                        shape
                            .contours
                            .iter()
                            .map(|c| c.sub(c0, c1))
                            .filter(|c| !c.is_empty())
                            .collect()
                    };
                    if !contours.is_empty() {
                        ops.push(DrawOp::Stroke {
                            contours,
                            mvp,
                            color: stroke,
                            weight,
                            clip,
                        });
                    }
                }
            }
            ObjectKind::Image => {
                let mut image = inputs.assets.image(asset).map_err(with_context)?;
                if a.value("image-dither", 0.0) >= 1.0 {
                    image = image.dithered();
                }
                let (w, h) = (f64::from(image.width), f64::from(image.height));
                let source = Rect::new(
                    a.value("image-left", 0.0) * w,
                    a.value("image-top", 0.0) * h,
                    a.value("image-right", 1.0) * w,
                    a.value("image-bottom", 1.0) * h,
                );
                let dest = source - Vec2::new(w / 2.0, h / 2.0);
                ops.push(DrawOp::Image {
                    image,
                    source,
                    dest,
                    mvp: vp * object_model(&a) * flip_y(),
                    tint: a.color("image-tint", Rgba::WHITE),
                    clip: ClipApply {
                        mask: obj.clip_mask,
                        blend: object_clip_blend * a.value("clip-blend", 1.0),
                    },
                });
            }
            ObjectKind::Gltf => {
                inputs
                    .assets
                    .get_or_load(AssetKind::Model, asset)
                    .map_err(with_context)?;
                ops.push(DrawOp::Model {
                    asset: asset.to_string(),
                    mvp: vp * object_model(&a),
                    clip: ClipApply {
                        mask: obj.clip_mask,
                        blend: object_clip_blend * a.value("clip-blend", 1.0),
                    },
                });
            }
            ObjectKind::TextCurtain => {
                let curtain = inputs.assets.curtain(asset).map_err(with_context)?;
                let Some(font) = inputs.font else {
                    tracing::debug!(object = %obj.describe(), "no demo font; skipping text curtain");
                    return Ok(());
                };
                let color = a.color("fill", Rgba::TRANSPARENT);
                if color.is_invisible() {
                    return Ok(());
                }
                let canvas = inputs.canvas;
                let text_space = vp
                    * flip_y()
                    * DMat4::from_translation(DVec3::new(
                        -f64::from(canvas.width) / 2.0,
                        -f64::from(canvas.height) / 2.0,
                        0.0,
                    ));
                let (Some(origin), Some(unit)) = (
                    project_to_pixels(&text_space, DVec3::ZERO, canvas),
                    project_to_pixels(&text_space, DVec3::X, canvas),
                ) else {
                    return Ok(());
                };
                let scale = origin.distance(unit);
                ops.push(DrawOp::Text {
                    lines: curtain.reveal(
                        a.value("curtain-start", 0.0),
                        a.value("curtain-end", 1.0),
                    ),
                    font_key: font.key.clone(),
                    font: font.bytes.clone(),
                    origin,
                    line_height_px: CURTAIN_LINE_HEIGHT * scale,
                    size_px: (CURTAIN_FONT_SIZE * scale) as f32,
                    color,
                    clip: ClipApply {
                        mask: obj.clip_mask,
                        blend: object_clip_blend * a.value("clip-blend", 1.0),
                    },
                });
            }
        }
        Ok(())
    }
}

/// Asset chosen by the rounded `asset-index` channel, clamped to the list.
fn select_asset<'o>(obj: &'o ResolvedObject, a: &ChannelValues<'_>) -> &'o str {
    let last = obj.assets.len().saturating_sub(1);
    let idx = a.value("asset-index", 0.0).round().clamp(0.0, last as f64) as usize;
    obj.assets.get(idx).map(String::as_str).unwrap_or_default()
}

/// Model matrix from the transform channels.
fn object_model(v: &ChannelValues<'_>) -> DMat4 {
    model_matrix(
        DVec3::new(v.value("x", 0.0), v.value("y", 0.0), v.value("z", 0.0)),
        DVec3::new(v.value("rx", 0.0), v.value("ry", 0.0), v.value("rz", 0.0)),
        v.value("scale", 1.0),
    )
}

/// Asset space is y-down; world space is y-up.
fn flip_y() -> DMat4 {
    DMat4::from_scale(DVec3::new(1.0, -1.0, 1.0))
}

#[cfg(test)]
#[path = "../../tests/unit/compile/scheduler.rs"]
mod tests;
