use std::collections::HashMap;
use std::sync::Arc;

use glam::{DMat4, DVec3};
use kurbo::{BezPath, PathEl};

use crate::assets::decode::DecodedImage;
use crate::assets::store::TextLayoutEngine;
use crate::assets::svg::Contour;
use crate::compile::plan::{
    BlendPass, DrawOp, MaskResolvePass, PresentPass, RenderPlan, SurfaceDesc, SurfaceId,
};
use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgba};
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::foundation::math::project_to_pixels;
use crate::render::backend::{FrameRGBA, RenderBackend};
use crate::render::composite::{
    blend_in_place, fill_rgba8, masked_over_in_place, premul_over_in_place, resolve_mask,
    tint_in_place,
};
use crate::render::passes::PassBackend;

/// Tolerance, in pixels, for expanding strokes into fillable outlines.
const STROKE_TOLERANCE: f64 = 0.1;

/// CPU raster backend powered by `vello_cpu`.
///
/// Unmasked ops are batched into one render context and composited onto the bound surface when
/// a masked or tinted op arrives, or when the surface is unbound. Masked and tinted ops are
/// rasterized alone into a scratch pixmap and post-processed before compositing.
pub struct CpuBackend {
    surfaces: HashMap<SurfaceId, CpuSurface>,
    ctx: Option<vello_cpu::RenderContext>,
    bound: Option<BoundScene>,
    /// Keyed by the image's address; the cached `Arc` keeps that address alive.
    image_cache: HashMap<usize, (Arc<DecodedImage>, vello_cpu::Image)>,
    font_cache: HashMap<String, vello_cpu::peniko::FontData>,
    text_engine: TextLayoutEngine,
}

struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl CpuSurface {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
        }
    }

    fn canvas(&self) -> Canvas {
        Canvas {
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }
}

struct BoundScene {
    target: SurfaceId,
    surface: CpuSurface,
    ctx: vello_cpu::RenderContext,
    scratch: vello_cpu::Pixmap,
    /// `ctx` holds draws not yet composited onto `surface`.
    pending: bool,
}

impl BoundScene {
    fn flush_pending(&mut self) -> LayerplayResult<()> {
        if !self.pending {
            return Ok(());
        }
        self.rasterize()?;
        premul_over_in_place(
            self.surface.pixmap.data_as_u8_slice_mut(),
            self.scratch.data_as_u8_slice(),
        )?;
        self.pending = false;
        Ok(())
    }

    /// Render the context into `scratch` and reset it for the next batch.
    fn rasterize(&mut self) -> LayerplayResult<()> {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.scratch);
        self.ctx.reset();
        Ok(())
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
            ctx: None,
            bound: None,
            image_cache: HashMap::new(),
            font_cache: HashMap::new(),
            text_engine: TextLayoutEngine::new(),
        }
    }

    fn surface(&self, id: SurfaceId, role: &str) -> LayerplayResult<&CpuSurface> {
        self.surfaces.get(&id).ok_or_else(|| {
            LayerplayError::evaluation(format!("{role} surface {id:?} was not initialized"))
        })
    }

    fn take_surface(&mut self, id: SurfaceId, role: &str) -> LayerplayResult<CpuSurface> {
        if self.bound.as_ref().is_some_and(|b| b.target == id) {
            return Err(LayerplayError::evaluation(format!(
                "{role} surface {id:?} is currently bound"
            )));
        }
        self.surfaces.remove(&id).ok_or_else(|| {
            LayerplayError::evaluation(format!("{role} surface {id:?} was not initialized"))
        })
    }

    fn context_for(&mut self, width: u16, height: u16) -> vello_cpu::RenderContext {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        ctx
    }

    fn draw_into(
        &mut self,
        scene: &mut BoundScene,
        op: &DrawOp,
        masks: [SurfaceId; 2],
    ) -> LayerplayResult<()> {
        let tint = match op {
            DrawOp::Model { asset, .. } => {
                tracing::trace!(asset = %asset, "skipping opaque model draw");
                return Ok(());
            }
            DrawOp::Image { tint, .. } if *tint != Rgba::WHITE => Some(*tint),
            _ => None,
        };
        let clip = op.clip();
        let slot = clip.slot();

        if slot.is_none() && tint.is_none() {
            self.encode(&mut scene.ctx, op, scene.surface.canvas())?;
            scene.pending = true;
            return Ok(());
        }

        scene.flush_pending()?;
        self.encode(&mut scene.ctx, op, scene.surface.canvas())?;
        scene.rasterize()?;
        if let Some(tint) = tint {
            tint_in_place(scene.scratch.data_as_u8_slice_mut(), tint);
        }
        match slot {
            Some(i) => {
                let mask = self.surface(masks[i], "mask")?;
                masked_over_in_place(
                    scene.surface.pixmap.data_as_u8_slice_mut(),
                    scene.scratch.data_as_u8_slice(),
                    mask.pixmap.data_as_u8_slice(),
                    clip,
                )
            }
            None => premul_over_in_place(
                scene.surface.pixmap.data_as_u8_slice_mut(),
                scene.scratch.data_as_u8_slice(),
            ),
        }
    }

    fn encode(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        op: &DrawOp,
        canvas: Canvas,
    ) -> LayerplayResult<()> {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match op {
            DrawOp::Fill {
                contours,
                mvp,
                color,
                ..
            } => {
                let path = projected_path(contours, mvp, canvas);
                if path.elements().is_empty() {
                    return Ok(());
                }
                ctx.set_paint(color_to_cpu(*color));
                ctx.fill_path(&bezpath_to_cpu(&path));
            }
            DrawOp::Stroke {
                contours,
                mvp,
                color,
                weight,
                ..
            } => {
                let path = projected_path(contours, mvp, canvas);
                let Some(anchor) = contours.iter().find_map(|c| c.points.first()) else {
                    return Ok(());
                };
                let width_px = weight * unit_length_px(mvp, canvas, *anchor);
                if path.elements().is_empty() || !width_px.is_finite() || width_px <= 0.0 {
                    return Ok(());
                }
                let outline = kurbo::stroke(
                    path.iter(),
                    &kurbo::Stroke::new(width_px),
                    &kurbo::StrokeOpts::default(),
                    STROKE_TOLERANCE,
                );
                ctx.set_paint(color_to_cpu(*color));
                ctx.fill_path(&bezpath_to_cpu(&outline));
            }
            DrawOp::Image {
                image,
                source,
                dest,
                mvp,
                ..
            } => {
                let Some(transform) = image_transform(*source, *dest, mvp, canvas) else {
                    return Ok(());
                };
                let paint = self.image_paint_for(image)?;
                ctx.set_transform(affine_to_cpu(transform));
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    source.x0, source.y0, source.x1, source.y1,
                ));
            }
            DrawOp::Text {
                lines,
                font_key,
                font,
                origin,
                line_height_px,
                size_px,
                color,
                ..
            } => {
                let font_data = self.font_for(font_key, font);
                ctx.set_paint(color_to_cpu(*color));
                for (row, line) in lines.iter().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let layout = self.text_engine.layout_line(line, font_key, font, *size_px)?;
                    let at = Affine::translate((origin.x, origin.y + row as f64 * line_height_px));
                    ctx.set_transform(affine_to_cpu(at));
                    for layout_line in layout.lines() {
                        for item in layout_line.items() {
                            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                                continue;
                            };
                            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                                id: g.id,
                                x: g.x,
                                y: g.y,
                            });
                            ctx.glyph_run(&font_data)
                                .font_size(run.run().font_size())
                                .fill_glyphs(glyphs);
                        }
                    }
                }
            }
            DrawOp::Model { .. } => {}
        }
        Ok(())
    }

    fn image_paint_for(&mut self, image: &Arc<DecodedImage>) -> LayerplayResult<vello_cpu::Image> {
        let key = Arc::as_ptr(image) as usize;
        if let Some((_, paint)) = self.image_cache.get(&key) {
            return Ok(paint.clone());
        }
        let pixmap = image_premul_bytes_to_pixmap(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache.insert(key, (image.clone(), paint.clone()));
        Ok(paint)
    }

    fn font_for(&mut self, key: &str, bytes: &Arc<Vec<u8>>) -> vello_cpu::peniko::FontData {
        self.font_cache
            .entry(key.to_string())
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                    0,
                )
            })
            .clone()
    }
}

impl PassBackend for CpuBackend {
    fn ensure_surface(&mut self, id: SurfaceId, desc: &SurfaceDesc) -> LayerplayResult<()> {
        let width: u16 = desc
            .width
            .try_into()
            .map_err(|_| LayerplayError::evaluation("surface width exceeds u16"))?;
        let height: u16 = desc
            .height
            .try_into()
            .map_err(|_| LayerplayError::evaluation("surface height exceeds u16"))?;

        match self.surfaces.get_mut(&id) {
            Some(s) if s.width == width && s.height == height => {}
            Some(s) => *s = CpuSurface::new(width, height),
            None => {
                self.surfaces.insert(id, CpuSurface::new(width, height));
            }
        }
        Ok(())
    }

    fn clear(&mut self, target: SurfaceId) -> LayerplayResult<()> {
        if self.bound.as_ref().is_some_and(|b| b.target == target) {
            return Err(LayerplayError::evaluation(format!(
                "cannot clear bound surface {target:?}"
            )));
        }
        let s = self
            .surfaces
            .get_mut(&target)
            .ok_or_else(|| LayerplayError::evaluation(format!("clear target {target:?} missing")))?;
        fill_rgba8(s.pixmap.data_as_u8_slice_mut(), [0, 0, 0, 0]);
        Ok(())
    }

    fn bind(&mut self, target: SurfaceId) -> LayerplayResult<()> {
        if let Some(b) = &self.bound {
            return Err(LayerplayError::evaluation(format!(
                "cannot bind {target:?} while {:?} is bound",
                b.target
            )));
        }
        let surface = self.take_surface(target, "scene target")?;
        let ctx = self.context_for(surface.width, surface.height);
        let scratch = vello_cpu::Pixmap::new(surface.width, surface.height);
        self.bound = Some(BoundScene {
            target,
            surface,
            ctx,
            scratch,
            pending: false,
        });
        Ok(())
    }

    fn draw(&mut self, op: &DrawOp, masks: [SurfaceId; 2]) -> LayerplayResult<()> {
        let mut scene = self
            .bound
            .take()
            .ok_or_else(|| LayerplayError::evaluation("draw without a bound surface"))?;
        let result = self.draw_into(&mut scene, op, masks);
        self.bound = Some(scene);
        result
    }

    fn unbind(&mut self) -> LayerplayResult<()> {
        let mut scene = self
            .bound
            .take()
            .ok_or_else(|| LayerplayError::evaluation("unbind without a bound surface"))?;
        let flushed = scene.flush_pending();
        self.surfaces.insert(scene.target, scene.surface);
        self.ctx = Some(scene.ctx);
        flushed
    }

    fn exec_mask_resolve(&mut self, pass: &MaskResolvePass) -> LayerplayResult<()> {
        let mut output = self.take_surface(pass.output, "mask output")?;
        let result = self.surface(pass.input, "mask input").and_then(|input| {
            resolve_mask(
                output.pixmap.data_as_u8_slice_mut(),
                input.pixmap.data_as_u8_slice(),
            )
        });
        self.surfaces.insert(pass.output, output);
        result
    }

    fn exec_blend(&mut self, pass: &BlendPass) -> LayerplayResult<()> {
        let mut dst = self.take_surface(pass.dst, "blend destination")?;
        let result = self.surface(pass.src, "blend source").and_then(|src| {
            blend_in_place(
                dst.pixmap.data_as_u8_slice_mut(),
                src.pixmap.data_as_u8_slice(),
                pass.mode,
            )
        });
        self.surfaces.insert(pass.dst, dst);
        result
    }

    fn exec_present(&mut self, pass: &PresentPass) -> LayerplayResult<()> {
        let mut target = self.take_surface(pass.target, "present target")?;
        let bg = pass.background.to_premul().to_array();
        fill_rgba8(target.pixmap.data_as_u8_slice_mut(), bg);
        let result = self.surface(pass.src, "present source").and_then(|src| {
            premul_over_in_place(
                target.pixmap.data_as_u8_slice_mut(),
                src.pixmap.data_as_u8_slice(),
            )
        });
        self.surfaces.insert(pass.target, target);
        result
    }

    fn readback_rgba8(&mut self, surface: SurfaceId, plan: &RenderPlan) -> LayerplayResult<FrameRGBA> {
        let s = self.surface(surface, "readback")?;
        let data = s.pixmap.data_as_u8_slice().to_vec();
        let frame = FrameRGBA {
            width: u32::from(s.width),
            height: u32::from(s.height),
            data,
            premultiplied: true,
        };
        let surface_cap = plan.surfaces.len() as u32;
        self.surfaces.retain(|id, _| id.0 < surface_cap);
        Ok(frame)
    }
}

impl RenderBackend for CpuBackend {
    fn clear_caches(&mut self) {
        self.image_cache.clear();
        self.font_cache.clear();
    }
}

fn color_to_cpu(c: Rgba) -> vello_cpu::peniko::Color {
    let q = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    vello_cpu::peniko::Color::from_rgba8(q(c.r), q(c.g), q(c.b), q(c.a))
}

/// Contours projected into pixel space; contours with a point behind the camera are dropped.
fn projected_path(contours: &[Contour], mvp: &DMat4, canvas: Canvas) -> BezPath {
    let mut out = BezPath::new();
    for contour in contours {
        let projected: Option<Vec<Point>> = contour
            .points
            .iter()
            .map(|p| project_to_pixels(mvp, DVec3::new(p.x, p.y, 0.0), canvas))
            .collect();
        let Some(points) = projected else {
            continue;
        };
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            continue;
        };
        out.move_to(first);
        for p in iter {
            out.line_to(p);
        }
        if contour.closed {
            out.close_path();
        }
    }
    out
}

/// Pixel length of one model unit around `at`, averaged over both axes.
fn unit_length_px(mvp: &DMat4, canvas: Canvas, at: Point) -> f64 {
    let p = |dx: f64, dy: f64| project_to_pixels(mvp, DVec3::new(at.x + dx, at.y + dy, 0.0), canvas);
    match (p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0)) {
        (Some(o), Some(x), Some(y)) => 0.5 * (o.distance(x) + o.distance(y)),
        _ => 0.0,
    }
}

/// Affine taking image pixels in `source` onto the projected corners of `dest`.
fn image_transform(source: Rect, dest: Rect, mvp: &DMat4, canvas: Canvas) -> Option<Affine> {
    let (sw, sh) = (source.width(), source.height());
    if sw <= 0.0 || sh <= 0.0 {
        return None;
    }
    let corner = |x: f64, y: f64| project_to_pixels(mvp, DVec3::new(x, y, 0.0), canvas);
    let p0 = corner(dest.x0, dest.y0)?;
    let p1 = corner(dest.x1, dest.y0)?;
    let p3 = corner(dest.x0, dest.y1)?;
    let ex = (p1 - p0) / sw;
    let ey = (p3 - p0) / sh;
    let t = p0.to_vec2() - ex * source.x0 - ey * source.y0;
    Some(Affine::new([ex.x, ex.y, ey.x, ey.y, t.x, t.y]))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> LayerplayResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| LayerplayError::evaluation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| LayerplayError::evaluation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(LayerplayError::evaluation("decoded image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
