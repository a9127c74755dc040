use anyhow::Context;
use kurbo::{Affine, BezPath, PathEl, Point};

use crate::foundation::core::Rgba;
use crate::foundation::error::LayerplayResult;

/// Flattening tolerance in asset units.
const FLATTEN_TOLERANCE: f64 = 0.1;

/// One closed or open polyline of a shape, with cumulative arc lengths for sub-ranging.
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    pub points: Vec<Point>,
    pub closed: bool,
    /// `lengths[i]` is the arc length from `points[0]` to `points[i]`.
    lengths: Vec<f64>,
}

impl Contour {
    pub fn new(points: Vec<Point>, closed: bool) -> Self {
        let mut pts = points;
        if closed && pts.len() > 1 && pts.first() != pts.last() {
            let first = pts[0];
            pts.push(first);
        }
        let mut lengths = Vec::with_capacity(pts.len());
        let mut acc = 0.0;
        for (i, p) in pts.iter().enumerate() {
            if i > 0 {
                acc += p.distance(pts[i - 1]);
            }
            lengths.push(acc);
        }
        Self {
            points: pts,
            closed,
            lengths,
        }
    }

    pub fn length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    fn point_at(&self, d: f64) -> Point {
        let i = self.lengths.partition_point(|&l| l < d);
        if i == 0 {
            return self.points[0];
        }
        if i >= self.points.len() {
            return self.points[self.points.len() - 1];
        }
        let (l0, l1) = (self.lengths[i - 1], self.lengths[i]);
        let t = if l1 > l0 { (d - l0) / (l1 - l0) } else { 0.0 };
        self.points[i - 1].lerp(self.points[i], t)
    }

    /// Portion of the contour between normalized arc-length positions `c0` and `c1`.
    ///
    /// The full range returns the contour unchanged; partial ranges are open.
    pub fn sub(&self, c0: f64, c1: f64) -> Contour {
        let (c0, c1) = (c0.clamp(0.0, 1.0), c1.clamp(0.0, 1.0));
        if c0 <= 0.0 && c1 >= 1.0 {
            return self.clone();
        }
        if c1 <= c0 || self.points.len() < 2 {
            return Contour::new(Vec::new(), false);
        }
        let total = self.length();
        let (d0, d1) = (c0 * total, c1 * total);
        let mut pts = vec![self.point_at(d0)];
        for (p, &l) in self.points.iter().zip(&self.lengths) {
            if l > d0 && l < d1 {
                pts.push(*p);
            }
        }
        pts.push(self.point_at(d1));
        Contour::new(pts, false)
    }

    pub fn is_empty(&self) -> bool {
        self.points.len() < 2
    }
}

/// A styled shape found in a vector composition.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub contours: Vec<Contour>,
    /// Authored fill, if any.
    pub fill: Option<Rgba>,
    /// Authored stroke color, if any.
    pub stroke: Option<Rgba>,
    /// Authored stroke width, if the shape is stroked.
    pub stroke_weight: Option<f64>,
}

/// Decoded SVG document reduced to flat, styled shapes in document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorComposition {
    pub width: f64,
    pub height: f64,
    shapes: Vec<Shape>,
}

impl VectorComposition {
    pub fn from_shapes(width: f64, height: f64, shapes: Vec<Shape>) -> Self {
        Self {
            width,
            height,
            shapes,
        }
    }

    pub fn find_shapes(&self) -> &[Shape] {
        &self.shapes
    }
}

/// Parse SVG bytes into a [`VectorComposition`].
pub fn parse_svg(bytes: &[u8]) -> LayerplayResult<VectorComposition> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    let size = tree.size();
    let mut shapes = Vec::new();
    collect_shapes(tree.root(), &mut shapes);
    Ok(VectorComposition::from_shapes(
        f64::from(size.width()),
        f64::from(size.height()),
        shapes,
    ))
}

fn collect_shapes(group: &usvg::Group, out: &mut Vec<Shape>) {
    for child in group.children() {
        match child {
            usvg::Node::Group(g) => collect_shapes(g.as_ref(), out),
            usvg::Node::Text(t) => collect_shapes(t.flattened(), out),
            usvg::Node::Path(p) => {
                if p.is_visible() {
                    out.push(shape_from_path(p.as_ref()));
                }
            }
            usvg::Node::Image(_) => {}
        }
    }
}

fn paint_color(paint: &usvg::Paint, opacity: f32) -> Option<Rgba> {
    match paint {
        usvg::Paint::Color(c) => Some(Rgba::new(
            f64::from(c.red) / 255.0,
            f64::from(c.green) / 255.0,
            f64::from(c.blue) / 255.0,
            f64::from(opacity),
        )),
        // Gradients and patterns have no single authored color.
        _ => None,
    }
}

fn shape_from_path(path: &usvg::Path) -> Shape {
    let ts = path.abs_transform();
    let affine = Affine::new([
        f64::from(ts.sx),
        f64::from(ts.ky),
        f64::from(ts.kx),
        f64::from(ts.sy),
        f64::from(ts.tx),
        f64::from(ts.ty),
    ]);

    let mut bez = BezPath::new();
    for seg in path.data().segments() {
        use usvg::tiny_skia_path::PathSegment;
        let pt = |p: usvg::tiny_skia_path::Point| Point::new(f64::from(p.x), f64::from(p.y));
        match seg {
            PathSegment::MoveTo(p) => bez.move_to(pt(p)),
            PathSegment::LineTo(p) => bez.line_to(pt(p)),
            PathSegment::QuadTo(p1, p2) => bez.quad_to(pt(p1), pt(p2)),
            PathSegment::CubicTo(p1, p2, p3) => bez.curve_to(pt(p1), pt(p2), pt(p3)),
            PathSegment::Close => bez.close_path(),
        }
    }
    bez.apply_affine(affine);

    let fill = path
        .fill()
        .and_then(|f| paint_color(f.paint(), f.opacity().get()));
    let (stroke, stroke_weight) = match path.stroke() {
        Some(s) => (
            paint_color(s.paint(), s.opacity().get()),
            Some(f64::from(s.width().get()) * affine.as_coeffs()[0].hypot(affine.as_coeffs()[1])),
        ),
        None => (None, None),
    };

    Shape {
        contours: contours_from_bezpath(&bez),
        fill,
        stroke,
        stroke_weight,
    }
}

/// Split a path into flattened polyline contours.
pub fn contours_from_bezpath(path: &BezPath) -> Vec<Contour> {
    let mut contours = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let flush = |pts: &mut Vec<Point>, closed: bool, out: &mut Vec<Contour>| {
        if pts.len() > 1 {
            out.push(Contour::new(std::mem::take(pts), closed));
        } else {
            pts.clear();
        }
    };

    kurbo::flatten(path.iter(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            flush(&mut current, false, &mut contours);
            current.push(p);
        }
        PathEl::LineTo(p) => current.push(p),
        PathEl::ClosePath => flush(&mut current, true, &mut contours),
        // `flatten` only emits lines.
        PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => current.push(p),
    });
    flush(&mut current, false, &mut contours);
    contours
}

#[cfg(test)]
#[path = "../../tests/unit/assets/svg.rs"]
mod tests;
