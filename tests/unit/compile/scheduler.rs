use std::io::Cursor;
use std::path::Path;

use super::*;
use crate::layer::resolve_layer;
use crate::layer::model::{ClipMask, LayerDef};
use serde_json::json;

const HD: Canvas = Canvas {
    width: 1280,
    height: 720,
};

const SQUARE_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">
    <rect x="0" y="0" width="10" height="10" fill="#ffffff"/>
</svg>"##;

fn write(root: &Path, rel: &str, bytes: &[u8]) {
    let p = root.join(rel);
    std::fs::create_dir_all(p.parent().unwrap()).unwrap();
    std::fs::write(p, bytes).unwrap();
}

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([0, 255, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn layer(root: &Path, v: serde_json::Value) -> Arc<ResolvedLayer> {
    let def: LayerDef = serde_json::from_value(v).unwrap();
    Arc::new(resolve_layer(def, Path::new("animations/main.json"), root).unwrap())
}

fn compile(
    layers: &[Arc<ResolvedLayer>],
    t: f64,
    assets: &AssetCache,
    font: Option<&FontRef>,
) -> LayerplayResult<RenderPlan> {
    FrameCompiler::new().compile(&FrameInputs {
        layers,
        time: t,
        canvas: HD,
        assets,
        font,
    })
}

fn names(plan: &RenderPlan) -> Vec<&'static str> {
    plan.passes.iter().map(Pass::name).collect()
}

fn scene_ops(plan: &RenderPlan, target: SurfaceId) -> Vec<&DrawOp> {
    plan.passes
        .iter()
        .filter_map(|p| match p {
            Pass::Scene(s) if s.target == target => Some(&s.ops),
            _ => None,
        })
        .flatten()
        .collect()
}

#[test]
fn active_objects_are_z_sorted_and_grouped_by_target() {
    let dir = tempfile::tempdir().unwrap();
    let l = layer(
        dir.path(),
        json!({
            "prototypes": { "live": { "keyframer": [{ "time": 0 }, { "time": 10 }] } },
            "objects": [
                { "prototype": "live", "z-index": 5 },
                { "prototype": "live", "z-index": 1, "target": "clip-b" },
                { "prototype": "live", "z-index": -2 },
                { "prototype": "live", "z-index": 5, "target": "clip-a" },
                { "prototype": "live", "time": 20 },
                { "prototype": "live", "z-index": 5 }
            ]
        }),
    );
    let g = group_active_objects(&l, 3.0);
    let idx = |v: &[&ResolvedObject]| v.iter().map(|o| o.index).collect::<Vec<_>>();
    assert_eq!(idx(&g.image), vec![2, 0, 5]);
    assert_eq!(idx(&g.clip_a), vec![3]);
    assert_eq!(idx(&g.clip_b), vec![1]);
    let order: Vec<RenderTarget> = g.in_order().map(|(t, _)| t).collect();
    assert_eq!(order, RenderTarget::ORDER.to_vec());
}

#[test]
fn activity_window_is_half_open() {
    let dir = tempfile::tempdir().unwrap();
    let l = layer(
        dir.path(),
        json!({ "objects": [{ "time": 2, "keyframer": [{ "time": 0 }, { "time": 3 }] }] }),
    );
    assert!(group_active_objects(&l, 1.99).image.is_empty());
    assert_eq!(group_active_objects(&l, 2.0).image.len(), 1);
    assert!(group_active_objects(&l, 5.0).image.is_empty());
}

#[test]
fn disabled_layers_are_skipped_and_ties_keep_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = layer(dir.path(), json!({ "z-index": 1 }));
    let b = layer(dir.path(), json!({ "z-index": 0, "enabled": false }));
    let c = layer(dir.path(), json!({ "z-index": -1 }));
    let d = layer(dir.path(), json!({ "z-index": 1 }));
    let layers = vec![a.clone(), b, c.clone(), d.clone()];
    let ordered = ordered_layers(&layers);
    assert_eq!(ordered.len(), 3);
    assert!(std::ptr::eq(ordered[0], c.as_ref()));
    assert!(std::ptr::eq(ordered[1], a.as_ref()));
    assert!(std::ptr::eq(ordered[2], d.as_ref()));
}

#[test]
fn empty_snapshot_still_clears_and_presents() {
    let dir = tempfile::tempdir().unwrap();
    let assets = AssetCache::new(dir.path());
    let plan = compile(&[], 0.0, &assets, None).unwrap();
    assert_eq!(names(&plan), vec!["clear", "present"]);
    assert_eq!(plan.surfaces.len(), SurfaceId::COUNT);
    let Pass::Present(p) = &plan.passes[1] else {
        panic!("expected present");
    };
    assert_eq!(p.background, Rgba::BLACK);
    assert_eq!(plan.final_surface, SurfaceId::FINAL);
}

#[test]
fn pass_sequence_follows_target_order_and_blend_mode() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.svg", SQUARE_SVG);
    let assets = AssetCache::new(dir.path());
    let l = layer(
        dir.path(),
        json!({
            "blend": { "mode": "multiply" },
            "prototypes": { "live": { "assets": ["a.svg"], "keyframer": [{ "time": 0 }, { "time": 10 }] } },
            "objects": [
                { "prototype": "live" },
                { "prototype": "live", "target": "clip-a" }
            ]
        }),
    );
    let plan = compile(&[l], 1.0, &assets, None).unwrap();
    assert_eq!(
        names(&plan),
        vec!["clear", "scene", "mask_resolve", "clear", "scene", "blend", "present"]
    );
    let Pass::Clear(first) = &plan.passes[0] else {
        panic!("expected clear");
    };
    assert!(first.targets.contains(&SurfaceId::MASK_A));
    assert!(!first.targets.contains(&SurfaceId::BLEND_AUX));
    let Pass::Blend(b) = &plan.passes[5] else {
        panic!("expected blend");
    };
    assert_eq!((b.src, b.dst, b.mode), (SurfaceId::BLEND_AUX, SurfaceId::ACCUM, BlendMode::Multiply));
    assert_eq!(scene_ops(&plan, SurfaceId::CLIP_A).len(), 1);
}

#[test]
fn svg_shapes_emit_fill_and_sub_ranged_stroke() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.svg", SQUARE_SVG);
    let assets = AssetCache::new(dir.path());
    let l = layer(
        dir.path(),
        json!({
            "objects": [{
                "assets": ["a.svg"],
                "attributes": { "fill": "asset" },
                "keyframer": [{ "time": 0, "c1": 0.5, "stroke-weight": 2 }, { "time": 10 }]
            }]
        }),
    );
    let plan = compile(&[l], 0.0, &assets, None).unwrap();
    let ops = scene_ops(&plan, SurfaceId::ACCUM);
    assert_eq!(ops.len(), 2);
    let DrawOp::Fill { color, contours, .. } = ops[0] else {
        panic!("expected fill");
    };
    assert_eq!(*color, Rgba::WHITE);
    assert!((contours[0].length() - 40.0).abs() < 1e-6);
    let DrawOp::Stroke { contours, weight, .. } = ops[1] else {
        panic!("expected stroke");
    };
    assert_eq!(*weight, 2.0);
    assert!((contours[0].length() - 20.0).abs() < 1e-6);
}

#[test]
fn transparent_fill_is_not_drawn() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.svg", SQUARE_SVG);
    let assets = AssetCache::new(dir.path());
    let l = layer(
        dir.path(),
        json!({ "objects": [{ "assets": ["a.svg"], "keyframer": [{ "time": 0 }, { "time": 10 }] }] }),
    );
    let plan = compile(&[l], 0.0, &assets, None).unwrap();
    let ops = scene_ops(&plan, SurfaceId::ACCUM);
    assert_eq!(ops.len(), 1);
    assert!(matches!(ops[0], DrawOp::Stroke { .. }));
}

#[test]
fn svg_3d_strokes_gain_under_perspective() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.svg", SQUARE_SVG);
    let assets = AssetCache::new(dir.path());
    let l = layer(
        dir.path(),
        json!({
            "camera": { "type": "perspective" },
            "objects": [{ "type": "svg-3d", "assets": ["a.svg"], "keyframer": [{ "time": 0 }, { "time": 10 }] }]
        }),
    );
    let plan = compile(&[l], 0.0, &assets, None).unwrap();
    let weight = scene_ops(&plan, SurfaceId::ACCUM)
        .into_iter()
        .find_map(|op| match op {
            DrawOp::Stroke { weight, .. } => Some(*weight),
            _ => None,
        })
        .unwrap();
    assert_eq!(weight, PERSPECTIVE_STROKE_GAIN);
}

#[test]
fn image_asset_is_picked_by_rounded_index_and_centered() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "img/a.png", &png(4, 2));
    write(dir.path(), "img/b.png", &png(6, 6));
    let assets = AssetCache::new(dir.path());
    let l = layer(
        dir.path(),
        json!({
            "objects": [{
                "type": "image",
                "assets": ["img/a.png", "img/b.png"],
                "clipping": { "mask": "a" },
                "keyframer": [
                    { "time": 0, "asset-index": 0.6, "image-right": 0.5, "object-clip-blend": 0.5, "clip-blend": 0.5 },
                    { "time": 10 }
                ]
            }]
        }),
    );
    let plan = compile(&[l], 0.0, &assets, None).unwrap();
    let ops = scene_ops(&plan, SurfaceId::ACCUM);
    let DrawOp::Image { image, source, dest, clip, tint, .. } = ops[0] else {
        panic!("expected image");
    };
    assert_eq!((image.width, image.height), (6, 6));
    assert_eq!(*source, Rect::new(0.0, 0.0, 3.0, 6.0));
    assert_eq!(*dest, Rect::new(-3.0, -3.0, 0.0, 3.0));
    assert_eq!(*tint, Rgba::WHITE);
    assert_eq!(clip.mask, ClipMask::A);
    assert_eq!(clip.blend, 0.25);
}

#[test]
fn missing_asset_reports_layer_and_object() {
    let dir = tempfile::tempdir().unwrap();
    let assets = AssetCache::new(dir.path());
    let l = layer(
        dir.path(),
        json!({ "objects": [{ "assets": ["nope.svg"], "keyframer": [{ "time": 0 }, { "time": 10 }] }] }),
    );
    let err = compile(&[l], 0.0, &assets, None).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, LayerplayError::Asset { .. }), "{msg}");
    assert!(msg.contains("nope.svg"), "{msg}");
    assert!(msg.contains("main.json"), "{msg}");
    assert!(msg.contains("objects[0]"), "{msg}");
}

#[test]
fn text_curtain_needs_a_font() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "c.txt", b"3 2\nabc\nde\n1, 2, 3\n4,5,0\n");
    let assets = AssetCache::new(dir.path());
    let l = layer(
        dir.path(),
        json!({
            "objects": [{
                "type": "text-curtain",
                "assets": ["c.txt"],
                "keyframer": [{ "time": 0, "fill-a": 1, "curtain-end": 0.4 }, { "time": 10 }]
            }]
        }),
    );

    let plan = compile(std::slice::from_ref(&l), 0.0, &assets, None).unwrap();
    assert!(scene_ops(&plan, SurfaceId::ACCUM).is_empty());

    let font = FontRef {
        key: "fonts/demo.ttf".to_string(),
        bytes: Arc::new(vec![0u8; 4]),
    };
    let plan = compile(&[l], 0.0, &assets, Some(&font)).unwrap();
    let ops = scene_ops(&plan, SurfaceId::ACCUM);
    let DrawOp::Text { lines, origin, line_height_px, size_px, .. } = ops[0] else {
        panic!("expected text");
    };
    assert_eq!(lines, &vec!["a  ".to_string(), "   ".to_string()]);
    assert!(origin.x.abs() < 1e-6 && origin.y.abs() < 1e-6, "{origin:?}");
    assert!((line_height_px - CURTAIN_LINE_HEIGHT).abs() < 1e-6);
    assert!((f64::from(*size_px) - CURTAIN_FONT_SIZE).abs() < 1e-4);
}

#[test]
fn reset_drops_cached_shape_orders() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.svg", SQUARE_SVG);
    let assets = AssetCache::new(dir.path());
    let l = layer(
        dir.path(),
        json!({
            "objects": [{
                "assets": ["a.svg"],
                "staggers": [{ "mode": "in", "order": "random" }],
                "keyframer": [{ "time": 0 }, { "time": 10 }]
            }]
        }),
    );
    let mut compiler = FrameCompiler::new();
    let inputs = FrameInputs {
        layers: std::slice::from_ref(&l),
        time: 1.0,
        canvas: HD,
        assets: &assets,
        font: None,
    };
    compiler.compile(&inputs).unwrap();
    assert!(!compiler.orders.is_empty());
    compiler.reset();
    assert!(compiler.orders.is_empty());
}

const PAIR_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">
    <rect x="0" y="0" width="8" height="8" fill="#ffffff"/>
    <rect x="10" y="10" width="8" height="8" fill="#ffffff"/>
</svg>"##;

const RED_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">
    <rect x="0" y="0" width="10" height="10" fill="#ff0000"/>
</svg>"##;

/// White fill fading in from transparent over ten seconds.
fn fade_in() -> serde_json::Value {
    json!([
        { "time": 0, "fill-r": 1, "fill-g": 1, "fill-b": 1, "fill-a": 0 },
        { "time": 10, "fill-a": 1 }
    ])
}

fn fill_colors(plan: &RenderPlan) -> Vec<Rgba> {
    scene_ops(plan, SurfaceId::ACCUM)
        .into_iter()
        .filter_map(|op| match op {
            DrawOp::Fill { color, .. } => Some(*color),
            _ => None,
        })
        .collect()
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} != {b}");
}

#[test]
fn in_out_stagger_gives_each_shape_its_own_time() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pair.svg", PAIR_SVG);
    let assets = AssetCache::new(dir.path());
    let l = layer(
        dir.path(),
        json!({
            "objects": [{
                "assets": ["pair.svg"],
                "staggers": [{ "mode": "in-out" }],
                "keyframer": fade_in()
            }]
        }),
    );

    // Slot 0 owns the first half of the segment, slot 1 the second half.
    let fills = fill_colors(&compile(std::slice::from_ref(&l), 2.5, &assets, None).unwrap());
    assert_eq!(fills.len(), 1);
    assert_close(fills[0].a, 0.5);

    let fills = fill_colors(&compile(&[l], 7.5, &assets, None).unwrap());
    let alphas: Vec<f64> = fills.iter().map(|c| c.a).collect();
    assert_eq!(alphas.len(), 2);
    assert_close(alphas[0], 1.0);
    assert_close(alphas[1], 0.5);
}

#[test]
fn discrete_stepping_holds_the_bucket_start() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.svg", SQUARE_SVG);
    let assets = AssetCache::new(dir.path());
    let stepped = layer(
        dir.path(),
        json!({
            "objects": [{
                "assets": ["a.svg"],
                "stepping": { "mode": "discrete", "steps": 2, "inertia": 0 },
                "keyframer": fade_in()
            }]
        }),
    );
    for t in [5.0, 7.0, 9.9] {
        let fills = fill_colors(&compile(std::slice::from_ref(&stepped), t, &assets, None).unwrap());
        assert_close(fills[0].a, 0.5);
    }

    let smooth = layer(
        dir.path(),
        json!({
            "objects": [{
                "assets": ["a.svg"],
                "stepping": { "mode": "discrete", "steps": 2, "inertia": 1 },
                "keyframer": fade_in()
            }]
        }),
    );
    let fills = fill_colors(&compile(&[smooth], 7.0, &assets, None).unwrap());
    assert_close(fills[0].a, 0.7);
}

#[test]
fn fill_source_picks_asset_or_modulated_color() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "red.svg", RED_SVG);
    let assets = AssetCache::new(dir.path());
    let object = |source: &str| {
        json!({
            "assets": ["red.svg"],
            "attributes": { "fill": source },
            "keyframer": [
                { "time": 0, "fill-r": 0.5, "fill-g": 0.5, "fill-b": 0.5, "fill-a": 0.5 },
                { "time": 10 }
            ]
        })
    };
    let l = layer(
        dir.path(),
        json!({ "objects": [object("asset"), object("modulate"), object("user")] }),
    );

    let fills = fill_colors(&compile(&[l], 1.0, &assets, None).unwrap());
    assert_eq!(
        fills,
        vec![
            Rgba::new(1.0, 0.0, 0.0, 1.0),
            Rgba::new(0.5, 0.0, 0.0, 0.5),
            Rgba::new(0.5, 0.5, 0.5, 0.5),
        ]
    );
}
