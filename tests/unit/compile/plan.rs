use super::*;

#[test]
fn unclipped_ops_ignore_the_mask() {
    assert_eq!(ClipApply::NONE.factor(0.0), 1.0);
    assert_eq!(ClipApply::NONE.slot(), None);
}

#[test]
fn clip_factor_cross_fades_with_blend() {
    let full = ClipApply {
        mask: ClipMask::A,
        blend: 1.0,
    };
    assert_eq!(full.factor(0.25), 0.25);
    assert_eq!(full.slot(), Some(0));

    let half = ClipApply {
        mask: ClipMask::B,
        blend: 0.5,
    };
    assert_eq!(half.factor(0.0), 0.5);
    assert_eq!(half.slot(), Some(1));

    let off = ClipApply {
        mask: ClipMask::A,
        blend: 0.0,
    };
    assert_eq!(off.factor(0.0), 1.0);
}

#[test]
fn inverted_masks_flip_the_sample() {
    let inv = ClipApply {
        mask: ClipMask::InvertB,
        blend: 1.0,
    };
    assert_eq!(inv.factor(1.0), 0.0);
    assert_eq!(inv.factor(0.0), 1.0);
    assert_eq!(inv.slot(), Some(1));
}

#[test]
fn only_colour_surfaces_are_drawable() {
    for id in [SurfaceId::ACCUM, SurfaceId::BLEND_AUX, SurfaceId::CLIP_A, SurfaceId::CLIP_B] {
        assert!(id.is_drawable(), "{id:?}");
    }
    for id in [SurfaceId::MASK_A, SurfaceId::MASK_B, SurfaceId::FINAL] {
        assert!(!id.is_drawable(), "{id:?}");
    }
    assert_eq!(SurfaceId::FINAL.index() + 1, SurfaceId::COUNT);
}

#[test]
fn pass_names_are_stable() {
    let blend = Pass::Blend(BlendPass {
        src: SurfaceId::BLEND_AUX,
        dst: SurfaceId::ACCUM,
        mode: BlendMode::Multiply,
    });
    assert_eq!(blend.name(), "blend");
    let resolve = Pass::MaskResolve(MaskResolvePass {
        input: SurfaceId::CLIP_A,
        output: SurfaceId::MASK_A,
    });
    assert_eq!(resolve.name(), "mask_resolve");
}
