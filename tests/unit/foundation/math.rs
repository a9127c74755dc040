use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
    assert_eq!(mul_div255_u8(255, 255), 255);
}

#[test]
fn map_clamped_clamps_outside_source_range() {
    assert_eq!(map_clamped(0.5, 0.0, 1.0, 10.0, 20.0), 15.0);
    assert_eq!(map_clamped(-1.0, 0.0, 1.0, 10.0, 20.0), 10.0);
    assert_eq!(map_clamped(3.0, 0.0, 1.0, 10.0, 20.0), 20.0);
}

#[test]
fn map_clamped_degenerate_source_is_a_step() {
    assert_eq!(map_clamped(0.4, 0.5, 0.5, 0.0, 1.0), 0.0);
    assert_eq!(map_clamped(0.5, 0.5, 0.5, 0.0, 1.0), 1.0);
}

#[test]
fn model_matrix_translates_after_scaling() {
    let m = model_matrix(DVec3::new(10.0, 0.0, 0.0), DVec3::ZERO, 2.0);
    let p = m.transform_point3(DVec3::new(1.0, 1.0, 0.0));
    assert!((p - DVec3::new(12.0, 2.0, 0.0)).length() < 1e-12);
}

#[test]
fn rotation_z_quarter_turn() {
    let m = rotation_zyx_deg(0.0, 0.0, 90.0);
    let p = m.transform_point3(DVec3::X);
    assert!((p - DVec3::Y).length() < 1e-12);
}

#[test]
fn projection_maps_ndc_corners_to_pixels() {
    let canvas = Canvas {
        width: 100,
        height: 50,
    };
    let id = DMat4::IDENTITY;
    let tl = project_to_pixels(&id, DVec3::new(-1.0, 1.0, 0.0), canvas).unwrap();
    let br = project_to_pixels(&id, DVec3::new(1.0, -1.0, 0.0), canvas).unwrap();
    assert_eq!((tl.x, tl.y), (0.0, 0.0));
    assert_eq!((br.x, br.y), (100.0, 50.0));
}
