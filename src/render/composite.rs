//! Pixel kernels over premultiplied RGBA8 buffers.

use crate::compile::plan::ClipApply;
use crate::foundation::core::Rgba;
use crate::foundation::error::{LayerplayError, LayerplayResult};
use crate::foundation::math::mul_div255_u8;
use crate::layer::model::BlendMode;

fn check_pair(dst: &[u8], src: &[u8], what: &str) -> LayerplayResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(LayerplayError::evaluation(format!(
            "{what} expects equal-length rgba8 buffers"
        )));
    }
    Ok(())
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

/// Fill every pixel with `rgba`.
pub fn fill_rgba8(buf: &mut [u8], rgba: [u8; 4]) {
    for px in buf.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

/// Source-over of `src` onto `dst`.
pub fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> LayerplayResult<()> {
    check_pair(dst, src, "premul_over_in_place")?;
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        let inv = 255 - sa;
        d[3] = add_sat_u8(s[3], mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            d[c] = add_sat_u8(s[c], mul_div255_u8(u16::from(d[c]), inv));
        }
    }
    Ok(())
}

/// Source-over of `src` onto `dst`, with `src` scaled per pixel by the clip factor sampled from
/// the red channel of `mask`.
pub fn masked_over_in_place(
    dst: &mut [u8],
    src: &[u8],
    mask: &[u8],
    clip: ClipApply,
) -> LayerplayResult<()> {
    check_pair(dst, src, "masked_over_in_place")?;
    check_pair(dst, mask, "masked_over_in_place")?;
    for ((d, s), m) in dst
        .chunks_exact_mut(4)
        .zip(src.chunks_exact(4))
        .zip(mask.chunks_exact(4))
    {
        if s[3] == 0 {
            continue;
        }
        let f = clip.factor(f64::from(m[0]) / 255.0);
        let k = (f.clamp(0.0, 1.0) * 255.0).round() as u16;
        if k == 0 {
            continue;
        }
        let sa = mul_div255_u8(u16::from(s[3]), k);
        let inv = 255 - u16::from(sa);
        d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), k);
            d[c] = add_sat_u8(sc, mul_div255_u8(u16::from(d[c]), inv));
        }
    }
    Ok(())
}

/// Multiply every premultiplied pixel by the straight colour `tint`.
pub fn tint_in_place(buf: &mut [u8], tint: Rgba) {
    let q = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u16;
    let ta = q(tint.a);
    let tc = [
        u16::from(mul_div255_u8(q(tint.r), ta)),
        u16::from(mul_div255_u8(q(tint.g), ta)),
        u16::from(mul_div255_u8(q(tint.b), ta)),
    ];
    for px in buf.chunks_exact_mut(4) {
        for c in 0..3 {
            px[c] = mul_div255_u8(u16::from(px[c]), tc[c]);
        }
        px[3] = mul_div255_u8(u16::from(px[3]), ta);
    }
}

/// Copy the alpha of `clip` into the colour channels of an opaque `mask`.
pub fn resolve_mask(mask: &mut [u8], clip: &[u8]) -> LayerplayResult<()> {
    check_pair(mask, clip, "resolve_mask")?;
    for (m, c) in mask.chunks_exact_mut(4).zip(clip.chunks_exact(4)) {
        m.copy_from_slice(&[c[3], c[3], c[3], 255]);
    }
    Ok(())
}

/// Combine `src` into `dst` with `mode`.
pub fn blend_in_place(dst: &mut [u8], src: &[u8], mode: BlendMode) -> LayerplayResult<()> {
    match mode {
        BlendMode::Normal => premul_over_in_place(dst, src),
        BlendMode::Multiply => separable_blend_in_place(dst, src, |s, d| s * d),
    }
}

fn separable_blend_in_place<F>(dst: &mut [u8], src: &[u8], blend_fn: F) -> LayerplayResult<()>
where
    F: Fn(f32, f32) -> f32,
{
    check_pair(dst, src, "separable_blend_in_place")?;
    let unpremul = |p: f32, a: f32| if a > 0.0 { (p / a).clamp(0.0, 1.0) } else { 0.0 };

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        // out_a = sa + da * (1 - sa)
        // out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
        let sa = f32::from(s[3]) / 255.0;
        if sa <= 0.0 {
            continue;
        }
        let da = f32::from(d[3]) / 255.0;
        let out_a = (sa + da * (1.0 - sa)).clamp(0.0, 1.0);
        for c in 0..3 {
            let sp = f32::from(s[c]) / 255.0;
            let dp = f32::from(d[c]) / 255.0;
            let b = blend_fn(unpremul(sp, sa), unpremul(dp, da)).clamp(0.0, 1.0);
            let out = sp * (1.0 - da) + dp * (1.0 - sa) + b * sa * da;
            d[c] = (out.clamp(0.0, out_a) * 255.0).round() as u8;
        }
        d[3] = (out_a * 255.0).round() as u8;
    }
    Ok(())
}

/// Running per-channel sum of equally sized premultiplied frames.
#[derive(Clone, Debug)]
pub struct SampleAccumulator {
    sums: Vec<u32>,
    samples: u32,
}

impl SampleAccumulator {
    pub fn new(len: usize) -> Self {
        Self {
            sums: vec![0; len],
            samples: 0,
        }
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn add(&mut self, src: &[u8]) -> LayerplayResult<()> {
        if src.len() != self.sums.len() || !src.len().is_multiple_of(4) {
            return Err(LayerplayError::evaluation(
                "SampleAccumulator expects equal-length rgba8 buffers",
            ));
        }
        for (sum, &v) in self.sums.iter_mut().zip(src) {
            *sum += u32::from(v);
        }
        self.samples += 1;
        Ok(())
    }

    /// Write the rounded mean of every added frame into `dst`.
    pub fn average_into(&self, dst: &mut [u8]) -> LayerplayResult<()> {
        if dst.len() != self.sums.len() || self.samples == 0 {
            return Err(LayerplayError::evaluation(
                "SampleAccumulator has no samples for this buffer",
            ));
        }
        let n = self.samples;
        for (d, &sum) in dst.iter_mut().zip(&self.sums) {
            *d = ((sum + n / 2) / n).min(255) as u8;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
