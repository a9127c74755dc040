use std::sync::{Arc, OnceLock};

use anyhow::Context;

use crate::foundation::error::LayerplayResult;
use crate::foundation::math::mul_div255_u8;

/// 4x4 Bayer threshold matrix, values in `0..16`.
const BAYER4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Raster image in premultiplied RGBA8 form.
#[derive(Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
    dithered: OnceLock<Arc<DecodedImage>>,
}

impl DecodedImage {
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
            dithered: OnceLock::new(),
        }
    }

    /// One-level ordered dither of this image, computed on first use.
    pub fn dithered(&self) -> Arc<DecodedImage> {
        self.dithered
            .get_or_init(|| {
                Arc::new(DecodedImage::from_premul(
                    self.width,
                    self.height,
                    ordered_dither_1bit(&self.rgba8_premul, self.width),
                ))
            })
            .clone()
    }
}

pub fn decode_image(bytes: &[u8]) -> LayerplayResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    Ok(DecodedImage::from_premul(width, height, rgba8_premul))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), a);
        }
    }
}

/// Quantize each color channel to 0 or full coverage with a 4x4 Bayer pattern.
///
/// Works on premultiplied data: channels are thresholded against alpha, so the result stays
/// premultiplied.
fn ordered_dither_1bit(src: &[u8], width: u32) -> Vec<u8> {
    let w = width.max(1) as usize;
    let mut out = src.to_vec();
    for (i, px) in out.chunks_exact_mut(4).enumerate() {
        let (x, y) = (i % w, i / w);
        let a = px[3];
        if a == 0 {
            continue;
        }
        let threshold = (f32::from(BAYER4[y % 4][x % 4]) + 0.5) / 16.0;
        for c in &mut px[..3] {
            let v = f32::from(*c) / f32::from(a);
            *c = if v > threshold { a } else { 0 };
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
