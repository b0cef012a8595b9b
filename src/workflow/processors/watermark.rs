//! Watermark scaling, opacity and alpha-over compositing.

use crate::common::errors::TransformError;
use crate::models::{Anchor, LogoChoice, Opacity};
use image::{RgbaImage, imageops::FilterType};
use std::path::PathBuf;

/// One watermark to stamp onto a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub path: PathBuf,
    pub identity: LogoChoice,
    pub anchor: Anchor,
    pub opacity: Opacity,
}

// ────────────────────────────────────────────────────────────────
// Public API
// ────────────────────────────────────────────────────────────────

/// Stamp every watermark in order. The first failure aborts the whole image.
pub fn apply_watermarks(
    canvas: &mut RgbaImage,
    watermarks: &[Watermark],
) -> Result<(), TransformError> {
    for watermark in watermarks {
        if !watermark.path.exists() {
            return Err(TransformError::LogoMissing(watermark.path.display().to_string()));
        }
    }

    for watermark in watermarks {
        let logo = image::open(&watermark.path)
            .map_err(|err| {
                let path = watermark.path.display();
                TransformError::Compose(format!("cannot decode {path}: {err}"))
            })?
            .to_rgba8();
        stamp(canvas, &logo, watermark)?;
    }
    Ok(())
}

/// Scale, fade and composite an already-decoded logo.
pub fn stamp(
    canvas: &mut RgbaImage,
    logo: &RgbaImage,
    watermark: &Watermark,
) -> Result<(), TransformError> {
    let fraction = watermark.identity.area_fraction();
    let target = scaled_size(canvas.dimensions(), logo.dimensions(), fraction)
        .ok_or_else(|| {
            TransformError::Compose(format!(
                "logo {} has no area to scale",
                watermark.path.display()
            ))
        })?;

    let mut logo = image::imageops::resize(logo, target.0, target.1, FilterType::Lanczos3);
    apply_opacity(&mut logo, watermark.opacity);

    let (x, y) = watermark.anchor.offset(canvas.dimensions(), logo.dimensions());
    debug!(
        "Pasting {} ({}x{}) at ({}, {})",
        watermark.identity.token(),
        target.0,
        target.1,
        x,
        y
    );
    alpha_over(canvas, &logo, x, y);
    Ok(())
}

/// Logo size covering `fraction` of the canvas area, aspect preserved.
pub fn scaled_size(canvas: (u32, u32), logo: (u32, u32), fraction: f64) -> Option<(u32, u32)> {
    let logo_area = f64::from(logo.0) * f64::from(logo.1);
    if logo_area == 0.0 {
        return None;
    }
    let target_area = f64::from(canvas.0) * f64::from(canvas.1) * fraction;
    let scale = (target_area / logo_area).sqrt();
    let width = (f64::from(logo.0) * scale).round() as u32;
    let height = (f64::from(logo.1) * scale).round() as u32;
    Some((width.max(1), height.max(1)))
}

/// Multiply the alpha channel by `opacity`; fully opaque leaves it untouched.
pub fn apply_opacity(logo: &mut RgbaImage, opacity: Opacity) {
    if opacity.is_opaque() {
        return;
    }
    let factor = opacity.value();
    for pixel in logo.pixels_mut() {
        pixel[3] = (f32::from(pixel[3]) * factor).round() as u8;
    }
}

/// Straight alpha-over using the logo's alpha as the blend mask on all four
/// channels. Parts of the logo outside the canvas are clipped.
pub fn alpha_over(canvas: &mut RgbaImage, logo: &RgbaImage, x: i64, y: i64) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));

    for (lx, ly, src) in logo.enumerate_pixels() {
        let (cx, cy) = (x + i64::from(lx), y + i64::from(ly));
        if cx < 0 || cy < 0 || cx >= cw || cy >= ch {
            continue;
        }
        let mask = u32::from(src[3]);
        if mask == 0 {
            continue;
        }
        let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
        for channel in 0..4 {
            let blended = u32::from(src[channel]) * mask + u32::from(dst[channel]) * (255 - mask);
            dst[channel] = ((blended + 127) / 255) as u8;
        }
    }
}
