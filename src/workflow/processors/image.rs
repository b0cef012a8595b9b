//! Image transform engine - turns one uploaded image into one stamped JPEG
//!
//! Includes:
//! - Decoding (HEIF container path and generic path)
//! - Crop policy and bounded resize
//! - Watermark compositing
//! - JPEG encoding

use crate::{
    common::{HEIF_BRANDS, JPEG_QUALITY, errors::TransformError},
    models::CropPolicy,
    utils::PathExt,
    workflow::processors::{
        geometry::plan_crop,
        watermark::{Watermark, apply_watermarks},
    },
};
use anyhow::{Context, Result, anyhow};
use image::{
    DynamicImage, RgbaImage,
    imageops::{self, FilterType},
};
use jpeg_encoder::{ColorType, Encoder};
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::Path,
};

/// A finished JPEG document.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub message: String,
}

// ────────────────────────────────────────────────────────────────
// Public API
// ────────────────────────────────────────────────────────────────

/// Transform the image stored at `input`. The file name is used as a
/// container hint next to content sniffing.
pub fn transform_file(
    input: &Path,
    crop: CropPolicy,
    watermarks: &[Watermark],
) -> Result<Rendered, TransformError> {
    if !input.is_file() {
        return Err(TransformError::InputMissing(input.display().to_string()));
    }
    let bytes = std::fs::read(input)
        .map_err(|err| {
            TransformError::Decode(format!("failed to read {}: {err}", input.display()))
        })?;
    guarded(|| render(&bytes, Some(input), crop, watermarks))
}

/// Transform in-memory image bytes. Never panics; every failure is typed.
pub fn transform(
    bytes: &[u8],
    crop: CropPolicy,
    watermarks: &[Watermark],
) -> Result<Rendered, TransformError> {
    guarded(|| render(bytes, None, crop, watermarks))
}

/// Whether the bytes (or the file name) denote a HEIF/HEIC container.
pub fn is_heif(bytes: &[u8], hint: Option<&Path>) -> bool {
    let branded = bytes.len() >= 12
        && &bytes[4..8] == b"ftyp"
        && HEIF_BRANDS.iter().any(|brand| &bytes[8..12] == brand.as_slice());
    branded || hint.is_some_and(|path| matches!(path.ext_lower().as_str(), "heic" | "heif"))
}

// ────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────

fn guarded(
    run: impl FnOnce() -> Result<Rendered, TransformError>,
) -> Result<Rendered, TransformError> {
    catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|panic| {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "transform panicked".to_string());
        Err(TransformError::Unknown(message))
    })
}

fn render(
    bytes: &[u8],
    hint: Option<&Path>,
    crop: CropPolicy,
    watermarks: &[Watermark],
) -> Result<Rendered, TransformError> {
    let mut canvas = decode_rgba(bytes, hint)
        .map_err(|err| TransformError::Decode(format!("{err:#}")))?;

    let plan = plan_crop(crop, canvas.width(), canvas.height());
    let region = plan.region;
    if (region.width, region.height) != canvas.dimensions() {
        canvas = imageops::crop_imm(&canvas, region.x, region.y, region.width, region.height)
            .to_image();
    }
    if plan.needs_resize() {
        canvas = imageops::resize(&canvas, plan.target.0, plan.target.1, FilterType::Lanczos3);
    }
    debug!(
        "Canvas {}x{} after {} crop",
        canvas.width(),
        canvas.height(),
        crop.token()
    );

    apply_watermarks(&mut canvas, watermarks)?;

    let (width, height) = canvas.dimensions();
    let bytes = encode_jpeg(canvas)
        .map_err(|err| TransformError::Unknown(format!("{err:#}")))?;

    let message = if watermarks.is_empty() {
        "Image processed successfully without logo."
    } else {
        "Image processed successfully."
    };
    Ok(Rendered {
        bytes,
        width,
        height,
        message: message.to_string(),
    })
}

// ────────────────────────────────────────────────────────────────
// Decoding
// ────────────────────────────────────────────────────────────────

/// Decode into a 4-channel raster, trying the container-specific path first.
pub fn decode_rgba(bytes: &[u8], hint: Option<&Path>) -> Result<RgbaImage> {
    let decoders: Vec<fn(&[u8]) -> Result<DynamicImage>> = if is_heif(bytes, hint) {
        vec![heif_decoder]
    } else {
        vec![image_crate_decoder]
    };

    let mut last_error = None;
    for decoder in decoders {
        match decoder(bytes) {
            Ok(decoded_image) => return Ok(decoded_image.to_rgba8()),
            Err(err) => last_error = Some(err),
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow!("no decoder accepted the input")))
}

fn image_crate_decoder(file_in_memory: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(file_in_memory)
        .context("image crate failed to decode image from memory")
}

#[cfg(feature = "heic")]
fn heif_decoder(file_in_memory: &[u8]) -> Result<DynamicImage> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let context =
        HeifContext::read_from_bytes(file_in_memory).context("libheif failed to read container")?;
    let handle = context
        .primary_image_handle()
        .context("HEIF container has no primary image")?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgba), None)
        .context("libheif failed to decode primary image")?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| anyhow!("decoded HEIF image has no interleaved plane"))?;
    let (width, height) = (plane.width, plane.height);
    let row_bytes = width as usize * 4;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }
    let raster = RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| anyhow!("HEIF plane is smaller than {width}x{height}"))?;
    Ok(DynamicImage::ImageRgba8(raster))
}

#[cfg(not(feature = "heic"))]
fn heif_decoder(_file_in_memory: &[u8]) -> Result<DynamicImage> {
    Err(anyhow!(
        "HEIF/HEIC input needs a build with the `heic` feature enabled"
    ))
}

// ────────────────────────────────────────────────────────────────
// Encoding
// ────────────────────────────────────────────────────────────────

/// Drop alpha and encode as a quality-98 JPEG with Huffman tables built
/// for this image.
fn encode_jpeg(canvas: RgbaImage) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let width = u16::try_from(rgb.width()).context("image too wide for JPEG")?;
    let height = u16::try_from(rgb.height()).context("image too tall for JPEG")?;

    let mut bytes = Vec::new();
    let mut encoder = Encoder::new(&mut bytes, JPEG_QUALITY);
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(rgb.as_raw(), width, height, ColorType::Rgb)
        .context("failed to encode JPEG")?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Anchor, LogoChoice, Opacity};
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png(width: u32, height: u32, pixel: Rgba<u8>) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, pixel))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn keep_without_watermarks_round_trips_dimensions() {
        let source = png(1300, 1250, Rgba([40, 90, 160, 255]));
        let rendered = transform(&source, CropPolicy::Keep, &[]).unwrap();
        assert_eq!((rendered.width, rendered.height), (1300, 1250));
        assert_eq!(rendered.message, "Image processed successfully without logo.");

        let decoded = image::load_from_memory(&rendered.bytes).unwrap();
        assert_eq!(image::guess_format(&rendered.bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!((decoded.width(), decoded.height()), (1300, 1250));
    }

    /// `(class/id, symbol count)` of every Huffman table before the first scan.
    fn huffman_tables(jpeg: &[u8]) -> Vec<(u8, usize)> {
        let mut tables = Vec::new();
        let mut at = 2;
        while at + 4 <= jpeg.len() && jpeg[at] == 0xFF && jpeg[at + 1] != 0xDA {
            let length = u16::from_be_bytes([jpeg[at + 2], jpeg[at + 3]]) as usize;
            if jpeg[at + 1] == 0xC4 {
                let segment = &jpeg[at + 4..at + 2 + length];
                let mut table = 0;
                while table + 17 <= segment.len() {
                    let counts = &segment[table + 1..table + 17];
                    let symbols: usize = counts.iter().map(|&n| n as usize).sum();
                    tables.push((segment[table], symbols));
                    table += 17 + symbols;
                }
            }
            at += 2 + length;
        }
        tables
    }

    #[test]
    fn huffman_tables_are_fitted_to_the_image() {
        let flat = png(1200, 1200, Rgba([120, 120, 120, 255]));
        let rendered = transform(&flat, CropPolicy::Keep, &[]).unwrap();
        let tables = huffman_tables(&rendered.bytes);
        let ac: Vec<usize> = tables
            .iter()
            .filter(|(class, _)| class >> 4 == 1)
            .map(|&(_, symbols)| symbols)
            .collect();
        assert!(!ac.is_empty(), "no AC tables in {tables:?}");
        assert!(ac.iter().all(|&symbols| symbols < 162), "stock AC tables in {tables:?}");
    }

    #[test]
    fn square_policy_raises_small_crop() {
        let small = png(800, 400, Rgba([0, 0, 0, 255]));
        let rendered = transform(&small, CropPolicy::Square, &[]).unwrap();
        assert_eq!((rendered.width, rendered.height), (1200, 1200));
    }

    #[test]
    fn transparent_source_is_flattened() {
        let clear = png(1200, 1200, Rgba([0, 0, 0, 0]));
        let rendered = transform(&clear, CropPolicy::Keep, &[]).unwrap();
        let decoded = image::load_from_memory(&rendered.bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = transform(b"definitely not an image", CropPolicy::Keep, &[]).unwrap_err();
        assert!(matches!(err, TransformError::Decode(_)));
    }

    #[test]
    fn missing_input_file() {
        let err = transform_file(Path::new("/nope/input.jpg"), CropPolicy::Keep, &[]).unwrap_err();
        assert!(matches!(err, TransformError::InputMissing(_)));
    }

    #[test]
    fn missing_logo_aborts_transform() {
        let watermark = Watermark {
            path: "/nope/AI.png".into(),
            identity: LogoChoice::Ai,
            anchor: Anchor::TopLeft,
            opacity: Opacity::OPAQUE,
        };
        let source = png(1200, 1200, Rgba([9, 9, 9, 255]));
        let err = transform(&source, CropPolicy::Keep, &[watermark]).unwrap_err();
        assert!(matches!(err, TransformError::LogoMissing(_)));
    }

    #[test]
    fn heif_is_sniffed_from_brand_or_name() {
        let mut header = vec![0, 0, 0, 24];
        header.extend_from_slice(b"ftypheic");
        header.extend_from_slice(&[0; 12]);
        assert!(is_heif(&header, None));
        assert!(is_heif(b"", Some(Path::new("IMG_0001.HEIC"))));
        assert!(!is_heif(&png(2, 2, Rgba([0, 0, 0, 255])), Some(Path::new("a.png"))));
    }

    #[cfg(not(feature = "heic"))]
    #[test]
    fn heif_without_feature_is_a_decode_error() {
        let mut header = vec![0, 0, 0, 24];
        header.extend_from_slice(b"ftypmif1");
        header.extend_from_slice(&[0; 12]);
        let err = transform(&header, CropPolicy::Keep, &[]).unwrap_err();
        assert!(matches!(err, TransformError::Decode(msg) if msg.contains("heic")));
    }
}
