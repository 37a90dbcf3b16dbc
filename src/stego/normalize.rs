//! PNG normalization
//!
//! Every cover image is re-encoded as PNG before embedding, since lossy formats
//! would destroy the low bits the codec writes into.

use crate::core::error::{LedgerError, Result};
use crate::encoding::transcoder::sniff_mime;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use log::debug;

fn encoder(buf: &mut Vec<u8>) -> PngEncoder<&mut Vec<u8>> {
    PngEncoder::new_with_quality(buf, CompressionType::Best, FilterType::Adaptive)
}

/// Decode any supported raster format and re-encode it as PNG
pub fn normalize_to_png(bytes: &[u8]) -> Result<Vec<u8>> {
    let source_mime = sniff_mime(bytes).ok_or_else(|| {
        LedgerError::UnsupportedType("unrecognised image data".to_string())
    })?;

    let img = image::load_from_memory(bytes)?;
    let mut out = Vec::new();
    img.write_with_encoder(encoder(&mut out))?;

    debug!(
        "Normalized {} ({}x{}) to PNG: {} -> {} bytes",
        source_mime,
        img.width(),
        img.height(),
        bytes.len(),
        out.len()
    );
    Ok(out)
}

/// Encode an RGBA buffer as PNG
pub fn encode_rgba_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encoder(&mut out).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn bmp_bytes() -> Vec<u8> {
        let img = RgbImage::from_fn(8, 4, |x, y| Rgb([x as u8 * 30, y as u8 * 60, 7]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Bmp)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_normalize_bmp_to_png() {
        let png = normalize_to_png(&bmp_bytes()).unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);

        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded.get_pixel(2, 1), &Rgb([60, 60, 7]));
    }

    #[test]
    fn test_normalize_rejects_non_image() {
        assert!(matches!(
            normalize_to_png(b"definitely not an image"),
            Err(LedgerError::UnsupportedType(_))
        ));
    }
}
