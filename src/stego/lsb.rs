//! Least-significant-bit codec
//!
//! The frame is written most significant bit first into the low bit of the
//! red, green and blue channels of each pixel, row by row. Alpha is left
//! untouched. Carriers are always written as RGBA PNG.

use crate::core::error::{LedgerError, Result};
use crate::stego::frame::{self, HEADER_LEN};
use crate::stego::normalize::encode_rgba_png;
use crate::stego::StegoCodec;
use image::RgbaImage;
use log::{debug, trace};

/// LSB codec over the RGB channels of a PNG carrier
#[derive(Debug, Clone, Copy, Default)]
pub struct LsbCodec;

impl LsbCodec {
    pub fn new() -> Self {
        Self
    }

    /// Payload bytes an image of the given size can carry
    pub fn capacity(width: u32, height: u32) -> usize {
        let bits = width as usize * height as usize * 3;
        (bits / 8).saturating_sub(HEADER_LEN)
    }
}

/// Indices of the channel bytes that carry data
fn carrier_slots(raw_len: usize) -> impl Iterator<Item = usize> {
    (0..raw_len).filter(|i| i % 4 != 3)
}

fn read_bytes(raw: &[u8], slots: &mut impl Iterator<Item = usize>, count: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let mut byte = 0u8;
        for _ in 0..8 {
            let slot = slots.next()?;
            byte = (byte << 1) | (raw[slot] & 1);
        }
        out.push(byte);
    }
    Some(out)
}

impl StegoCodec for LsbCodec {
    fn embed(&self, cover: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
        let mut img: RgbaImage = image::load_from_memory(cover)?.to_rgba8();
        let capacity = Self::capacity(img.width(), img.height());
        if payload.len() > capacity {
            return Err(LedgerError::PayloadTooLarge {
                needed: payload.len(),
                capacity,
            });
        }

        let framed = frame::build_frame(payload)?;
        let raw: &mut [u8] = &mut img;
        let mut slots = carrier_slots(raw.len());
        for byte in &framed {
            for bit in (0..8).rev() {
                // Capacity was checked above, so a slot is always available
                let Some(slot) = slots.next() else {
                    return Err(LedgerError::PayloadTooLarge {
                        needed: payload.len(),
                        capacity,
                    });
                };
                raw[slot] = (raw[slot] & !1) | ((byte >> bit) & 1);
            }
        }

        debug!(
            "Embedded {} byte payload into {}x{} carrier ({} bytes free)",
            payload.len(),
            img.width(),
            img.height(),
            capacity - payload.len()
        );
        encode_rgba_png(&img)
    }

    fn extract(&self, carrier: &[u8]) -> Result<Vec<u8>> {
        let img = image::load_from_memory(carrier)?.to_rgba8();
        let raw = img.as_raw();
        let mut slots = carrier_slots(raw.len());

        let header = read_bytes(raw, &mut slots, HEADER_LEN).ok_or(LedgerError::NoPayloadFound)?;
        let (len, sum) = frame::parse_header(&header)?;
        if len > Self::capacity(img.width(), img.height()) {
            trace!("Frame announces {} bytes, more than the carrier holds", len);
            return Err(LedgerError::NoPayloadFound);
        }

        let payload = read_bytes(raw, &mut slots, len).ok_or(LedgerError::NoPayloadFound)?;
        frame::verify_payload(&payload, sum)?;
        debug!("Extracted {} byte payload", len);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn cover(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7) as u8, (y * 13) as u8, ((x + y) * 3) as u8, 255])
        });
        encode_rgba_png(&img).unwrap()
    }

    #[test]
    fn test_embed_then_extract() {
        let codec = LsbCodec::new();
        let payload = br#"{"Hero #1":"Hero #1","Stats":[{"P/S":10}]}"#;
        let carrier = codec.embed(&cover(32, 32), payload).unwrap();

        assert_eq!(codec.extract(&carrier).unwrap(), payload.to_vec());
    }

    #[test]
    fn test_carrier_pixels_change_by_at_most_one() {
        let codec = LsbCodec::new();
        let original = cover(16, 16);
        let carrier = codec.embed(&original, b"tiny").unwrap();

        let a = image::load_from_memory(&original).unwrap().to_rgba8();
        let b = image::load_from_memory(&carrier).unwrap().to_rgba8();
        for (pa, pb) in a.pixels().zip(b.pixels()) {
            for c in 0..3 {
                assert!((pa[c] as i16 - pb[c] as i16).abs() <= 1);
            }
            assert_eq!(pa[3], pb[3]);
        }
    }

    #[test]
    fn test_extract_from_clean_image_fails() {
        let codec = LsbCodec::new();
        assert!(matches!(
            codec.extract(&cover(16, 16)),
            Err(LedgerError::NoPayloadFound)
        ));
    }

    #[test]
    fn test_extract_from_tiny_image_fails() {
        let codec = LsbCodec::new();
        assert!(matches!(
            codec.extract(&cover(2, 2)),
            Err(LedgerError::NoPayloadFound)
        ));
    }

    #[test]
    fn test_payload_too_large() {
        let codec = LsbCodec::new();
        let capacity = LsbCodec::capacity(8, 8);
        assert_eq!(capacity, 8 * 8 * 3 / 8 - HEADER_LEN);

        let err = codec.embed(&cover(8, 8), &vec![0u8; capacity + 1]).unwrap_err();
        assert!(matches!(err, LedgerError::PayloadTooLarge { needed, .. } if needed == capacity + 1));
        assert!(codec.embed(&cover(8, 8), &vec![0u8; capacity]).is_ok());
    }
}
