//! Steganographic embedding
//!
//! The reconciliation engine only ever sees the [`StegoCodec`] trait; the
//! concrete least-significant-bit codec and the PNG normalization live here so
//! that tests can swap in an in-memory codec.
//!
//! # Submodules
//!
//! - `frame` - Binary container wrapped around an embedded payload
//! - `lsb` - [`LsbCodec`], hides a frame in the RGB low bits of a PNG
//! - `normalize` - Re-encode any supported raster format as PNG
//! - `payload` - JSON document embedded into each carrier

pub mod frame;
pub mod lsb;
pub mod normalize;
pub mod payload;

pub use lsb::LsbCodec;
pub use normalize::normalize_to_png;
pub use payload::EmbeddedPayload;

use crate::core::error::Result;

/// Hides a payload inside a cover image and recovers it again
///
/// Implementations must fail `extract` with
/// [`LedgerError::NoPayloadFound`](crate::core::error::LedgerError::NoPayloadFound)
/// when the carrier holds nothing they recognise.
pub trait StegoCodec {
    /// Embed `payload` into `cover`, returning the encoded carrier image
    fn embed(&self, cover: &[u8], payload: &[u8]) -> Result<Vec<u8>>;

    /// Recover the payload previously embedded into `carrier`
    fn extract(&self, carrier: &[u8]) -> Result<Vec<u8>>;
}

impl<C: StegoCodec + ?Sized> StegoCodec for &C {
    fn embed(&self, cover: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
        (**self).embed(cover, payload)
    }

    fn extract(&self, carrier: &[u8]) -> Result<Vec<u8>> {
        (**self).extract(carrier)
    }
}
