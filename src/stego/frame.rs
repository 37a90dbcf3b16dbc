//! Payload frame
//!
//! ```text
//! [4 bytes] magic "SLG1"
//! [4 bytes] payload length (big-endian u32)
//! [4 bytes] first four bytes of SHA-256(payload)
//! [N bytes] payload
//! ```

use crate::core::error::{LedgerError, Result};
use sha2::{Digest, Sha256};

pub const MAGIC: &[u8; 4] = b"SLG1";

/// Bytes preceding the payload
pub const HEADER_LEN: usize = 12;

fn checksum(payload: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(payload);
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Total frame size for a payload of `payload_len` bytes
pub fn frame_len(payload_len: usize) -> usize {
    HEADER_LEN + payload_len
}

/// Wrap `payload` in a frame
pub fn build_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| LedgerError::PayloadTooLarge {
        needed: payload.len(),
        capacity: u32::MAX as usize,
    })?;

    let mut frame = Vec::with_capacity(frame_len(payload.len()));
    frame.extend_from_slice(MAGIC);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&checksum(payload));
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Parse a frame header, returning the announced payload length
///
/// Fails with `NoPayloadFound` when the magic does not match.
pub fn parse_header(header: &[u8]) -> Result<(usize, [u8; 4])> {
    if header.len() < HEADER_LEN || &header[..4] != MAGIC {
        return Err(LedgerError::NoPayloadFound);
    }
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let sum = [header[8], header[9], header[10], header[11]];
    Ok((len, sum))
}

/// Check a payload against the checksum from its header
pub fn verify_payload(payload: &[u8], expected: [u8; 4]) -> Result<()> {
    if checksum(payload) != expected {
        return Err(LedgerError::NoPayloadFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let frame = build_frame(b"hello").unwrap();
        assert_eq!(frame.len(), frame_len(5));
        assert_eq!(&frame[..4], MAGIC);
        assert_eq!(&frame[4..8], &5u32.to_be_bytes());
        assert_eq!(&frame[HEADER_LEN..], b"hello");
    }

    #[test]
    fn test_parse_header_and_verify() {
        let frame = build_frame(b"payload").unwrap();
        let (len, sum) = parse_header(&frame[..HEADER_LEN]).unwrap();
        assert_eq!(len, 7);
        assert!(verify_payload(&frame[HEADER_LEN..], sum).is_ok());
        assert!(matches!(
            verify_payload(b"tampered", sum),
            Err(LedgerError::NoPayloadFound)
        ));
    }

    #[test]
    fn test_bad_magic_is_no_payload() {
        let header = [0u8; HEADER_LEN];
        assert!(matches!(
            parse_header(&header),
            Err(LedgerError::NoPayloadFound)
        ));
    }
}
