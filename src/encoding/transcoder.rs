//! Carrier image transcoding
//!
//! A carrier image travels in one of three forms:
//!
//! - raw bytes (usually read from a file path),
//! - a base64 data URI: `data:<mime>;base64,<payload>`,
//! - a hex-encoded data URI: `0x` followed by the hex of the data URI string.
//!
//! All three are losslessly interconvertible. [`detect_form`] classifies an
//! arbitrary input, checking the hex prefix first, then the data URI prefix,
//! and treating anything else as a path or raw bytes.

use crate::core::error::{LedgerError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use log::trace;
use std::fmt;
use std::fs;
use std::path::Path;

/// Prefix of a hex-encoded data URI
pub const HEX_PREFIX: &str = "0x";

/// Prefix of a data URI
pub const DATA_URI_PREFIX: &str = "data:";

/// Image extensions accepted as cover or carrier input
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "webp", "tiff", "bmp"];

/// Which of the three forms an input represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    /// `0x`-prefixed hex of a data URI
    HexDataUri,
    /// `data:` URI with base64 payload
    DataUri,
    /// Anything else: a file path or raw image bytes
    Raw,
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormKind::HexDataUri => write!(f, "hex data URI"),
            FormKind::DataUri => write!(f, "data URI"),
            FormKind::Raw => write!(f, "raw bytes"),
        }
    }
}

/// A carrier image in one of its three interchangeable forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedForm {
    /// Raw image bytes, with the MIME type if it is already known
    Raw { bytes: Vec<u8>, mime: Option<String> },
    /// `data:<mime>;base64,<payload>`
    DataUri(String),
    /// `0x<hex of the data URI>`
    HexDataUri(String),
}

/// Classify an input by its prefix
///
/// The hex prefix is checked before the data URI prefix; anything matching
/// neither is treated as a file path or raw bytes.
pub fn detect_form(input: impl AsRef<[u8]>) -> FormKind {
    let input = input.as_ref();
    if input.starts_with(HEX_PREFIX.as_bytes()) {
        FormKind::HexDataUri
    } else if input.starts_with(DATA_URI_PREFIX.as_bytes()) {
        FormKind::DataUri
    } else {
        FormKind::Raw
    }
}

/// Build a base64 data URI from raw bytes
pub fn to_data_uri(bytes: &[u8], mime: &str) -> Result<String> {
    let mime = mime.trim();
    if mime.is_empty() {
        return Err(LedgerError::UnsupportedType(
            "no MIME type for data URI".to_string(),
        ));
    }
    Ok(format!("{}{};base64,{}", DATA_URI_PREFIX, mime, STANDARD.encode(bytes)))
}

/// Hex-encode a data URI string, prefixed with `0x`
pub fn to_hex(data_uri: &str) -> String {
    format!("{}{}", HEX_PREFIX, hex::encode(data_uri.as_bytes()))
}

/// Decode a `0x`-prefixed hex string back into its data URI
pub fn from_hex(hex_uri: &str) -> Result<String> {
    let digits = hex_uri.strip_prefix(HEX_PREFIX).unwrap_or(hex_uri);
    let bytes = hex::decode(digits)
        .map_err(|e| LedgerError::InvalidEncoding(format!("malformed hex: {}", e)))?;

    if !bytes.starts_with(DATA_URI_PREFIX.as_bytes()) {
        return Err(LedgerError::InvalidEncoding(
            "hex data does not convert to a valid data URI".to_string(),
        ));
    }

    String::from_utf8(bytes).map_err(|e| {
        LedgerError::InvalidEncoding(format!("hex data is not a UTF-8 data URI: {}", e))
    })
}

/// Decode the payload of a base64 data URI
///
/// The URI is split on its first `,` only; everything after it is base64.
pub fn data_uri_to_bytes(data_uri: &str) -> Result<Vec<u8>> {
    if !data_uri.starts_with(DATA_URI_PREFIX) {
        return Err(LedgerError::InvalidEncoding(
            "input is not a data URI".to_string(),
        ));
    }

    let (_, payload) = data_uri
        .split_once(',')
        .ok_or_else(|| LedgerError::InvalidEncoding("data URI has no payload".to_string()))?;

    STANDARD
        .decode(payload)
        .map_err(|e| LedgerError::InvalidEncoding(format!("invalid base64 payload: {}", e)))
}

/// Extract the MIME type from a data URI header
pub fn data_uri_mime(data_uri: &str) -> Option<&str> {
    let header = data_uri.strip_prefix(DATA_URI_PREFIX)?.split(',').next()?;
    let mime = header.split(';').next()?;
    (!mime.is_empty()).then_some(mime)
}

/// Whether the path has one of the supported image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Determine the MIME type of an image file from its extension
pub fn mime_for_path(path: &Path) -> Result<&'static str> {
    if !is_supported_image(path) {
        return Err(LedgerError::UnsupportedType(format!(
            "'{}' (supported formats: {})",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .map_err(|_| LedgerError::UnsupportedType(path.display().to_string()))
}

/// Determine the MIME type of image bytes by sniffing their signature
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

impl EncodedForm {
    /// Parse operator input: a hex data URI, a data URI, or a file path
    pub fn from_input(input: &str) -> Result<Self> {
        let input = input.trim();
        match detect_form(input) {
            FormKind::HexDataUri => Ok(EncodedForm::HexDataUri(input.to_string())),
            FormKind::DataUri => Ok(EncodedForm::DataUri(input.to_string())),
            FormKind::Raw => Self::from_path(Path::new(input)),
        }
    }

    /// Read an image file as raw bytes, resolving its MIME type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(LedgerError::IoError(format!(
                "File does not exist: {}",
                path.display()
            )));
        }
        let mime = mime_for_path(path)?;
        let bytes = fs::read(path)?;
        trace!("Read {} bytes ({}) from {}", bytes.len(), mime, path.display());

        Ok(EncodedForm::Raw {
            bytes,
            mime: Some(mime.to_string()),
        })
    }

    /// Raw bytes with an explicit MIME type
    pub fn raw(bytes: Vec<u8>, mime: &str) -> Self {
        EncodedForm::Raw {
            bytes,
            mime: Some(mime.to_string()),
        }
    }

    /// Which form this value is in
    pub fn kind(&self) -> FormKind {
        match self {
            EncodedForm::Raw { .. } => FormKind::Raw,
            EncodedForm::DataUri(_) => FormKind::DataUri,
            EncodedForm::HexDataUri(_) => FormKind::HexDataUri,
        }
    }

    /// The canonical data URI form
    pub fn to_data_uri(&self) -> Result<String> {
        match self {
            EncodedForm::Raw { bytes, mime } => {
                let mime = match mime.as_deref() {
                    Some(m) => m,
                    None => sniff_mime(bytes).ok_or_else(|| {
                        LedgerError::UnsupportedType("unrecognized image data".to_string())
                    })?,
                };
                to_data_uri(bytes, mime)
            }
            EncodedForm::DataUri(uri) => {
                data_uri_to_bytes(uri)?;
                Ok(uri.clone())
            }
            EncodedForm::HexDataUri(hex_uri) => from_hex(hex_uri),
        }
    }

    /// The `0x` hex data URI form
    pub fn to_hex(&self) -> Result<String> {
        match self {
            EncodedForm::HexDataUri(hex_uri) => {
                from_hex(hex_uri)?;
                Ok(hex_uri.clone())
            }
            other => Ok(to_hex(&other.to_data_uri()?)),
        }
    }

    /// The raw image bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            EncodedForm::Raw { bytes, .. } => Ok(bytes.clone()),
            EncodedForm::DataUri(uri) => data_uri_to_bytes(uri),
            EncodedForm::HexDataUri(hex_uri) => data_uri_to_bytes(&from_hex(hex_uri)?),
        }
    }
}
