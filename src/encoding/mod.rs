//! Encoding module
//!
//! Conversions between the three carrier forms and the content identity
//! derived from them.
//!
//! # Submodules
//!
//! - `transcoder` - Raw bytes, data URI and hex data URI conversions
//! - `identity` - SHA-256 content hash over the canonical data URI

pub mod identity;
pub mod transcoder;

pub use identity::ContentHash;
pub use transcoder::{detect_form, EncodedForm, FormKind};
