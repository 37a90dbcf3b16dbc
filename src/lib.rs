//! Stego Ledger Library
//!
//! Hides a small JSON payload (a name and three stats) inside cover images
//! and records every carrier in two JSON ledgers that must stay consistent:
//! a metadata ledger of ordered records and a lookup ledger keyed by carrier
//! file name. Records are deduplicated by the SHA-256 of the carrier's data
//! URI, so one image maps to exactly one record whichever encoding it was
//! supplied in.
//!
//! # Architecture
//!
//! - [`encoding`] - Raw bytes, data URI and hex data URI conversions, plus content hashing
//! - [`stego`] - Cover normalization and the LSB payload codec
//! - [`ledger`] - Record types, the in-memory ledger and its on-disk store
//! - [`core`] - Configuration, errors, naming rules, reconciliation and embedding
//! - [`cli`] - Command-line interface (only used by the binary)
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use stego_ledger::core::config::Config;
//! use stego_ledger::core::embed::{EmbedJob, Embedder};
//! use stego_ledger::core::stats::Stats;
//! use stego_ledger::ledger::{Decision, MetadataRecord};
//! use stego_ledger::stego::LsbCodec;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let store = config.ledger_store();
//!     let embedder = Embedder::new(LsbCodec::new(), &store, &config.paths.images_dir, "owner");
//!
//!     let job = EmbedJob::new("covers/Hero #1 - Brave.png", Stats::new(10, 20, 30));
//!     let mut keep_existing = |_: &MetadataRecord| Decision::Cancel;
//!     embedder.embed(&job, &mut keep_existing)?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod encoding;
pub mod ledger;
pub mod stego;

pub use crate::core::config::Config;
pub use crate::core::error::{LedgerError, Result};
pub use encoding::{ContentHash, EncodedForm};
pub use ledger::LedgerStore;
pub use stego::StegoCodec;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
