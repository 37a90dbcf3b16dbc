//! Core functionality module
//!
//! This module contains the business logic of the stego ledger: naming and
//! ordering rules, attribute and stat handling, the reconciliation engine and
//! the embedding pipeline built on top of it.
//!
//! # Submodules
//!
//! - `attributes` - Ordered trait list for metadata records
//! - `config` - Configuration loading, saving, and management
//! - `embed` - Cover-to-carrier pipeline and sequential batches
//! - `error` - Error types and result aliases
//! - `naming` - Record names, carrier paths and unique output names
//! - `ordinal` - `#N` ordinal sort keys shared by both ledgers
//! - `reconcile` - One transactional ledger update per carrier
//! - `stats` - Stat values and ranges

pub mod attributes;
pub mod config;
pub mod embed;
pub mod error;
pub mod naming;
pub mod ordinal;
pub mod reconcile;
pub mod stats;
