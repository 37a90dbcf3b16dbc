//! Reconciliation engine
//!
//! Turns an encoded carrier image plus its derived attributes into one
//! transactional ledger update: compute the canonical data URI and its hash,
//! build both candidate records, and hand them to [`LedgerStore::upsert`]
//! together with the caller's duplicate policy.

use crate::core::attributes::build_attributes;
use crate::core::error::Result;
use crate::core::stats::Stats;
use crate::encoding::{ContentHash, EncodedForm};
use crate::ledger::{DuplicatePolicy, LedgerStore, LookupFields, MetadataRecord, UpsertOutcome};
use log::{debug, info};
use std::path::PathBuf;

/// Everything needed to reconcile one carrier image
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    /// The carrier image in any of its three encoded forms
    pub image: EncodedForm,
    /// Record name, usually the cover's normalized file stem
    pub name: String,
    pub stats: Stats,
    /// Prepend a `Notable` trait
    pub honorary: bool,
    pub notable: String,
    pub owner: String,
    /// Lookup ledger key, the carrier's normalized file name
    pub filename_key: String,
}

/// A committed reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub index: usize,
    pub content_hash: ContentHash,
    pub metadata_path: PathBuf,
    pub lookup_path: PathBuf,
    /// An existing record with the same content was overwritten
    pub replaced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Committed(ReconcileSummary),
    /// The duplicate policy declined; neither ledger was written
    Cancelled { existing_index: usize },
}

impl ReconcileOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReconcileOutcome::Cancelled { .. })
    }

    pub fn summary(&self) -> Option<&ReconcileSummary> {
        match self {
            ReconcileOutcome::Committed(summary) => Some(summary),
            ReconcileOutcome::Cancelled { .. } => None,
        }
    }
}

/// Reconcile one carrier image into both ledgers
///
/// `policy` is consulted only when the content hash is already recorded.
/// Encoding errors surface before the ledgers are read.
pub fn reconcile<P>(store: &LedgerStore, request: ReconcileRequest, policy: &mut P) -> Result<ReconcileOutcome>
where
    P: DuplicatePolicy + ?Sized,
{
    let data_uri = request.image.to_data_uri()?;
    let uri_hex = crate::encoding::transcoder::to_hex(&data_uri);
    let content_hash = ContentHash::of_data_uri(&data_uri);
    debug!(
        "Reconciling '{}' ({} input, hash {})",
        request.name,
        request.image.kind(),
        content_hash.short()
    );

    let attributes = build_attributes(&request.stats, request.honorary, &request.notable);
    let candidate = MetadataRecord::new(content_hash, request.name.as_str(), attributes);
    let fields = LookupFields {
        uri: data_uri,
        uri_hex,
        owner: request.owner,
    };

    let outcome = store.upsert(candidate, &request.filename_key, fields, policy)?;
    let (index, replaced) = match outcome {
        UpsertOutcome::Cancelled { existing_index } => {
            info!(
                "Kept existing record {} for '{}'; nothing written",
                existing_index, request.name
            );
            return Ok(ReconcileOutcome::Cancelled { existing_index });
        }
        UpsertOutcome::Inserted { index } => (index, false),
        UpsertOutcome::Replaced { index, .. } => (index, true),
    };

    info!(
        "{} '{}' at index {}",
        if replaced { "Replaced" } else { "Recorded" },
        request.name,
        index
    );
    Ok(ReconcileOutcome::Committed(ReconcileSummary {
        index,
        content_hash,
        metadata_path: store.metadata_path().to_path_buf(),
        lookup_path: store.lookup_path().to_path_buf(),
        replaced,
    }))
}
