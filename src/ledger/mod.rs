//! Metadata and lookup ledgers
//!
//! The two documents are one component with two views. The metadata view is
//! authoritative: it is keyed by [`ContentHash`] and owns index assignment.
//! The lookup view is keyed by carrier file name, and its indices are
//! re-derived from the metadata view every time the ledger is reindexed, so
//! the two can never disagree once an upsert returns.
//!
//! # Submodules
//!
//! - `records` - Record types and their JSON shapes
//! - `store` - Loading and atomically persisting both documents

pub mod records;
pub mod store;

pub use records::{LookupRecord, LookupTable, MetadataRecord};
pub use store::LedgerStore;

use crate::core::ordinal::sort_by_ordinal;
use crate::encoding::ContentHash;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// What to do when reconciled content is already in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Overwrite the existing record's name and attributes, keeping its slot
    Replace,
    /// Abort the reconciliation without touching either document
    Cancel,
}

/// Resolves a duplicate content hash into a [`Decision`]
///
/// Implementations must not write to either ledger; interactive front ends
/// prompt the operator here and return the answer.
pub trait DuplicatePolicy {
    fn decide(&mut self, existing: &MetadataRecord) -> Decision;

    /// Resolves a file name collision: `filename_key` already belongs to
    /// `existing`, whose content differs from the candidate's.
    ///
    /// [`Decision::Replace`] removes `existing` from both views.
    fn decide_displaced(&mut self, existing: &MetadataRecord, filename_key: &str) -> Decision {
        let _ = filename_key;
        self.decide(existing)
    }
}

impl<F> DuplicatePolicy for F
where
    F: FnMut(&MetadataRecord) -> Decision,
{
    fn decide(&mut self, existing: &MetadataRecord) -> Decision {
        self(existing)
    }
}

/// Lookup fields supplied alongside a candidate record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFields {
    pub uri: String,
    pub uri_hex: String,
    pub owner: String,
}

/// Result of an [`Ledger::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new record was added at `index`
    Inserted { index: usize },
    /// An existing record was overwritten, or displaced from the file name,
    /// and the candidate now sits at `index`
    Replaced { index: usize, previous_index: usize },
    /// The duplicate policy cancelled; nothing changed
    Cancelled { existing_index: usize },
}

impl UpsertOutcome {
    /// The index the record holds after the upsert
    pub fn index(&self) -> usize {
        match *self {
            UpsertOutcome::Inserted { index } => index,
            UpsertOutcome::Replaced { index, .. } => index,
            UpsertOutcome::Cancelled { existing_index } => existing_index,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, UpsertOutcome::Cancelled { .. })
    }
}

/// An invariant violation found by [`Ledger::verify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Metadata indices are not exactly `0..N`
    IndexGap { position: usize, index: usize },
    /// Two metadata records share a content hash
    DuplicateHash { hash: ContentHash },
    /// A lookup entry's hash has no metadata record
    OrphanLookup { key: String },
    /// A lookup entry disagrees with its metadata record's index
    IndexMismatch {
        key: String,
        lookup_index: usize,
        metadata_index: usize,
    },
    /// A metadata record's hash has no lookup entry
    MissingLookup { index: usize, hash: ContentHash },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::IndexGap { position, index } => {
                write!(f, "record at position {} has index {}", position, index)
            }
            Violation::DuplicateHash { hash } => {
                write!(f, "content hash {} appears more than once", hash.short())
            }
            Violation::OrphanLookup { key } => {
                write!(f, "lookup entry '{}' has no metadata record", key)
            }
            Violation::IndexMismatch {
                key,
                lookup_index,
                metadata_index,
            } => write!(
                f,
                "lookup entry '{}' has index {} but its metadata record has {}",
                key, lookup_index, metadata_index
            ),
            Violation::MissingLookup { index, hash } => write!(
                f,
                "record at index {} ({}) has no lookup entry; re-embed its cover to restore it",
                index,
                hash.short()
            ),
        }
    }
}

/// Both ledger views, fully loaded in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<MetadataRecord>,
    lookup: LookupTable,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a ledger from loaded documents without reindexing
    pub fn from_parts(records: Vec<MetadataRecord>, lookup: LookupTable) -> Self {
        Self { records, lookup }
    }

    /// Metadata records in index order
    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    pub fn lookup(&self) -> &LookupTable {
        &self.lookup
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find the metadata record with the given content hash
    pub fn find_by_hash(&self, hash: &ContentHash) -> Option<&MetadataRecord> {
        self.records.iter().find(|r| r.content_hash == *hash)
    }

    /// Insert or replace a record and its lookup entry, then reindex
    ///
    /// When the candidate's hash is already present, `policy` decides. On
    /// [`Decision::Cancel`] the ledger is left untouched. On
    /// [`Decision::Replace`] the existing record keeps its slot (and so its
    /// index unless its ordinal changed) and takes the candidate's name and
    /// attributes.
    ///
    /// When `filename_key` already belongs to different content, `policy`
    /// decides again through [`DuplicatePolicy::decide_displaced`]. Replace
    /// removes the displaced record; Cancel leaves the ledger untouched.
    pub fn upsert<P>(
        &mut self,
        candidate: MetadataRecord,
        filename_key: &str,
        fields: LookupFields,
        policy: &mut P,
    ) -> UpsertOutcome
    where
        P: DuplicatePolicy + ?Sized,
    {
        let hash = candidate.content_hash;

        // Every decision is taken before the first mutation
        let mut previous_index = None;
        if let Some(existing) = self.find_by_hash(&hash) {
            let existing_index = existing.index;
            if policy.decide(existing) == Decision::Cancel {
                debug!(
                    "Duplicate {} at index {} kept unchanged",
                    hash.short(),
                    existing_index
                );
                return UpsertOutcome::Cancelled { existing_index };
            }
            previous_index = Some(existing_index);
        }

        let displaced = self.displaced_by(&hash, filename_key);
        if let Some(pos) = displaced {
            let displaced_index = self.records[pos].index;
            if policy.decide_displaced(&self.records[pos], filename_key) == Decision::Cancel {
                debug!(
                    "'{}' kept for the record at index {}",
                    filename_key, displaced_index
                );
                return UpsertOutcome::Cancelled {
                    existing_index: displaced_index,
                };
            }
            previous_index = previous_index.or(Some(displaced_index));
        }

        if let Some(pos) = displaced {
            let removed = self.records.remove(pos);
            info!(
                "Removed '{}' (index {}): '{}' now holds different content",
                removed.name, removed.index, filename_key
            );
        }

        match self.records.iter_mut().find(|r| r.content_hash == hash) {
            Some(record) => {
                record.name = candidate.name;
                record.attributes = candidate.attributes;
            }
            None => self.records.push(candidate),
        }

        self.reindex_records();

        let index = self
            .find_by_hash(&hash)
            .map(|r| r.index)
            .unwrap_or_default();

        let dropped = self.lookup.remove_hash_except(&hash, filename_key);
        if dropped > 0 {
            debug!("Dropped {} stale lookup entr(ies) for {}", dropped, hash.short());
        }
        self.lookup.insert(
            filename_key.to_string(),
            LookupRecord {
                index,
                uri: fields.uri,
                uri_hex: fields.uri_hex,
                sha: hash,
                owner: fields.owner,
            },
        );
        self.rederive_lookup();

        match previous_index {
            Some(previous_index) => UpsertOutcome::Replaced {
                index,
                previous_index,
            },
            None => UpsertOutcome::Inserted { index },
        }
    }

    /// Position of the record that owns `filename_key` with content other
    /// than `hash`
    fn displaced_by(&self, hash: &ContentHash, filename_key: &str) -> Option<usize> {
        let entry = self.lookup.get(filename_key)?;
        if entry.sha == *hash {
            return None;
        }
        self.records
            .iter()
            .position(|r| r.content_hash == entry.sha)
    }

    /// Re-sort both views and reassign every index
    pub fn reindex(&mut self) {
        self.reindex_records();
        self.rederive_lookup();
    }

    fn reindex_records(&mut self) {
        sort_by_ordinal(&mut self.records, |r| r.name.as_str());
        for (index, record) in self.records.iter_mut().enumerate() {
            record.index = index;
        }
    }

    /// Copy metadata indices into the lookup view and re-sort it by file name
    fn rederive_lookup(&mut self) {
        let by_hash: HashMap<ContentHash, usize> = self
            .records
            .iter()
            .map(|r| (r.content_hash, r.index))
            .collect();

        let entries = self.lookup.entries_mut();
        entries.retain(|(key, record)| {
            let known = by_hash.contains_key(&record.sha);
            if !known {
                warn!(
                    "Dropping lookup entry '{}': no metadata record for {}",
                    key,
                    record.sha.short()
                );
            }
            known
        });
        for (_, record) in entries.iter_mut() {
            record.index = by_hash[&record.sha];
        }
        sort_by_ordinal(entries, |(key, _)| key.as_str());
    }

    /// Check contiguity, uniqueness and cross-ledger consistency
    pub fn verify(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (position, record) in self.records.iter().enumerate() {
            if record.index != position {
                violations.push(Violation::IndexGap {
                    position,
                    index: record.index,
                });
            }
        }

        let mut seen = HashSet::new();
        for record in &self.records {
            if !seen.insert(record.content_hash) {
                violations.push(Violation::DuplicateHash {
                    hash: record.content_hash,
                });
            }
        }

        for (key, entry) in self.lookup.iter() {
            match self.find_by_hash(&entry.sha) {
                None => violations.push(Violation::OrphanLookup {
                    key: key.to_string(),
                }),
                Some(record) if record.index != entry.index => {
                    violations.push(Violation::IndexMismatch {
                        key: key.to_string(),
                        lookup_index: entry.index,
                        metadata_index: record.index,
                    })
                }
                Some(_) => {}
            }
        }

        let covered: HashSet<ContentHash> = self.lookup.iter().map(|(_, entry)| entry.sha).collect();
        for record in &self.records {
            if !covered.contains(&record.content_hash) {
                violations.push(Violation::MissingLookup {
                    index: record.index,
                    hash: record.content_hash,
                });
            }
        }

        violations
    }
}
