//! Ledger persistence
//!
//! Both documents are read whole and written whole. A write serializes both
//! documents first, stages each in a temporary file next to its target, and
//! only then renames the two into place. A failure before the renames leaves
//! both documents as they were. The only remaining window is between the two
//! renames themselves.

use crate::core::error::{LedgerError, Result};
use crate::ledger::{DuplicatePolicy, Ledger, LookupFields, LookupTable, MetadataRecord, UpsertOutcome};
use log::{debug, info, trace};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Locations of the metadata and lookup documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStore {
    metadata_path: PathBuf,
    lookup_path: PathBuf,
}

impl LedgerStore {
    pub fn new(metadata_path: impl Into<PathBuf>, lookup_path: impl Into<PathBuf>) -> Self {
        Self {
            metadata_path: metadata_path.into(),
            lookup_path: lookup_path.into(),
        }
    }

    /// Both documents inside one directory
    pub fn in_dir(dir: &Path, metadata_file: &str, lookup_file: &str) -> Self {
        Self::new(dir.join(metadata_file), dir.join(lookup_file))
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn lookup_path(&self) -> &Path {
        &self.lookup_path
    }

    /// Load both documents; absent documents load as empty
    pub fn load(&self) -> Result<Ledger> {
        let mut records: Vec<MetadataRecord> = read_document(&self.metadata_path)?.unwrap_or_default();
        let lookup: LookupTable = read_document(&self.lookup_path)?.unwrap_or_default();

        // The document is ordered by index; hand edits may have disturbed that
        records.sort_by_key(|r| r.index);

        debug!(
            "Loaded ledger: {} metadata record(s), {} lookup entr(ies)",
            records.len(),
            lookup.len()
        );
        Ok(Ledger::from_parts(records, lookup))
    }

    /// Write both documents, replacing the previous versions together
    pub fn persist(&self, ledger: &Ledger) -> Result<()> {
        let metadata_json = serde_json::to_string_pretty(ledger.records())
            .map_err(|e| LedgerError::IoError(format!("Failed to serialize metadata: {}", e)))?;
        let lookup_json = serde_json::to_string_pretty(ledger.lookup())
            .map_err(|e| LedgerError::IoError(format!("Failed to serialize lookup: {}", e)))?;

        let metadata_tmp = stage(&self.metadata_path, &metadata_json)?;
        let lookup_tmp = stage(&self.lookup_path, &lookup_json)?;

        commit(metadata_tmp, &self.metadata_path)?;
        commit(lookup_tmp, &self.lookup_path)?;

        info!(
            "Saved {} record(s) to {} and {}",
            ledger.len(),
            self.metadata_path.display(),
            self.lookup_path.display()
        );
        Ok(())
    }

    /// Load, upsert and persist in one step
    ///
    /// A cancelled upsert writes nothing.
    pub fn upsert<P>(
        &self,
        candidate: MetadataRecord,
        filename_key: &str,
        fields: LookupFields,
        policy: &mut P,
    ) -> Result<UpsertOutcome>
    where
        P: DuplicatePolicy + ?Sized,
    {
        let mut ledger = self.load()?;
        let outcome = ledger.upsert(candidate, filename_key, fields, policy);
        if !outcome.is_cancelled() {
            self.persist(&ledger)?;
        }
        Ok(outcome)
    }
}

fn read_document<T>(path: &Path) -> Result<Option<T>>
where
    T: serde::de::DeserializeOwned,
{
    if !path.exists() {
        trace!("{} does not exist yet", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        LedgerError::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| LedgerError::corrupt(path, e))
}

/// Write `content` into a temporary file in the target's directory
fn stage(target: &Path, content: &str) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| {
        LedgerError::IoError(format!("Failed to create {}: {}", dir.display(), e))
    })?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

fn commit(tmp: NamedTempFile, target: &Path) -> Result<()> {
    tmp.persist(target).map_err(|e| {
        LedgerError::IoError(format!("Failed to replace {}: {}", target.display(), e.error))
    })?;
    Ok(())
}
