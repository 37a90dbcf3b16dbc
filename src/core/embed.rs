//! Cover-to-carrier pipeline
//!
//! Handles the full embedding workflow for one or many cover images:
//! - Name and notable value parsing from the cover file name
//! - PNG normalization and payload embedding through a [`StegoCodec`]
//! - Reconciliation into both ledgers
//! - Writing the carrier image once the ledgers are committed
//!
//! Batches run strictly one item after another. Items already committed stay
//! committed when a later one fails or is cancelled.

use crate::core::error::{LedgerError, Result};
use crate::core::naming::{carrier_path, lookup_key, parse_cover_name};
use crate::core::reconcile::{reconcile, ReconcileOutcome, ReconcileRequest, ReconcileSummary};
use crate::core::stats::Stats;
use crate::encoding::transcoder::is_supported_image;
use crate::encoding::EncodedForm;
use crate::ledger::{DuplicatePolicy, LedgerStore};
use crate::stego::{normalize_to_png, EmbeddedPayload, StegoCodec};
use log::{debug, error, info, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// One cover image to embed
#[derive(Debug, Clone)]
pub struct EmbedJob {
    pub cover: PathBuf,
    pub stats: Stats,
    pub honorary: bool,
    /// Overrides the notable value parsed from the file name
    pub notable: Option<String>,
}

impl EmbedJob {
    pub fn new(cover: impl Into<PathBuf>, stats: Stats) -> Self {
        Self {
            cover: cover.into(),
            stats,
            honorary: false,
            notable: None,
        }
    }
}

/// Result of embedding a single cover
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedOutcome {
    Committed {
        carrier: PathBuf,
        summary: ReconcileSummary,
    },
    Cancelled {
        existing_index: usize,
    },
}

/// Progress of a running batch
#[derive(Debug, Clone)]
pub struct BatchProgress<'a> {
    pub current: usize,
    pub total: usize,
    pub cover: &'a Path,
}

/// Tally of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub committed: Vec<(PathBuf, ReconcileSummary)>,
    pub cancelled: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    /// Stopped early on a shutdown request
    pub interrupted: bool,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.committed.len() + self.cancelled.len() + self.failed.len()
    }

    pub fn replaced(&self) -> usize {
        self.committed.iter().filter(|(_, s)| s.replaced).count()
    }
}

/// Embeds covers with a codec and records them in a ledger store
pub struct Embedder<'a, C: StegoCodec> {
    codec: C,
    store: &'a LedgerStore,
    images_dir: PathBuf,
    owner: String,
}

impl<'a, C: StegoCodec> Embedder<'a, C> {
    pub fn new(codec: C, store: &'a LedgerStore, images_dir: impl Into<PathBuf>, owner: impl Into<String>) -> Self {
        Self {
            codec,
            store,
            images_dir: images_dir.into(),
            owner: owner.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Embed one cover and reconcile the carrier
    ///
    /// The carrier is staged next to its final path and only moved into place
    /// after the ledgers are committed; a cancelled duplicate leaves no file.
    pub fn embed<P>(&self, job: &EmbedJob, policy: &mut P) -> Result<EmbedOutcome>
    where
        P: DuplicatePolicy + ?Sized,
    {
        if !is_supported_image(&job.cover) {
            return Err(LedgerError::UnsupportedType(format!(
                "{} (expected one of: {})",
                job.cover.display(),
                crate::encoding::transcoder::SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let parsed = parse_cover_name(&job.cover)?;
        let notable = job.notable.clone().unwrap_or(parsed.notable);

        let cover = fs::read(&job.cover).map_err(|e| {
            LedgerError::IoError(format!("Failed to read {}: {}", job.cover.display(), e))
        })?;
        let png = normalize_to_png(&cover)?;

        let payload = EmbeddedPayload::new(parsed.full_name.as_str(), notable.as_str(), job.stats);
        let carrier = self.codec.embed(&png, &payload.to_json_bytes()?)?;

        let target = carrier_path(&self.images_dir, &parsed.full_name);
        let staged = stage_carrier(&target, &carrier)?;

        let request = ReconcileRequest {
            image: EncodedForm::raw(carrier, "image/png"),
            name: parsed.full_name,
            stats: job.stats,
            honorary: job.honorary,
            notable,
            owner: self.owner.clone(),
            filename_key: lookup_key(&target),
        };

        match reconcile(self.store, request, policy)? {
            ReconcileOutcome::Cancelled { existing_index } => {
                debug!("Discarding staged carrier for {}", target.display());
                Ok(EmbedOutcome::Cancelled { existing_index })
            }
            ReconcileOutcome::Committed(summary) => {
                // The ledgers already hold the record; say which one lacks its carrier
                if let Err(e) = staged.persist(&target) {
                    error!(
                        "Recorded index {} (sha {}) but could not write its carrier {}: {}",
                        summary.index,
                        summary.content_hash,
                        target.display(),
                        e.error
                    );
                    return Err(LedgerError::IoError(format!(
                        "Failed to write {} for the record at index {} (sha {}): {}; \
                         re-embed the cover with --on-duplicate replace to restore it",
                        target.display(),
                        summary.index,
                        summary.content_hash.short(),
                        e.error
                    )));
                }
                info!("Carrier saved to {}", target.display());
                Ok(EmbedOutcome::Committed {
                    carrier: target,
                    summary,
                })
            }
        }
    }

    /// Embed a list of covers one after another
    ///
    /// Failures are recorded and the batch continues. A set `shutdown_flag`
    /// stops the batch before the next item starts.
    pub fn embed_batch<P, F>(
        &self,
        jobs: &[EmbedJob],
        policy: &mut P,
        shutdown_flag: Arc<AtomicBool>,
        mut on_progress: F,
    ) -> BatchReport
    where
        P: DuplicatePolicy + ?Sized,
        F: FnMut(BatchProgress<'_>),
    {
        let mut report = BatchReport::default();
        let total = jobs.len();

        for (current, job) in jobs.iter().enumerate() {
            if shutdown_flag.load(Ordering::SeqCst) {
                warn!("Shutdown requested, stopping after {} of {} covers", current, total);
                report.interrupted = true;
                break;
            }

            on_progress(BatchProgress {
                current,
                total,
                cover: &job.cover,
            });

            match self.embed(job, policy) {
                Ok(EmbedOutcome::Committed { summary, .. }) => {
                    report.committed.push((job.cover.clone(), summary));
                }
                Ok(EmbedOutcome::Cancelled { .. }) => {
                    report.cancelled.push(job.cover.clone());
                }
                Err(e) => {
                    warn!("Failed to embed '{}': {}", job.cover.display(), e);
                    report.failed.push((job.cover.clone(), e.to_string()));
                }
            }
        }

        info!(
            "Batch finished: {} committed, {} cancelled, {} failed",
            report.committed.len(),
            report.cancelled.len(),
            report.failed.len()
        );
        report
    }
}

fn stage_carrier(target: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| {
        LedgerError::IoError(format!("Failed to create {}: {}", dir.display(), e))
    })?;

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    Ok(staged)
}

/// Collect supported cover images from files and directories
///
/// Directories are walked recursively; unsupported files inside them are
/// skipped, while an explicitly named unsupported file is kept so the batch
/// reports it.
pub fn collect_covers(inputs: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut covers = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let max_depth = if recursive { usize::MAX } else { 1 };
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(input)
                .max_depth(max_depth)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| is_supported_image(path))
                .collect();
            found.sort();
            debug!("Found {} cover(s) in {}", found.len(), input.display());
            covers.extend(found);
        } else {
            covers.push(input.clone());
        }
    }
    covers
}
