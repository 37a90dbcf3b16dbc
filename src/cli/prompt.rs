//! Interactive prompts
//!
//! The ledger never prompts by itself; it asks a [`DuplicatePolicy`] for a
//! decision. [`PromptPolicy`] is the terminal implementation of that seam.

use crate::core::config::DuplicateAction;
use crate::core::error::{LedgerError, Result};
use crate::core::stats::{parse_stat, StatRange, Stats};
use crate::ledger::{Decision, DuplicatePolicy, MetadataRecord};
use dialoguer::{Confirm, Input};
use indicatif::ProgressBar;
use log::warn;
use std::path::PathBuf;

fn input_error(e: dialoguer::Error) -> LedgerError {
    LedgerError::IoError(format!("Failed to read input: {}", e))
}

/// Asks the operator whether to replace an already recorded image
#[derive(Default)]
pub struct PromptPolicy {
    /// Hidden while the question is on screen
    progress: Option<ProgressBar>,
}

impl PromptPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(progress: ProgressBar) -> Self {
        Self {
            progress: Some(progress),
        }
    }

    fn suspended<F: FnOnce() -> Decision>(&self, f: F) -> Decision {
        match &self.progress {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    fn ask(existing: &MetadataRecord, headline: &str, question: &str) -> Decision {
        println!();
        println!("  ⚠ {}", headline);
        println!("      index: {}", existing.index);
        println!("      name:  {}", existing.name);
        println!("      sha:   {}", existing.content_hash);

        let answer = Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact();

        match answer {
            Ok(true) => Decision::Replace,
            Ok(false) => Decision::Cancel,
            Err(e) => {
                warn!("Could not prompt for a decision ({}); keeping the existing record", e);
                Decision::Cancel
            }
        }
    }
}

impl DuplicatePolicy for PromptPolicy {
    fn decide(&mut self, existing: &MetadataRecord) -> Decision {
        self.suspended(|| {
            Self::ask(
                existing,
                "This image is already recorded:",
                "Replace the existing record's name and attributes?",
            )
        })
    }

    fn decide_displaced(&mut self, existing: &MetadataRecord, filename_key: &str) -> Decision {
        let headline = format!("'{}' already belongs to another record:", filename_key);
        self.suspended(|| {
            Self::ask(
                existing,
                &headline,
                "Remove that record and overwrite its carrier?",
            )
        })
    }
}

/// Always answers with the same decision
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub Decision);

impl DuplicatePolicy for FixedPolicy {
    fn decide(&mut self, existing: &MetadataRecord) -> Decision {
        log::info!(
            "'{}' is already recorded at index {}: {:?}",
            existing.name,
            existing.index,
            self.0
        );
        self.0
    }

    fn decide_displaced(&mut self, existing: &MetadataRecord, filename_key: &str) -> Decision {
        log::info!(
            "'{}' already belongs to '{}' at index {}: {:?}",
            filename_key,
            existing.name,
            existing.index,
            self.0
        );
        self.0
    }
}

/// The policy for a configured duplicate action
pub fn policy_for(action: DuplicateAction, progress: Option<ProgressBar>) -> Box<dyn DuplicatePolicy> {
    match action.fixed_decision() {
        Some(decision) => Box::new(FixedPolicy(decision)),
        None => Box::new(PromptPolicy { progress }),
    }
}

/// Ask for a `min-max` stat range
pub fn prompt_stats_range(default: StatRange) -> Result<StatRange> {
    let text: String = Input::new()
        .with_prompt("Stat range (min-max)")
        .default(default.to_string())
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            input.parse::<StatRange>().map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(input_error)?;
    text.parse()
}

fn prompt_stat(label: &str) -> Result<i64> {
    let text: String = Input::new()
        .with_prompt(label)
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            parse_stat(input).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(input_error)?;
    parse_stat(&text)
}

/// Ask for all three stats by hand
pub fn prompt_manual_stats() -> Result<Stats> {
    Ok(Stats::new(
        prompt_stat("Power/Strength")?,
        prompt_stat("Speed/Agility")?,
        prompt_stat("Wisdom/Magic")?,
    ))
}

/// Manual entry or a random draw from `range`
pub fn prompt_stats(range: StatRange) -> Result<Stats> {
    let manual = Confirm::new()
        .with_prompt("Enter stats manually?")
        .default(false)
        .interact()
        .map_err(input_error)?;

    if manual {
        prompt_manual_stats()
    } else {
        let range = prompt_stats_range(range)?;
        Ok(range.sample(&mut rand::thread_rng()))
    }
}

/// Ask for the cover image path
pub fn prompt_cover_path() -> Result<PathBuf> {
    let text: String = Input::new()
        .with_prompt("Cover image path")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            let path = PathBuf::from(input.trim());
            if path.is_file() {
                Ok(())
            } else {
                Err(format!("'{}' is not a file", path.display()))
            }
        })
        .interact_text()
        .map_err(input_error)?;
    Ok(PathBuf::from(text.trim()))
}

/// Ask whether the record gets a `Notable` trait, and its value
pub fn prompt_notable(default_notable: &str) -> Result<Option<String>> {
    let honorary = Confirm::new()
        .with_prompt("Is this an honorary item?")
        .default(false)
        .interact()
        .map_err(input_error)?;
    if !honorary {
        return Ok(None);
    }

    let notable: String = Input::new()
        .with_prompt("Notable value")
        .default(default_notable.to_string())
        .interact_text()
        .map_err(input_error)?;
    Ok(Some(notable.trim().to_string()))
}

/// Ask for a yes/no confirmation
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(input_error)
}
