//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::cli::args::{OnDuplicate, TranscodeTarget};
use crate::cli::progress::{
    format_bytes, print_divider, print_error, print_header, print_info, print_success,
    print_warning, EmbedProgress, Spinner,
};
use crate::cli::prompt::{self, policy_for};
use crate::cli::{Args, Commands};
use crate::core::config::{get_config_path, init_config, open_config_in_editor, Config, DuplicateAction};
use crate::core::embed::{collect_covers, BatchReport, EmbedJob, EmbedOutcome, Embedder};
use crate::core::naming::{parse_cover_name, unique_file_name};
use crate::core::stats::{StatRange, Stats};
use crate::encoding::{ContentHash, EncodedForm};
use crate::ledger::LedgerStore;
use crate::stego::payload::render_revealed;
use crate::stego::{LsbCodec, StegoCodec};
use anyhow::{bail, Context, Result};
use log::{debug, error, info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// File stem of saved reveal output
const REVEALED_BASE_NAME: &str = "revealedJson";

impl From<OnDuplicate> for DuplicateAction {
    fn from(value: OnDuplicate) -> Self {
        match value {
            OnDuplicate::Ask => DuplicateAction::Ask,
            OnDuplicate::Replace => DuplicateAction::Replace,
            OnDuplicate::Cancel => DuplicateAction::Cancel,
        }
    }
}

/// Options of the `embed` command
#[derive(Debug, Clone, Default)]
pub struct EmbedOptions {
    pub inputs: Vec<PathBuf>,
    pub recursive: bool,
    pub range: Option<String>,
    pub stats: Option<Vec<i64>>,
    pub honorary: bool,
    pub notable: Option<String>,
    pub owner: Option<String>,
    pub on_duplicate: Option<OnDuplicate>,
}

/// Run the appropriate command based on CLI arguments
///
/// Without a subcommand the interactive embed wizard runs.
pub fn run_command(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    match &args.command {
        Some(Commands::Embed {
            inputs,
            recursive,
            range,
            stats,
            honorary,
            notable,
            owner,
            on_duplicate,
        }) => {
            let options = EmbedOptions {
                inputs: inputs.clone(),
                recursive: *recursive,
                range: range.clone(),
                stats: stats.clone(),
                honorary: *honorary,
                notable: notable.clone(),
                owner: owner.clone(),
                on_duplicate: *on_duplicate,
            };
            embed_covers(config, &options, shutdown_flag)?;
        }
        Some(Commands::Reveal { input, no_save }) => {
            reveal(config, input, !*no_save)?;
        }
        Some(Commands::Transcode { input, to, output }) => {
            transcode(input, *to, output.as_deref())?;
        }
        Some(Commands::Hash { input }) => {
            hash(config, input)?;
        }
        Some(Commands::List { json }) => {
            list_records(config, *json)?;
        }
        Some(Commands::Verify { fix }) => {
            verify_ledgers(config, *fix)?;
        }
        Some(Commands::Config { path, reset }) => {
            handle_config_command(*path, *reset)?;
        }
        Some(Commands::GenerateConfig { output }) => {
            generate_config_file(output.clone())?;
        }
        Some(Commands::ShowConfig) => {
            show_config(config);
        }
        None => {
            run_wizard(config, shutdown_flag)?;
        }
    }

    Ok(())
}

/// Stats for every job: fixed values, or a fresh random draw per cover
enum StatSource {
    Fixed(Stats),
    Random(StatRange),
}

impl StatSource {
    fn from_options(options: &EmbedOptions, config: &Config) -> Result<Self> {
        if let Some(values) = &options.stats {
            return match values.as_slice() {
                [power, speed, wisdom] => Ok(StatSource::Fixed(Stats::new(*power, *speed, *wisdom))),
                _ => bail!("--stats takes exactly three values (power,speed,wisdom), got {}", values.len()),
            };
        }

        let range = match &options.range {
            Some(text) => text.parse::<StatRange>()?,
            None => config.stats.range()?,
        };
        Ok(StatSource::Random(range))
    }

    fn next(&self) -> Stats {
        match self {
            StatSource::Fixed(stats) => *stats,
            StatSource::Random(range) => range.sample(&mut rand::thread_rng()),
        }
    }
}

/// Embed and record one or more cover images
pub fn embed_covers(config: &Config, options: &EmbedOptions, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    let covers = collect_covers(&options.inputs, options.recursive);
    if covers.is_empty() {
        warn!("No supported cover images found");
        return Ok(());
    }

    let source = StatSource::from_options(options, config)?;
    let jobs: Vec<EmbedJob> = covers
        .into_iter()
        .map(|cover| EmbedJob {
            cover,
            stats: source.next(),
            honorary: options.honorary,
            notable: options.notable.clone(),
        })
        .collect();

    let action = options
        .on_duplicate
        .map(DuplicateAction::from)
        .unwrap_or(config.ledger.on_duplicate);
    let owner = options.owner.clone().unwrap_or_else(|| config.ledger.owner.clone());
    let store = config.ledger_store();
    let embedder = Embedder::new(LsbCodec::new(), &store, &config.paths.images_dir, owner);

    info!(
        "Embedding {} cover(s) into {}",
        jobs.len(),
        config.paths.images_dir.display()
    );

    let progress = EmbedProgress::new(jobs.len() as u64);
    let mut policy = policy_for(action, Some(progress.bar().clone()));
    let report = embedder.embed_batch(&jobs, &mut *policy, shutdown_flag, |p| progress.update(&p));
    progress.finish(&report);

    print_report(&report);
    if !report.failed.is_empty() {
        bail!("{} of {} cover(s) failed", report.failed.len(), jobs.len());
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!();
    for (cover, summary) in &report.committed {
        print_success(&format!(
            "{} -> index {}{} (sha {})",
            cover.display(),
            summary.index,
            if summary.replaced { ", replaced" } else { "" },
            summary.content_hash.short()
        ));
    }
    for cover in &report.cancelled {
        print_info(&format!("{} already recorded, kept unchanged", cover.display()));
    }
    for (cover, reason) in &report.failed {
        print_error(&format!("{}: {}", cover.display(), reason));
    }
    if report.interrupted {
        print_warning("Stopped early; covers not yet processed were left alone");
    }
    if let Some((_, summary)) = report.committed.last() {
        print_info(&format!(
            "Ledgers: {} and {}",
            summary.metadata_path.display(),
            summary.lookup_path.display()
        ));
    }
}

/// Extract and print the payload of a carrier, optionally saving it
pub fn reveal(config: &Config, input: &str, save: bool) -> Result<()> {
    let form = EncodedForm::from_input(input)?;
    debug!("Reveal input detected as {}", form.kind());

    let carrier = form.to_bytes()?;
    let spinner = Spinner::new("Extracting payload...");
    let extracted = LsbCodec::new().extract(&carrier);
    spinner.finish();
    let payload = extracted?;

    let rendered = render_revealed(&payload);
    println!("{}", rendered);

    if save {
        let dir = &config.paths.revealed_dir;
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = unique_file_name(dir, REVEALED_BASE_NAME, ".json", config.ledger.unique_name_attempts)?;
        fs::write(&path, rendered.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        print_success(&format!("Saved revealed payload to {}", path.display()));
    }
    Ok(())
}

/// Convert an image between its encoded forms
pub fn transcode(input: &str, to: TranscodeTarget, output: Option<&Path>) -> Result<()> {
    let form = EncodedForm::from_input(input)?;
    debug!("Transcoding {} input to {:?}", form.kind(), to);

    let bytes = match to {
        TranscodeTarget::DataUri => form.to_data_uri()?.into_bytes(),
        TranscodeTarget::Hex => form.to_hex()?.into_bytes(),
        TranscodeTarget::Raw => {
            if output.is_none() {
                bail!("--to raw needs --output; raw image bytes are not printed");
            }
            form.to_bytes()?
        }
    };

    match output {
        Some(path) => {
            fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!(
                "Wrote {} to {}",
                format_bytes(bytes.len() as u64),
                path.display()
            ));
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

/// Print the content hash of an image and whether it is recorded
pub fn hash(config: &Config, input: &str) -> Result<()> {
    let form = EncodedForm::from_input(input)?;
    let content_hash = ContentHash::of_data_uri(&form.to_data_uri()?);
    println!("{}", content_hash);

    let ledger = config.ledger_store().load()?;
    match ledger.find_by_hash(&content_hash) {
        Some(record) => print_info(&format!("Recorded at index {} as '{}'", record.index, record.name)),
        None => print_info("Not recorded in the metadata ledger"),
    }
    Ok(())
}

/// Print the metadata ledger
pub fn list_records(config: &Config, json: bool) -> Result<()> {
    let store = config.ledger_store();
    let ledger = store.load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(ledger.records())?);
        return Ok(());
    }

    if ledger.is_empty() {
        print_info(&format!("No records in {}", store.metadata_path().display()));
        return Ok(());
    }

    print_header(&format!("{} record(s)", ledger.len()));
    for record in ledger.records() {
        let keys: Vec<&str> = ledger
            .lookup()
            .iter()
            .filter(|(_, entry)| entry.sha == record.content_hash)
            .map(|(key, _)| key)
            .collect();
        let traits: Vec<String> = record
            .attributes
            .iter()
            .map(|a| format!("{}: {}", a.trait_type, a.value))
            .collect();

        println!("  [{:>4}] {}", record.index, record.name);
        println!("         sha    {}", record.content_hash.short());
        println!("         traits {}", traits.join(", "));
        if !keys.is_empty() {
            println!("         file   {}", keys.join(", "));
        }
    }
    Ok(())
}

/// Check both ledgers and optionally rewrite them with fresh indices
pub fn verify_ledgers(config: &Config, fix: bool) -> Result<()> {
    let store = config.ledger_store();
    let mut ledger = store.load()?;
    let violations = ledger.verify();

    if violations.is_empty() {
        print_success(&format!(
            "{} record(s) and {} lookup entr(ies) are consistent",
            ledger.len(),
            ledger.lookup().len()
        ));
        return Ok(());
    }

    for violation in &violations {
        print_warning(&violation.to_string());
    }

    if !fix {
        bail!(
            "{} violation(s) found; run 'stego-ledger verify --fix' to reindex",
            violations.len()
        );
    }

    ledger.reindex();
    store.persist(&ledger)?;
    let remaining = ledger.verify();
    if remaining.is_empty() {
        print_success("Reindexed both ledgers");
        return Ok(());
    }

    for violation in &remaining {
        print_error(&violation.to_string());
    }
    bail!("{} violation(s) need manual repair", remaining.len())
}

/// Interactive embedding, one cover at a time
pub fn run_wizard(config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    print_header("Stego Ledger");
    let store = config.ledger_store();
    let embedder = Embedder::new(
        LsbCodec::new(),
        &store,
        &config.paths.images_dir,
        config.ledger.owner.clone(),
    );
    let range = config.stats.range()?;

    loop {
        if shutdown_flag.load(Ordering::SeqCst) {
            warn!("Shutdown requested, leaving the wizard");
            break;
        }

        if let Err(e) = wizard_step(&embedder, &store, config, range) {
            print_error(&format!("{:#}", e));
        }

        print_divider();
        if !prompt::confirm("Embed another image?", false)? {
            break;
        }
    }
    Ok(())
}

fn wizard_step<C: StegoCodec>(
    embedder: &Embedder<'_, C>,
    store: &LedgerStore,
    config: &Config,
    range: StatRange,
) -> Result<()> {
    let cover = prompt::prompt_cover_path()?;
    let parsed = parse_cover_name(&cover)?;
    print_info(&format!("Name: {}", parsed.full_name));

    let notable = prompt::prompt_notable(&parsed.notable)?;
    let stats = prompt::prompt_stats(range)?;
    print_info(&format!("Stats: {}", stats));

    let job = EmbedJob {
        cover,
        stats,
        honorary: notable.is_some(),
        notable,
    };

    let spinner = Spinner::new("Embedding...");
    let mut policy = policy_for(config.ledger.on_duplicate, Some(spinner.bar().clone()));
    let outcome = embedder.embed(&job, &mut *policy);
    spinner.finish();

    match outcome? {
        EmbedOutcome::Committed { carrier, summary } => {
            print_success(&format!("Carrier saved to {}", carrier.display()));
            print_success(&format!(
                "{} at index {} (sha {})",
                if summary.replaced { "Replaced" } else { "Recorded" },
                summary.index,
                summary.content_hash.short()
            ));
            print_info(&format!(
                "Ledgers: {} and {}",
                store.metadata_path().display(),
                store.lookup_path().display()
            ));
        }
        EmbedOutcome::Cancelled { existing_index } => {
            print_info(&format!(
                "Kept the existing record at index {}; nothing written",
                existing_index
            ));
        }
    }
    Ok(())
}

/// Handle the `config` subcommand
pub fn handle_config_command(show_path: bool, reset: bool) -> Result<()> {
    if reset {
        if let Some(config_path) = get_config_path() {
            if config_path.exists() {
                fs::remove_file(&config_path)?;
                info!("Removed existing config file");
            }
        }
        let path = init_config()?;
        info!("Created fresh config file at: {}", path.display());
        return Ok(());
    }

    if show_path {
        let path = Config::get_active_config_path();
        println!("{}", path.display());
        if path.exists() {
            info!("Config file exists at: {}", path.display());
        } else {
            info!("Config file would be created at: {}", path.display());
        }
        return Ok(());
    }

    info!("Opening configuration file in default editor...");
    match open_config_in_editor() {
        Ok(path) => {
            info!("Config file: {}", path.display());
            info!("Run 'stego-ledger show-config' to verify your settings.");
        }
        Err(e) => {
            error!("Failed to open config file: {}", e);
            if let Some(path) = get_config_path() {
                info!("You can manually edit the config at: {}", path.display());
            }
        }
    }

    Ok(())
}

/// Generate a configuration file at the specified or default location
pub fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    let output_path = match output {
        Some(path) => {
            fs::write(&path, Config::generate_default_config())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            path
        }
        None => init_config()?,
    };

    info!("Configuration file: {}", output_path.display());
    info!("Quick tip: Run 'stego-ledger config' to open the config in your editor.");
    Ok(())
}

/// Show the current configuration settings
pub fn show_config(config: &Config) {
    let config_path = Config::get_active_config_path();
    info!("Configuration file: {}", config_path.display());
    if !config_path.exists() {
        info!("(Using default settings - no config file found)");
    }
    info!("");
    info!("[paths]");
    info!("  metadata_dir = \"{}\"", config.paths.metadata_dir.display());
    info!("  metadata_file = \"{}\"", config.paths.metadata_file);
    info!("  lookup_file = \"{}\"", config.paths.lookup_file);
    info!("  images_dir = \"{}\"", config.paths.images_dir.display());
    info!("  revealed_dir = \"{}\"", config.paths.revealed_dir.display());
    info!("");
    info!("[stats]");
    info!("  min = {}", config.stats.min);
    info!("  max = {}", config.stats.max);
    if let Err(e) = config.stats.range() {
        warn!("  {}", e);
    }
    info!("");
    info!("[ledger]");
    info!("  owner = \"{}\"", config.ledger.owner);
    info!("  on_duplicate = {:?}", config.ledger.on_duplicate);
    info!("  unique_name_attempts = {}", config.ledger.unique_name_attempts);
    info!("");
    info!("[logging]");
    info!("  level = \"{}\"", config.logging.level);
    info!("  log_to_file = {}", config.logging.log_to_file);
    info!("  log_file = \"{}\"", config.logging.log_file.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stego::normalize::encode_rgba_png;
    use crate::stego::EmbeddedPayload;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.paths.metadata_dir = dir.join("metadata");
        config.paths.images_dir = dir.join("images");
        config.paths.revealed_dir = dir.join("revealed");
        config.ledger.on_duplicate = DuplicateAction::Cancel;
        config
    }

    fn write_cover(path: &Path, shade: u8) {
        let img = RgbaImage::from_pixel(24, 24, Rgba([shade, 90, 180, 255]));
        fs::write(path, encode_rgba_png(&img).unwrap()).unwrap();
    }

    #[test]
    fn test_stat_source() {
        let config = Config::default();
        let fixed = EmbedOptions {
            stats: Some(vec![1, 2, 3]),
            ..Default::default()
        };
        assert!(matches!(
            StatSource::from_options(&fixed, &config).unwrap(),
            StatSource::Fixed(s) if s == Stats::new(1, 2, 3)
        ));

        let short = EmbedOptions {
            stats: Some(vec![1, 2]),
            ..Default::default()
        };
        assert!(StatSource::from_options(&short, &config).is_err());

        let ranged = EmbedOptions {
            range: Some("-45-4839".to_string()),
            ..Default::default()
        };
        let source = StatSource::from_options(&ranged, &config).unwrap();
        let stats = source.next();
        let range = StatRange::new(-45, 4839).unwrap();
        assert!(range.contains(stats.power) && range.contains(stats.speed) && range.contains(stats.wisdom));

        let inverted = EmbedOptions {
            range: Some("9-3".to_string()),
            ..Default::default()
        };
        assert!(StatSource::from_options(&inverted, &config).is_err());
    }

    #[test]
    fn test_embed_then_reveal_saves_numbered_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let cover = temp_dir.path().join("Hero #4 - Brave.png");
        write_cover(&cover, 40);

        let options = EmbedOptions {
            inputs: vec![cover],
            stats: Some(vec![10, 20, 30]),
            ..Default::default()
        };
        embed_covers(&config, &options, Arc::new(AtomicBool::new(false))).unwrap();

        let carrier = config.paths.images_dir.join("Hero #4 - Brave_steggy.png");
        let carrier_arg = carrier.to_string_lossy().into_owned();
        reveal(&config, &carrier_arg, true).unwrap();
        reveal(&config, &carrier_arg, true).unwrap();

        let first = config.paths.revealed_dir.join("revealedJson.json");
        let second = config.paths.revealed_dir.join("revealedJson_1.json");
        let saved: serde_json::Value = serde_json::from_slice(&fs::read(&first).unwrap()).unwrap();
        assert_eq!(saved["Hero #4 - Brave"], "Brave");
        assert_eq!(saved["Stats"][2]["W/M"], 30);
        assert!(second.exists());

        let expected = EmbeddedPayload::new("Hero #4 - Brave", "Brave", Stats::new(10, 20, 30));
        let extracted = LsbCodec::new().extract(&fs::read(&carrier).unwrap()).unwrap();
        assert_eq!(extracted, expected.to_json_bytes().unwrap());
    }

    #[test]
    fn test_embed_reports_failures() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let broken = temp_dir.path().join("Hero #1.png");
        fs::write(&broken, b"nope").unwrap();

        let options = EmbedOptions {
            inputs: vec![broken],
            ..Default::default()
        };
        assert!(embed_covers(&config, &options, Arc::new(AtomicBool::new(false))).is_err());
    }

    #[test]
    fn test_transcode_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out.png");
        let uri = "data:image/png;base64,iVBORw0KGgo=";

        transcode(uri, TranscodeTarget::Raw, Some(&out)).unwrap();
        assert_eq!(fs::read(&out).unwrap(), b"\x89PNG\r\n\x1a\n");

        let hex_out = temp_dir.path().join("out.hex");
        transcode(uri, TranscodeTarget::Hex, Some(&hex_out)).unwrap();
        assert_eq!(
            fs::read_to_string(&hex_out).unwrap(),
            crate::encoding::transcoder::to_hex(uri)
        );

        assert!(transcode(uri, TranscodeTarget::Raw, None).is_err());
    }

    #[test]
    fn test_verify_fix_reindexes() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let store = config.ledger_store();
        fs::create_dir_all(&config.paths.metadata_dir).unwrap();

        let hash = ContentHash::of_data_uri("data:a;base64,QQ==");
        fs::write(
            store.metadata_path(),
            format!(
                r#"[{{"index":7,"sha":"{}","name":"Hero #1","attributes":[]}}]"#,
                hash
            ),
        )
        .unwrap();
        fs::write(
            store.lookup_path(),
            format!(
                r#"{{"Hero #1_steggy.png":{{"index":7,"uri":"data:a;base64,QQ==","sha":"{}","owner":""}}}}"#,
                hash
            ),
        )
        .unwrap();

        assert!(verify_ledgers(&config, false).is_err());
        verify_ledgers(&config, true).unwrap();
        let ledger = store.load().unwrap();
        assert_eq!(ledger.records()[0].index, 0);
        assert_eq!(ledger.lookup().get("Hero #1_steggy.png").unwrap().index, 0);
        verify_ledgers(&config, false).unwrap();
    }

    #[test]
    fn test_verify_fix_cannot_invent_lookup_entries() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let store = config.ledger_store();
        fs::create_dir_all(&config.paths.metadata_dir).unwrap();

        let hash = ContentHash::of_data_uri("data:a;base64,QQ==");
        fs::write(
            store.metadata_path(),
            format!(
                r#"[{{"index":0,"sha":"{}","name":"Hero #1","attributes":[]}}]"#,
                hash
            ),
        )
        .unwrap();

        let err = verify_ledgers(&config, true).unwrap_err();
        assert!(err.to_string().contains("manual repair"));
    }
}
