//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Hide payloads in cover images and keep the metadata and lookup ledgers consistent
#[derive(Parser, Debug)]
#[command(name = "stego-ledger")]
#[command(author = "Vihaan Reddy M")]
#[command(version = "1.0.0")]
#[command(about = "Hide JSON payloads in cover images and keep the metadata and URI lookup ledgers deduplicated and consistently indexed", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the ledger documents (overrides config)
    #[arg(short, long, global = true)]
    pub metadata_dir: Option<PathBuf>,

    /// Directory carrier images are written to (overrides config)
    #[arg(short, long, global = true)]
    pub images_dir: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

/// Action when an embedded image is already recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnDuplicate {
    Ask,
    Replace,
    Cancel,
}

/// Output form for `transcode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TranscodeTarget {
    /// base64 data URI
    DataUri,
    /// `0x` hex-encoded data URI
    Hex,
    /// Raw image bytes (requires --output)
    Raw,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed a payload into one or more cover images and record them
    ///
    /// Each cover is normalized to PNG, a JSON payload with its name and
    /// stats is hidden in it, and the carrier is written as
    /// <images_dir>/<name>_steggy.png. Directories are expanded to the
    /// supported images they contain (jpeg, jpg, png, webp, tiff, bmp).
    Embed {
        /// Cover image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Walk directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Random stat range as min-max, e.g. 1-99 or -45-4839 (overrides config)
        #[arg(long, value_name = "MIN-MAX", allow_hyphen_values = true)]
        range: Option<String>,

        /// Fixed stats as power,speed,wisdom instead of random ones
        #[arg(long, value_name = "P,S,W", value_delimiter = ',', allow_negative_numbers = true)]
        stats: Option<Vec<i64>>,

        /// Add a Notable trait to every record
        #[arg(long)]
        honorary: bool,

        /// Notable value (defaults to the last '-' segment of the file name)
        #[arg(long)]
        notable: Option<String>,

        /// Owner written into the lookup records (overrides config)
        #[arg(long)]
        owner: Option<String>,

        /// What to do when an image is already recorded (overrides config)
        #[arg(long, value_enum)]
        on_duplicate: Option<OnDuplicate>,
    },

    /// Reveal the payload hidden in a carrier image
    ///
    /// INPUT may be a file path, a data URI or a 0x hex data URI. The
    /// payload is printed and saved to <revealed_dir>/revealedJson.json
    /// (or revealedJson_N.json when that name is taken).
    Reveal {
        /// Carrier image as path, data URI or hex data URI
        input: String,

        /// Only print the payload, do not save it
        #[arg(long)]
        no_save: bool,
    },

    /// Convert an image between raw bytes, data URI and hex data URI
    Transcode {
        /// Image as path, data URI or hex data URI
        input: String,

        /// Output form
        #[arg(short, long, value_enum, default_value = "data-uri")]
        to: TranscodeTarget,

        /// Write the result to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the content hash of an image as the ledgers record it
    Hash {
        /// Image as path, data URI or hex data URI
        input: String,
    },

    /// List the records of the metadata ledger
    List {
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check both ledgers for index gaps, duplicate hashes and mismatches
    Verify {
        /// Rewrite both ledgers with fresh indices when violations are found
        #[arg(long)]
        fix: bool,
    },

    /// Open the configuration file in your default editor
    ///
    /// If no config file exists, a default one will be created.
    Config {
        /// Show the config file path without opening it
        #[arg(long)]
        path: bool,

        /// Reset config to defaults (creates a fresh config file)
        #[arg(long)]
        reset: bool,
    },

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show current configuration
    ShowConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embed() {
        let args = Args::parse_from([
            "stego-ledger",
            "embed",
            "covers",
            "--range",
            "-45-4839",
            "--honorary",
            "--on-duplicate",
            "replace",
        ]);

        match args.command {
            Some(Commands::Embed {
                inputs,
                range,
                honorary,
                on_duplicate,
                stats,
                ..
            }) => {
                assert_eq!(inputs, vec![PathBuf::from("covers")]);
                assert_eq!(range.as_deref(), Some("-45-4839"));
                assert!(honorary);
                assert_eq!(on_duplicate, Some(OnDuplicate::Replace));
                assert!(stats.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_fixed_stats() {
        let args = Args::parse_from(["stego-ledger", "embed", "a.png", "--stats", "10,-20,30"]);
        match args.command {
            Some(Commands::Embed { stats, .. }) => assert_eq!(stats, Some(vec![10, -20, 30])),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_no_subcommand_runs_wizard() {
        let args = Args::parse_from(["stego-ledger", "--log-level", "debug"]);
        assert!(args.command.is_none());
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_parse_transcode() {
        let args = Args::parse_from(["stego-ledger", "transcode", "0x6461", "--to", "raw", "-o", "out.png"]);
        match args.command {
            Some(Commands::Transcode { input, to, output }) => {
                assert_eq!(input, "0x6461");
                assert_eq!(to, TranscodeTarget::Raw);
                assert_eq!(output, Some(PathBuf::from("out.png")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
