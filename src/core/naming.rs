//! Item names and output file names
//!
//! Record names come from the cover image's file stem, with en-dashes folded
//! into plain hyphens so `"Hero #2 – Swift"` and `"Hero #2 - Swift"` are the
//! same name.

use crate::core::error::{LedgerError, Result};
use std::path::{Path, PathBuf};

/// Suffix appended to the stem of every carrier image
pub const CARRIER_SUFFIX: &str = "_steggy";

/// Replace en-dashes with hyphens
pub fn normalize_dashes(s: &str) -> String {
    s.replace('\u{2013}', "-")
}

/// Name and default notable value parsed from a cover image path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Full record name: the normalized file stem
    pub full_name: String,
    /// Last `-`-separated segment of the name, trimmed
    pub notable: String,
}

/// Parse a cover image path into a record name
pub fn parse_cover_name(path: &Path) -> Result<ParsedName> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(normalize_dashes)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            LedgerError::UnsupportedType(format!("invalid file name: {}", path.display()))
        })?;

    Ok(ParsedName {
        notable: notable_from_name(&stem),
        full_name: stem,
    })
}

/// The last `-`-separated segment of a name, trimmed
pub fn notable_from_name(name: &str) -> String {
    normalize_dashes(name)
        .rsplit('-')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Normalized file name used as the lookup ledger key
pub fn lookup_key(path: &Path) -> String {
    normalize_dashes(
        &path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    )
}

/// Carrier image path for a record name: `<dir>/<name>_steggy.png`
pub fn carrier_path(images_dir: &Path, full_name: &str) -> PathBuf {
    images_dir.join(format!(
        "{}{}.png",
        normalize_dashes(full_name),
        CARRIER_SUFFIX
    ))
}

/// Find a file name in `dir` that does not exist yet
///
/// Tries `<base><ext>`, then `<base>_1<ext>`, `<base>_2<ext>`, ... and fails
/// once `max_attempts` candidates are taken.
pub fn unique_file_name(dir: &Path, base: &str, ext: &str, max_attempts: u32) -> Result<PathBuf> {
    for count in 0..max_attempts {
        let file_name = if count == 0 {
            format!("{}{}", base, ext)
        } else {
            format!("{}_{}{}", base, count, ext)
        };
        let candidate = dir.join(file_name);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(LedgerError::NameSpaceExhausted {
        base: base.to_string(),
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_dashes() {
        assert_eq!(normalize_dashes("Hero #2 \u{2013} Swift"), "Hero #2 - Swift");
        assert_eq!(normalize_dashes("plain"), "plain");
    }

    #[test]
    fn test_parse_cover_name() {
        let parsed = parse_cover_name(Path::new("covers/Hero #2 \u{2013} Swift.jpg")).unwrap();
        assert_eq!(parsed.full_name, "Hero #2 - Swift");
        assert_eq!(parsed.notable, "Swift");
    }

    #[test]
    fn test_notable_without_dash_is_whole_name() {
        assert_eq!(notable_from_name("Hero #1"), "Hero #1");
        assert_eq!(notable_from_name("A - B - C "), "C");
    }

    #[test]
    fn test_parse_cover_name_rejects_empty_stem() {
        assert!(parse_cover_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_lookup_key_and_carrier_path() {
        let carrier = carrier_path(Path::new("images"), "Hero #2 \u{2013} Swift");
        assert_eq!(carrier, Path::new("images").join("Hero #2 - Swift_steggy.png"));
        assert_eq!(lookup_key(&carrier), "Hero #2 - Swift_steggy.png");
    }

    #[test]
    fn test_unique_file_name_increments() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        let first = unique_file_name(dir, "revealedJson", ".json", 10).unwrap();
        assert_eq!(first, dir.join("revealedJson.json"));
        fs::write(&first, "{}").unwrap();

        let second = unique_file_name(dir, "revealedJson", ".json", 10).unwrap();
        assert_eq!(second, dir.join("revealedJson_1.json"));
    }

    #[test]
    fn test_unique_file_name_bounded() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("out.json"), "").unwrap();
        fs::write(dir.join("out_1.json"), "").unwrap();

        let err = unique_file_name(dir, "out", ".json", 2).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NameSpaceExhausted { attempts: 2, .. }
        ));
    }
}
