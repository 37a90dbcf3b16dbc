//! Character stats and the ranges they are drawn from
//!
//! Stats are plain integers. Range checks happen here, before values reach
//! the reconciliation core, which never validates bounds itself.

use crate::core::error::{LedgerError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three stats carried by every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub power: i64,
    pub speed: i64,
    pub wisdom: i64,
}

impl Stats {
    pub fn new(power: i64, speed: i64, wisdom: i64) -> Self {
        Self {
            power,
            speed,
            wisdom,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P/S {} · S/A {} · W/M {}",
            self.power, self.speed, self.wisdom
        )
    }
}

/// Inclusive range stats are sampled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRange {
    pub min: i64,
    pub max: i64,
}

impl Default for StatRange {
    fn default() -> Self {
        Self { min: 1, max: 99 }
    }
}

impl StatRange {
    /// Create a range, rejecting `min >= max`
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min >= max {
            return Err(LedgerError::RangeInvalid(format!(
                "minimum ({}) must be less than maximum ({})",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Draw all three stats uniformly from the range
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Stats {
        Stats {
            power: rng.gen_range(self.min..=self.max),
            speed: rng.gen_range(self.min..=self.max),
            wisdom: rng.gen_range(self.min..=self.max),
        }
    }

    /// Whether a value lies inside the range
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl fmt::Display for StatRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Parses `min-max`, where either bound may be negative (`-45-4839`, `-10--2`)
impl FromStr for StatRange {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || {
            LedgerError::RangeInvalid(format!(
                "'{}' (use min-max, e.g. 1-99 or -45-4839)",
                s
            ))
        };

        // The separator is the first '-' that is not a leading sign
        let body_start = usize::from(s.starts_with('-'));
        let sep = s[body_start..].find('-').ok_or_else(invalid)? + body_start;
        let (min, max) = (&s[..sep], &s[sep + 1..]);

        let parse = |part: &str| -> Result<i64> {
            let digits = part.strip_prefix('-').unwrap_or(part);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        StatRange::new(parse(min)?, parse(max)?)
    }
}

/// Parse one manually entered stat value
pub fn parse_stat(input: &str) -> Result<i64> {
    input
        .trim()
        .parse()
        .map_err(|_| LedgerError::RangeInvalid(format!("'{}' is not an integer", input.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_simple_range() {
        let range: StatRange = "1-99".parse().unwrap();
        assert_eq!(range, StatRange { min: 1, max: 99 });
        assert_eq!(range, StatRange::default());
    }

    #[test]
    fn test_parse_negative_bounds() {
        let range: StatRange = "-45-4839".parse().unwrap();
        assert_eq!(range, StatRange { min: -45, max: 4839 });

        let range: StatRange = " -10--2 ".parse().unwrap();
        assert_eq!(range, StatRange { min: -10, max: -2 });
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "5", "a-b", "1-", "-5", "1-2-3", "1 - 2", "+1-5"] {
            let err = input.parse::<StatRange>().unwrap_err();
            assert!(
                matches!(err, LedgerError::RangeInvalid(_)),
                "expected RangeInvalid for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_inverted_range() {
        assert!(matches!(
            "10-10".parse::<StatRange>().unwrap_err(),
            LedgerError::RangeInvalid(_)
        ));
        assert!(matches!(
            "50-1".parse::<StatRange>().unwrap_err(),
            LedgerError::RangeInvalid(_)
        ));
    }

    #[test]
    fn test_sample_within_bounds() {
        let range = StatRange::new(-3, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let stats = range.sample(&mut rng);
            assert!(range.contains(stats.power));
            assert!(range.contains(stats.speed));
            assert!(range.contains(stats.wisdom));
        }
    }

    #[test]
    fn test_sample_is_reproducible_with_seed() {
        let range = StatRange::default();
        let a = range.sample(&mut StdRng::seed_from_u64(7));
        let b = range.sample(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_stat() {
        assert_eq!(parse_stat(" 42 ").unwrap(), 42);
        assert_eq!(parse_stat("-7").unwrap(), -7);
        assert!(matches!(
            parse_stat("ten").unwrap_err(),
            LedgerError::RangeInvalid(_)
        ));
    }
}
