//! Ordinal index policy
//!
//! Both ledgers are ordered by the number following the first `#` in a name
//! (`"Hero #12 - Bold"` → 12). Names without one sort after every numbered
//! name. Sorting is stable, so equal ordinals keep their existing relative
//! order, which for a freshly appended record means insertion order.

use std::cmp::Ordering;

/// Sort key extracted from a record name or lookup filename
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Ordinal {
    Numbered(u64),
    Unordered,
}

/// Extract the ordinal from a name
pub fn sort_key(name: &str) -> Ordinal {
    for (pos, _) in name.match_indices('#') {
        let digits: &str = {
            let rest = &name[pos + 1..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..end]
        };
        if digits.is_empty() {
            continue;
        }
        // An absurdly long number still sorts after every representable one
        return Ordinal::Numbered(digits.parse().unwrap_or(u64::MAX));
    }
    Ordinal::Unordered
}

/// Compare two names by ordinal
pub fn compare(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Stable sort of items by the ordinal of the name `key` yields
pub fn sort_by_ordinal<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by_cached_key(|item| sort_key(key(item)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_extraction() {
        assert_eq!(sort_key("Hero #1"), Ordinal::Numbered(1));
        assert_eq!(sort_key("Hero #2 - Swift"), Ordinal::Numbered(2));
        assert_eq!(sort_key("Hero #042_steggy.png"), Ordinal::Numbered(42));
        assert_eq!(sort_key("Hero"), Ordinal::Unordered);
        assert_eq!(sort_key("Hero # 5"), Ordinal::Unordered);
    }

    #[test]
    fn test_first_numbered_hash_wins() {
        assert_eq!(sort_key("#tag Hero #7"), Ordinal::Numbered(7));
        assert_eq!(sort_key("Hero #3 of #9"), Ordinal::Numbered(3));
    }

    #[test]
    fn test_overflowing_number_sorts_last_among_numbered() {
        let key = sort_key("Hero #99999999999999999999999");
        assert_eq!(key, Ordinal::Numbered(u64::MAX));
        assert!(key < Ordinal::Unordered);
    }

    #[test]
    fn test_unordered_sorts_last() {
        assert_eq!(compare("Hero #3", "Hero #7"), Ordering::Less);
        assert_eq!(compare("Villain", "Hero #1000"), Ordering::Greater);
        assert_eq!(compare("Villain", "Sidekick"), Ordering::Equal);
    }

    #[test]
    fn test_stable_sort_keeps_insertion_order_for_ties() {
        let mut names = vec!["Plain B", "Hero #7", "Plain A", "Hero #3", "Twin #3"];
        sort_by_ordinal(&mut names, |n| n);
        assert_eq!(
            names,
            vec!["Hero #3", "Twin #3", "Hero #7", "Plain B", "Plain A"]
        );
    }
}
