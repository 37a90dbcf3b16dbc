//! Attribute list construction
//!
//! Every record carries the three stat traits in a fixed order. Honorary
//! records additionally lead with a `Notable` trait.

use crate::core::stats::Stats;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TRAIT_NOTABLE: &str = "Notable";
pub const TRAIT_POWER: &str = "Power/Strength";
pub const TRAIT_SPEED: &str = "Speed/Agility";
pub const TRAIT_WISDOM: &str = "Wisdom/Magic";

/// A trait value as stored in the metadata document: a string or an integer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraitValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for TraitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraitValue::Int(v) => write!(f, "{}", v),
            TraitValue::Text(v) => f.write_str(v),
        }
    }
}

/// One `{trait_type, value}` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: TraitValue,
}

impl Attribute {
    pub fn int(trait_type: &str, value: i64) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: TraitValue::Int(value),
        }
    }

    pub fn text(trait_type: &str, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: TraitValue::Text(value.into()),
        }
    }
}

/// Build the ordered attribute list for a record
///
/// Stat bounds are not checked here.
pub fn build_attributes(stats: &Stats, honorary: bool, notable_value: &str) -> Vec<Attribute> {
    let mut attributes = Vec::with_capacity(4);
    if honorary {
        attributes.push(Attribute::text(TRAIT_NOTABLE, notable_value));
    }
    attributes.push(Attribute::int(TRAIT_POWER, stats.power));
    attributes.push(Attribute::int(TRAIT_SPEED, stats.speed));
    attributes.push(Attribute::int(TRAIT_WISDOM, stats.wisdom));
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_attributes() {
        let attributes = build_attributes(&Stats::new(10, 20, 30), false, "ignored");
        assert_eq!(
            attributes,
            vec![
                Attribute::int(TRAIT_POWER, 10),
                Attribute::int(TRAIT_SPEED, 20),
                Attribute::int(TRAIT_WISDOM, 30),
            ]
        );
    }

    #[test]
    fn test_honorary_leads_with_notable() {
        let attributes = build_attributes(&Stats::new(1, 2, 3), true, "Swift");
        assert_eq!(attributes.len(), 4);
        assert_eq!(attributes[0], Attribute::text(TRAIT_NOTABLE, "Swift"));
        assert_eq!(attributes[1].trait_type, TRAIT_POWER);
        assert_eq!(attributes[3].trait_type, TRAIT_WISDOM);
    }

    #[test]
    fn test_out_of_range_stats_pass_through() {
        let attributes = build_attributes(&Stats::new(-500, 0, i64::MAX), false, "");
        assert_eq!(attributes[0].value, TraitValue::Int(-500));
        assert_eq!(attributes[2].value, TraitValue::Int(i64::MAX));
    }

    #[test]
    fn test_trait_value_json_shape() {
        let json = serde_json::to_string(&build_attributes(&Stats::new(5, 6, 7), true, "Bold"))
            .unwrap();
        assert_eq!(
            json,
            r#"[{"trait_type":"Notable","value":"Bold"},{"trait_type":"Power/Strength","value":5},{"trait_type":"Speed/Agility","value":6},{"trait_type":"Wisdom/Magic","value":7}]"#
        );

        let back: Vec<Attribute> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0].value, TraitValue::Text("Bold".to_string()));
        assert_eq!(back[1].value, TraitValue::Int(5));
    }
}
