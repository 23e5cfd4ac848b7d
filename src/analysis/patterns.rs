//! Rule tables mapping band-power shares to pattern tags and indicators

use crate::analysis::spectral::{Band, BandPowerMap};
use crate::config::constants::analysis::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicate over band-power percentages and the dominant band
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    Above(Band, f64),
    Below(Band, f64),
    Dominant(Band),
    DominantAbove(Band, f64),
}

impl Condition {
    pub fn holds(&self, powers: &BandPowerMap, dominant: Option<Band>) -> bool {
        match *self {
            Condition::Above(band, limit) => powers.get(band) > limit,
            Condition::Below(band, limit) => powers.get(band) < limit,
            Condition::Dominant(band) => dominant == Some(band),
            Condition::DominantAbove(band, limit) => dominant == Some(band) && powers.get(band) > limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTag {
    StrongAlphaRhythm,
    ElevatedTheta,
    HighBetaActivity,
    ElevatedDelta,
}

impl PatternTag {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternTag::StrongAlphaRhythm => "strong_alpha_rhythm",
            PatternTag::ElevatedTheta => "elevated_theta",
            PatternTag::HighBetaActivity => "high_beta_activity",
            PatternTag::ElevatedDelta => "elevated_delta",
        }
    }
}

impl fmt::Display for PatternTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Normal,
    Attention,
    Cognitive,
    Anomaly,
}

/// Human-readable clinical hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    #[serde(rename = "type")]
    pub kind: IndicatorKind,
    pub description: String,
}

#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    pub condition: Condition,
    pub tag: PatternTag,
}

#[derive(Debug, Clone, Copy)]
pub struct IndicatorRule {
    pub condition: Condition,
    pub kind: IndicatorKind,
    pub description: &'static str,
}

pub const PATTERN_RULES: [PatternRule; 4] = [
    PatternRule {
        condition: Condition::Above(Band::Alpha, STRONG_ALPHA_PERCENT),
        tag: PatternTag::StrongAlphaRhythm,
    },
    PatternRule {
        condition: Condition::Above(Band::Theta, ELEVATED_THETA_PERCENT),
        tag: PatternTag::ElevatedTheta,
    },
    PatternRule {
        condition: Condition::Above(Band::Beta, HIGH_BETA_PERCENT),
        tag: PatternTag::HighBetaActivity,
    },
    PatternRule {
        condition: Condition::Above(Band::Delta, ELEVATED_DELTA_PERCENT),
        tag: PatternTag::ElevatedDelta,
    },
];

pub const INDICATOR_RULES: [IndicatorRule; 6] = [
    IndicatorRule {
        condition: Condition::DominantAbove(Band::Alpha, NORMAL_ALPHA_PERCENT),
        kind: IndicatorKind::Normal,
        description: "Healthy resting state with strong alpha rhythm",
    },
    IndicatorRule {
        condition: Condition::Dominant(Band::Theta),
        kind: IndicatorKind::Attention,
        description: "Elevated theta activity may indicate drowsiness or deep concentration",
    },
    IndicatorRule {
        condition: Condition::DominantAbove(Band::Beta, COGNITIVE_BETA_PERCENT),
        kind: IndicatorKind::Cognitive,
        description: "High beta activity suggests active thinking or increased alertness",
    },
    IndicatorRule {
        condition: Condition::Above(Band::Delta, ANOMALY_DELTA_PERCENT),
        kind: IndicatorKind::Anomaly,
        description: "Elevated delta waves during waking state - may warrant further investigation",
    },
    IndicatorRule {
        condition: Condition::Below(Band::Alpha, REDUCED_ALPHA_PERCENT),
        kind: IndicatorKind::Attention,
        description: "Reduced alpha power may indicate heightened alertness or anxiety",
    },
    IndicatorRule {
        condition: Condition::Above(Band::Gamma, NOTABLE_GAMMA_PERCENT),
        kind: IndicatorKind::Cognitive,
        description: "Notable gamma activity associated with complex cognitive processing",
    },
];

/// Evaluates the rule tables in order
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternClassifier;

impl PatternClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn patterns(&self, powers: &BandPowerMap) -> Vec<PatternTag> {
        PATTERN_RULES
            .iter()
            .filter(|rule| rule.condition.holds(powers, None))
            .map(|rule| rule.tag)
            .collect()
    }

    pub fn indicators(&self, powers: &BandPowerMap, dominant: Option<Band>) -> Vec<Indicator> {
        INDICATOR_RULES
            .iter()
            .filter(|rule| rule.condition.holds(powers, dominant))
            .map(|rule| Indicator {
                kind: rule.kind,
                description: rule.description.to_string(),
            })
            .collect()
    }

    pub fn classify(&self, powers: &BandPowerMap, dominant: Option<Band>) -> (Vec<PatternTag>, Vec<Indicator>) {
        (self.patterns(powers), self.indicators(powers, dominant))
    }
}
