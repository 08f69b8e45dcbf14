use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse outcome category of a resolved attack. Computed once per event
/// by the outcome router and never recomputed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Fatal,
    Special,
    Evade,
    Impact,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Fatal,
        Channel::Special,
        Channel::Evade,
        Channel::Impact,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Special => "SPECIAL",
            Self::Evade => "EVADE",
            Self::Impact => "IMPACT",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Priority level of a rule. `T0` beats everything; the waterfall only
/// ever walks `T1..=T3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "T0_SCRIPTED", alias = "T0")]
    T0,
    #[serde(rename = "T1_HIGHLIGHT", alias = "T1")]
    T1,
    #[serde(rename = "T2_TACTICAL", alias = "T2")]
    T2,
    #[serde(rename = "T3_FALLBACK", alias = "T3")]
    T3,
}

impl Tier {
    /// Waterfall scan order, highest priority first.
    pub const WATERFALL: [Tier; 3] = [Tier::T1, Tier::T2, Tier::T3];

    /// Index into per-tier tables for the waterfall tiers. `T0` has no slot.
    pub(crate) fn slot(&self) -> Option<usize> {
        match self {
            Self::T0 => None,
            Self::T1 => Some(0),
            Self::T2 => Some(1),
            Self::T3 => Some(2),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::T0 => "T0_SCRIPTED",
            Self::T1 => "T1_HIGHLIGHT",
            Self::T2 => "T2_TACTICAL",
            Self::T3 => "T3_FALLBACK",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
