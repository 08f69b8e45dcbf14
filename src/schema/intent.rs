use serde::{Deserialize, Serialize};
use std::fmt;

use super::event::WeaponType;

/// Physical-interaction category. An action rule produces exactly one;
/// a reaction rule accepts a set of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    SlashLight,
    SlashHeavy,
    StrikeBlunt,
    BeamInstant,
    BeamMassive,
    ProjectileSingle,
    ProjectileRain,
    ImpactMassive,
    PsychoWave,
    AoeBurst,
}

impl Intent {
    pub const ALL: [Intent; 10] = [
        Intent::SlashLight,
        Intent::SlashHeavy,
        Intent::StrikeBlunt,
        Intent::BeamInstant,
        Intent::BeamMassive,
        Intent::ProjectileSingle,
        Intent::ProjectileRain,
        Intent::ImpactMassive,
        Intent::PsychoWave,
        Intent::AoeBurst,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SlashLight => "SLASH_LIGHT",
            Self::SlashHeavy => "SLASH_HEAVY",
            Self::StrikeBlunt => "STRIKE_BLUNT",
            Self::BeamInstant => "BEAM_INSTANT",
            Self::BeamMassive => "BEAM_MASSIVE",
            Self::ProjectileSingle => "PROJECTILE_SINGLE",
            Self::ProjectileRain => "PROJECTILE_RAIN",
            Self::ImpactMassive => "IMPACT_MASSIVE",
            Self::PsychoWave => "PSYCHO_WAVE",
            Self::AoeBurst => "AOE_BURST",
        }
    }

    /// The intent a weapon naturally carries, derived from its type and tags.
    ///
    /// Psycho/funnel and map/aoe tags override the weapon type entirely.
    pub fn natural(weapon_type: WeaponType, weapon_tags: &[String]) -> Intent {
        let tags: Vec<String> = weapon_tags.iter().map(|t| t.to_lowercase()).collect();
        let has = |t: &str| tags.iter().any(|tag| tag == t);
        let has_any = |list: &[&str]| list.iter().any(|t| has(t));

        if has_any(&["psycho", "funnel"]) {
            return Intent::PsychoWave;
        }
        if has_any(&["map", "aoe"]) {
            return Intent::AoeBurst;
        }

        match weapon_type {
            WeaponType::Melee => {
                if has_any(&["heavy", "axe", "greatsword"]) {
                    Intent::SlashHeavy
                } else if has_any(&["blunt", "hammer", "punch", "kick"]) {
                    Intent::StrikeBlunt
                } else {
                    Intent::SlashLight
                }
            }
            WeaponType::Rifle => {
                if has("beam") {
                    if has_any(&["massive", "mega"]) {
                        Intent::BeamMassive
                    } else {
                        Intent::BeamInstant
                    }
                } else if has_any(&["missile", "gatling", "vulcan", "rapid"]) {
                    Intent::ProjectileRain
                } else {
                    Intent::ProjectileSingle
                }
            }
            WeaponType::Heavy if has("beam") => Intent::BeamMassive,
            WeaponType::Heavy => Intent::ImpactMassive,
            WeaponType::Awakening => Intent::PsychoWave,
            WeaponType::Special => Intent::AoeBurst,
            WeaponType::Fallback => Intent::ImpactMassive,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of intents a reaction rule can respond to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntentSet {
    /// Wildcard: responds to any action.
    #[default]
    Any,
    Only(Vec<Intent>),
}

impl IntentSet {
    pub fn accepts(&self, intent: Intent) -> bool {
        match self {
            IntentSet::Any => true,
            IntentSet::Only(list) => list.contains(&intent),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, IntentSet::Any)
    }
}
