use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The resolved outcome of an attack roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackResult {
    #[default]
    Hit,
    Miss,
    Crit,
    Dodge,
    Parry,
    Block,
}

impl AttackResult {
    pub const ALL: [AttackResult; 6] = [
        AttackResult::Hit,
        AttackResult::Miss,
        AttackResult::Crit,
        AttackResult::Dodge,
        AttackResult::Parry,
        AttackResult::Block,
    ];

    /// True when the attack physically reached the defender.
    pub fn connects(&self) -> bool {
        matches!(self, Self::Hit | Self::Crit | Self::Block)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Crit => "CRIT",
            Self::Dodge => "DODGE",
            Self::Parry => "PARRY",
            Self::Block => "BLOCK",
        }
    }

    /// Prose label used by the `{result}` template variable.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Crit => "critical hit",
            Self::Dodge => "dodge",
            Self::Parry => "parry",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for AttackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Broad weapon category as reported by the combat layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponType {
    Melee,
    #[serde(alias = "SHOOTING")]
    Rifle,
    Heavy,
    Awakening,
    Special,
    #[default]
    Fallback,
}

impl WeaponType {
    pub const ALL: [WeaponType; 6] = [
        WeaponType::Melee,
        WeaponType::Rifle,
        WeaponType::Heavy,
        WeaponType::Awakening,
        WeaponType::Special,
        WeaponType::Fallback,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Melee => "MELEE",
            Self::Rifle => "RIFLE",
            Self::Heavy => "HEAVY",
            Self::Awakening => "AWAKENING",
            Self::Special => "SPECIAL",
            Self::Fallback => "FALLBACK",
        }
    }
}

impl fmt::Display for WeaponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical nature of a weapon or effect. A soft compatibility signal
/// between the action and reaction selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhysicsClass {
    Energy,
    Kinetic,
    Blade,
    #[default]
    Impact,
}

const ENERGY_KEYWORDS: &[&str] = &["beam", "energy", "particle", "laser"];
const BLADE_KEYWORDS: &[&str] = &["slash", "blade", "saber", "sword", "axe", "knife"];
const KINETIC_KEYWORDS: &[&str] = &["missile", "projectile", "shell", "bullet", "rocket"];

impl PhysicsClass {
    pub const ALL: [PhysicsClass; 4] = [
        PhysicsClass::Energy,
        PhysicsClass::Kinetic,
        PhysicsClass::Blade,
        PhysicsClass::Impact,
    ];

    /// Classify a weapon from its tags, falling back to keywords in its name.
    ///
    /// Energy wins over blade (a beam saber is an energy weapon), blade wins
    /// over kinetic. Anything unrecognised is `Impact`.
    pub fn classify(weapon_tags: &[String], weapon_name: &str) -> PhysicsClass {
        let tags: Vec<String> = weapon_tags.iter().map(|t| t.to_lowercase()).collect();
        let has_any = |keywords: &[&str]| tags.iter().any(|t| keywords.contains(&t.as_str()));

        if has_any(ENERGY_KEYWORDS) {
            return PhysicsClass::Energy;
        }
        if has_any(BLADE_KEYWORDS) {
            return PhysicsClass::Blade;
        }
        if has_any(KINETIC_KEYWORDS) {
            return PhysicsClass::Kinetic;
        }

        let name = weapon_name.to_lowercase();
        let name_has = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));
        if name_has(ENERGY_KEYWORDS) {
            PhysicsClass::Energy
        } else if name_has(BLADE_KEYWORDS) {
            PhysicsClass::Blade
        } else if name_has(KINETIC_KEYWORDS) {
            PhysicsClass::Kinetic
        } else {
            PhysicsClass::Impact
        }
    }
}

/// Defender condition after the attack, from remaining HP and the share of
/// max HP this hit took. The more severe of the two readings wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HpStatus {
    Lethal,
    Critical,
    Moderate,
    Light,
}

impl HpStatus {
    pub const ALL: [HpStatus; 4] = [
        HpStatus::Lethal,
        HpStatus::Critical,
        HpStatus::Moderate,
        HpStatus::Light,
    ];

    /// `None` without a positive max HP.
    ///
    /// - LETHAL: no HP left
    /// - CRITICAL: under 30% left, or the hit took over 50%
    /// - MODERATE: at most 70% left, or the hit took over 25%
    /// - LIGHT: otherwise
    pub fn classify(hp_after: u32, max_hp: u32, damage: u32) -> Option<HpStatus> {
        if max_hp == 0 {
            return None;
        }
        if hp_after == 0 {
            return Some(HpStatus::Lethal);
        }
        let hp_ratio = f64::from(hp_after) / f64::from(max_hp);
        let damage_ratio = f64::from(damage) / f64::from(max_hp);
        Some(if damage_ratio > 0.5 || hp_ratio < 0.3 {
            HpStatus::Critical
        } else if damage_ratio > 0.25 || hp_ratio <= 0.7 {
            HpStatus::Moderate
        } else {
            HpStatus::Light
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lethal => "LETHAL",
            Self::Critical => "CRITICAL",
            Self::Moderate => "MODERATE",
            Self::Light => "LIGHT",
        }
    }
}

impl fmt::Display for HpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully resolved attack, produced by the combat-resolution layer.
/// This is the sole input to the presentation pipeline and is never
/// mutated by it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEvent {
    pub round_number: u32,
    pub attacker_id: String,
    pub defender_id: String,
    pub attacker_name: String,
    pub defender_name: String,
    pub weapon_id: String,
    pub weapon_name: String,
    pub weapon_type: WeaponType,
    pub weapon_tags: Vec<String>,
    pub physics_class: PhysicsClass,
    pub attack_result: AttackResult,
    pub damage: u32,
    pub distance: u32,
    /// Precomputed by the combat layer: the defender does not survive.
    pub is_lethal: bool,
    pub is_counter: bool,
    pub is_support: bool,
    /// Ordered; the first entry is the one named by `{highlight}`.
    pub triggered_skills: Vec<String>,
    /// Ordered; the first entry is the one named by `{highlight}`.
    pub spirit_commands: Vec<String>,
    pub context_tags: FxHashSet<String>,
    pub defender_max_hp: Option<u32>,
    pub defender_hp_after: Option<u32>,
}

impl RawEvent {
    /// Returns true if the event carries the given context tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.context_tags.contains(tag)
    }

    /// The defender's condition, when both HP figures are known.
    pub fn hp_status(&self) -> Option<HpStatus> {
        HpStatus::classify(self.defender_hp_after?, self.defender_max_hp?, self.damage)
    }
}
