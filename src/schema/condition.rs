use serde::{Deserialize, Serialize};

use super::channel::Channel;
use super::event::{AttackResult, HpStatus, PhysicsClass, WeaponType};
use super::intent::Intent;

/// Authored form of a rule predicate, as it appears in RON.
///
/// Open-ended keys (tags, skills, spirit commands, weapon ids and tags,
/// unit ids) are plain strings here; they are interned when the registry
/// compiles the tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ConditionSpec {
    #[default]
    Always,
    All(Vec<ConditionSpec>),
    Any(Vec<ConditionSpec>),
    Not(Box<ConditionSpec>),
    /// Context tag present on the event.
    Tag(String),
    Skill(String),
    SpiritCommand(String),
    Result(AttackResult),
    ResultIn(Vec<AttackResult>),
    WeaponType(WeaponType),
    WeaponId(String),
    /// Case-insensitive.
    WeaponTag(String),
    Physics(PhysicsClass),
    /// The weapon's natural intent.
    Intent(Intent),
    Channel(Channel),
    Lethal,
    Counter,
    Support,
    DamageAtLeast(u32),
    DamageBelow(u32),
    /// Defender condition after the hit. Never holds without HP figures.
    HpStatus(HpStatus),
    DistanceAtLeast(u32),
    DistanceBelow(u32),
    Round(u32),
    Attacker(String),
    Defender(String),
}

impl ConditionSpec {
    pub fn all(conditions: impl IntoIterator<Item = ConditionSpec>) -> Self {
        ConditionSpec::All(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = ConditionSpec>) -> Self {
        ConditionSpec::Any(conditions.into_iter().collect())
    }

    pub fn not(condition: ConditionSpec) -> Self {
        ConditionSpec::Not(Box::new(condition))
    }
}
