use serde::{Deserialize, Serialize};

use super::channel::{Channel, Tier};
use super::condition::ConditionSpec;
use super::event::PhysicsClass;
use super::intent::{Intent, IntentSet};

fn default_weight() -> u32 {
    1
}

/// Attacker-side narration rule as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ActionRule")]
pub struct ActionRuleDef {
    pub id: String,
    pub tier: Tier,
    #[serde(default)]
    pub when: ConditionSpec,
    #[serde(default)]
    pub physics: Option<PhysicsClass>,
    pub fragments: Vec<String>,
    /// The one intent this rule hands to the reaction side.
    pub intent: Intent,
    #[serde(default)]
    pub anim: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

/// Defender-side narration rule as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ReactionRule")]
pub struct ReactionRuleDef {
    pub id: String,
    pub tier: Tier,
    #[serde(default)]
    pub when: ConditionSpec,
    /// Undeclared physics never takes part in affinity.
    #[serde(default)]
    pub physics: Option<PhysicsClass>,
    pub fragments: Vec<String>,
    #[serde(default)]
    pub accepts: IntentSet,
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub effects: Vec<String>,
    #[serde(default)]
    pub sounds: Vec<String>,
    #[serde(default)]
    pub anim: Option<String>,
    /// Dedicated hit location. Only honoured on `T1` rules.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

/// A forced, self-contained `T0` rule. When its condition holds it supplies
/// both the action and the reaction text itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ScriptedRule")]
pub struct ScriptedRuleDef {
    pub id: String,
    pub when: ConditionSpec,
    pub action: Vec<String>,
    pub reaction: Vec<String>,
    #[serde(default)]
    pub camera: Option<String>,
    #[serde(default)]
    pub anim: Option<String>,
    #[serde(default)]
    pub effects: Vec<String>,
    #[serde(default)]
    pub sounds: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ScriptedRuleDef {
    /// A forced template for one battle moment: a specific round and pairing.
    pub fn for_moment(
        id: &str,
        round: u32,
        attacker_id: &str,
        defender_id: &str,
        action: &str,
        reaction: &str,
    ) -> Self {
        ScriptedRuleDef {
            id: id.to_string(),
            when: ConditionSpec::all([
                ConditionSpec::Round(round),
                ConditionSpec::Attacker(attacker_id.to_string()),
                ConditionSpec::Defender(defender_id.to_string()),
            ]),
            action: vec![action.to_string()],
            reaction: vec![reaction.to_string()],
            camera: None,
            anim: None,
            effects: Vec::new(),
            sounds: Vec::new(),
            location: None,
        }
    }
}
