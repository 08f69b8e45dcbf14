use serde::{Deserialize, Serialize};
use std::fmt;

use super::channel::{Channel, Tier};

/// Everything the caller needs to show one resolved attack: prose plus
/// media cues. Created fresh per resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationEvent {
    pub round_number: u32,
    pub channel: Channel,
    /// `action_text` followed by `reaction_text`.
    pub narration: String,
    pub action_text: String,
    pub reaction_text: String,
    /// `None` when no location applies (evasions).
    pub location: Option<String>,
    pub camera: String,
    pub action_anim: String,
    pub reaction_anim: String,
    pub effects: Vec<String>,
    pub sounds: Vec<String>,
    /// Delay before the reaction plays, in seconds.
    pub timing_offset: f32,
    pub damage_display: u32,
    pub action_rule: String,
    pub reaction_rule: String,
    pub action_tier: Tier,
    pub reaction_tier: Tier,
    pub scripted: bool,
}

impl fmt::Display for PresentationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[R{}][{}] {}", self.round_number, self.channel, self.narration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_line() {
        let event = PresentationEvent {
            round_number: 4,
            channel: Channel::Evade,
            narration: "Zaku fires. Gundam sidesteps.".to_string(),
            action_text: "Zaku fires.".to_string(),
            reaction_text: "Gundam sidesteps.".to_string(),
            location: None,
            camera: "cam_tracking_evade".to_string(),
            action_anim: "anim_shoot_single".to_string(),
            reaction_anim: "anim_evade".to_string(),
            effects: Vec::new(),
            sounds: Vec::new(),
            timing_offset: 1.5,
            damage_display: 0,
            action_rule: "machine_gun".to_string(),
            reaction_rule: "evade_generic".to_string(),
            action_tier: Tier::T2,
            reaction_tier: Tier::T3,
            scripted: false,
        };
        assert_eq!(event.to_string(), "[R4][EVADE] Zaku fires. Gundam sidesteps.");
    }
}
