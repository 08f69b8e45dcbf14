//! WASM bindings for combat-presentation, powering the interactive web demo.

use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

use combat_presentation::core::pipeline::PresentationEngine;
use combat_presentation::core::ruleset::{PresentationConfig, RuleSet};
use combat_presentation::schema::event::{AttackResult, PhysicsClass, RawEvent, WeaponType};

// ---------------------------------------------------------------------------
// Embedded rule pack, compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const MECHA_ACTIONS: &str = include_str!("../../rule_data/mecha/actions.ron");
    pub const MECHA_REACTIONS: &str = include_str!("../../rule_data/mecha/reactions.ron");
    pub const MECHA_SCRIPTED: &str = include_str!("../../rule_data/mecha/scripted.ron");
    pub const MECHA_PRESENTATION: &str =
        include_str!("../../rule_data/mecha/presentation.ron");
}

fn build_engine() -> Result<PresentationEngine, JsError> {
    let mut rules = RuleSet::default();
    for src in [data::MECHA_ACTIONS, data::MECHA_REACTIONS, data::MECHA_SCRIPTED] {
        let set = RuleSet::parse_ron(src)
            .map_err(|e| JsError::new(&format!("Rule parse error: {e}")))?;
        rules.merge(set);
    }
    let presentation = PresentationConfig::parse_ron(data::MECHA_PRESENTATION)
        .map_err(|e| JsError::new(&format!("Presentation parse error: {e}")))?;

    PresentationEngine::builder()
        .with_rules(rules)
        .with_presentation(presentation)
        .build()
        .map_err(|e| JsError::new(&format!("Engine build error: {e}")))
}

/// Parse an event from JSON. Without a `physics_class` field the class is
/// classified from the weapon tags and name.
fn parse_event(event_json: &str) -> Result<RawEvent, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(event_json)?;
    let classify = value.get("physics_class").is_none();
    let mut event: RawEvent = serde_json::from_value(value)?;
    if classify {
        event.physics_class = PhysicsClass::classify(&event.weapon_tags, &event.weapon_name);
    }
    Ok(event)
}

// ---------------------------------------------------------------------------
// PresentationDemo, the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct PresentationDemo {
    engine: PresentationEngine,
    rng: StdRng,
    seed: u64,
}

#[wasm_bindgen]
impl PresentationDemo {
    /// Create a new demo instance backed by the embedded mecha pack.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<PresentationDemo, JsError> {
        Ok(PresentationDemo {
            engine: build_engine()?,
            rng: StdRng::seed_from_u64(seed),
            seed,
        })
    }

    /// Resolve one raw combat event given as JSON. Returns the presentation
    /// event as JSON.
    ///
    /// Expected JSON shape (missing fields take their defaults, except
    /// `physics_class`, which is classified from the weapon when absent):
    /// ```json
    /// {
    ///   "round_number": 1,
    ///   "attacker_name": "Gundam",
    ///   "defender_name": "Zaku II",
    ///   "weapon_name": "Beam Rifle",
    ///   "weapon_type": "RIFLE",
    ///   "attack_result": "CRIT",
    ///   "damage": 2400,
    ///   "defender_max_hp": 8000,
    ///   "defender_hp_after": 1500,
    ///   "context_tags": ["TAG_LOC_HEAD"]
    /// }
    /// ```
    pub fn narrate(&mut self, event_json: &str) -> Result<String, JsError> {
        let event = parse_event(event_json)
            .map_err(|e| JsError::new(&format!("Invalid event JSON: {e}")))?;
        let out = self
            .engine
            .resolve(&event, &mut self.rng)
            .map_err(|e| JsError::new(&format!("Resolution error: {e}")))?;
        serde_json::to_string(&out)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Resolve the same event `count` times. Returns a JSON array of
    /// presentation events.
    pub fn narrate_variants(&self, event_json: &str, count: usize) -> Result<String, JsError> {
        let event = parse_event(event_json)
            .map_err(|e| JsError::new(&format!("Invalid event JSON: {e}")))?;
        let variants = self
            .engine
            .resolve_variants(&event, count, self.seed)
            .map_err(|e| JsError::new(&format!("Resolution error: {e}")))?;
        serde_json::to_string(&variants)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Return JSON array of weapon type names.
    pub fn weapon_types() -> String {
        let names: Vec<&str> = WeaponType::ALL.iter().map(|w| w.name()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }

    /// Return JSON array of attack result names.
    pub fn attack_results() -> String {
        let names: Vec<&str> = AttackResult::ALL.iter().map(|r| r.name()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }

    /// Restart the random stream from a new seed.
    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }
}
