//! Camera, animation and timing cues.
//!
//! Camera and base delay come from priority-ordered cue tables evaluated
//! with the same condition trees as narration rules; the highest-priority
//! matching entry wins. Timing modifiers then add on top of the base delay.

use serde::{Deserialize, Serialize};

use crate::core::condition::{Condition, MatchContext, SymbolTable};
use crate::core::registry::{ActionRule, ReactionRule, ScriptedRule};
use crate::schema::channel::Channel;
use crate::schema::condition::ConditionSpec;
use crate::schema::event::{AttackResult, PhysicsClass, RawEvent};
use crate::schema::intent::Intent;

pub const DEFAULT_CAMERA: &str = "cam_default";
pub const DEFAULT_BASE_DELAY: f32 = 1.5;

/// One authored entry of a cue table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Cue")]
pub struct CueRuleDef<T> {
    pub priority: i32,
    #[serde(default)]
    pub when: ConditionSpec,
    pub value: T,
}

impl<T> CueRuleDef<T> {
    fn new(priority: i32, when: ConditionSpec, value: T) -> Self {
        CueRuleDef { priority, when, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimingTrigger {
    Result(AttackResult),
    Channel(Channel),
    /// Output intent of the winning action rule.
    Intent(Intent),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename = "TimingModifier")]
pub struct TimingModifier {
    pub when: TimingTrigger,
    pub add: f32,
}

pub fn default_cameras() -> Vec<CueRuleDef<String>> {
    use crate::schema::condition::ConditionSpec as C;
    let cam = |p: i32, when: ConditionSpec, id: &str| CueRuleDef::new(p, when, id.to_string());
    vec![
        cam(100, C::Channel(Channel::Fatal), "cam_dramatic_zoom"),
        cam(90, C::Result(AttackResult::Crit), "cam_dramatic_zoom"),
        cam(
            85,
            C::all([C::Result(AttackResult::Dodge), C::DistanceBelow(200)]),
            "cam_close_combat_dodge",
        ),
        cam(80, C::DistanceAtLeast(801), "cam_long_shot"),
        cam(75, C::DistanceBelow(100), "cam_close_up"),
        cam(70, C::Result(AttackResult::Dodge), "cam_tracking_evade"),
        cam(60, C::DamageAtLeast(501), "cam_shake_heavy"),
        cam(
            55,
            C::ResultIn(vec![AttackResult::Hit, AttackResult::Block]),
            "cam_shake_light",
        ),
        cam(0, C::Always, DEFAULT_CAMERA),
    ]
}

pub fn default_base_delays() -> Vec<CueRuleDef<f32>> {
    vec![CueRuleDef::new(0, ConditionSpec::Always, DEFAULT_BASE_DELAY)]
}

pub fn default_timing_modifiers() -> Vec<TimingModifier> {
    let m = |when, add| TimingModifier { when, add };
    vec![
        m(TimingTrigger::Result(AttackResult::Crit), 0.5),
        m(TimingTrigger::Channel(Channel::Fatal), 0.4),
        m(TimingTrigger::Intent(Intent::BeamMassive), 0.3),
        m(TimingTrigger::Intent(Intent::AoeBurst), 0.3),
        m(TimingTrigger::Intent(Intent::ProjectileRain), 0.2),
    ]
}

#[derive(Debug, Clone)]
pub struct CueRule<T> {
    pub priority: i32,
    pub condition: Condition,
    pub value: T,
}

/// Priority-ordered cue table. Ties keep declaration order.
#[derive(Debug, Clone)]
pub struct CueTable<T> {
    rules: Vec<CueRule<T>>,
}

impl<T: Clone> CueTable<T> {
    pub fn compile(defs: &[CueRuleDef<T>], symbols: &mut SymbolTable) -> Self {
        let mut rules: Vec<CueRule<T>> = defs
            .iter()
            .map(|d| CueRule {
                priority: d.priority,
                condition: Condition::compile(&d.when, symbols),
                value: d.value.clone(),
            })
            .collect();
        // stable: equal priorities stay in declaration order
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        CueTable { rules }
    }

    pub fn pick(&self, ctx: &MatchContext<'_>) -> Option<&T> {
        self.rules
            .iter()
            .find(|r| r.condition.evaluate(ctx))
            .map(|r| &r.value)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Cue data for one resolved event.
#[derive(Debug, Clone, PartialEq)]
pub struct CueBundle {
    pub camera: String,
    pub action_anim: String,
    pub reaction_anim: String,
    pub effects: Vec<String>,
    pub sounds: Vec<String>,
    pub timing_offset: f32,
    pub damage_display: u32,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    cameras: CueTable<String>,
    base_delays: CueTable<f32>,
    modifiers: Vec<TimingModifier>,
}

impl Dispatcher {
    pub fn compile(
        cameras: &[CueRuleDef<String>],
        base_delays: &[CueRuleDef<f32>],
        modifiers: &[TimingModifier],
        symbols: &mut SymbolTable,
    ) -> Self {
        Dispatcher {
            cameras: CueTable::compile(cameras, symbols),
            base_delays: CueTable::compile(base_delays, symbols),
            modifiers: modifiers.to_vec(),
        }
    }

    pub fn camera(&self, ctx: &MatchContext<'_>) -> String {
        self.cameras
            .pick(ctx)
            .cloned()
            .unwrap_or_else(|| DEFAULT_CAMERA.to_string())
    }

    /// Base delay plus every matching modifier.
    pub fn timing_offset(&self, ctx: &MatchContext<'_>, action_intent: Intent) -> f32 {
        let base = self.base_delays.pick(ctx).copied().unwrap_or(DEFAULT_BASE_DELAY);
        self.modifiers
            .iter()
            .filter(|m| match m.when {
                TimingTrigger::Result(r) => ctx.event.attack_result == r,
                TimingTrigger::Channel(c) => ctx.channel == c,
                TimingTrigger::Intent(i) => action_intent == i,
            })
            .fold(base, |acc, m| acc + m.add)
    }

    pub fn dispatch(
        &self,
        ctx: &MatchContext<'_>,
        action: &ActionRule,
        reaction: &ReactionRule,
    ) -> CueBundle {
        CueBundle {
            camera: self.camera(ctx),
            action_anim: action
                .anim
                .clone()
                .unwrap_or_else(|| default_action_anim(action.intent).to_string()),
            reaction_anim: reaction
                .anim
                .clone()
                .unwrap_or_else(|| default_reaction_anim(ctx.event, ctx.channel).to_string()),
            effects: reaction.effects.clone(),
            sounds: reaction.sounds.clone(),
            timing_offset: self.timing_offset(ctx, action.intent),
            damage_display: damage_display(ctx.event, ctx.channel),
        }
    }

    /// Scripted rules carry no action intent; the weapon's natural intent
    /// stands in for it.
    pub fn dispatch_scripted(&self, ctx: &MatchContext<'_>, rule: &ScriptedRule) -> CueBundle {
        CueBundle {
            camera: rule.camera.clone().unwrap_or_else(|| self.camera(ctx)),
            action_anim: rule
                .anim
                .clone()
                .unwrap_or_else(|| default_action_anim(ctx.intent).to_string()),
            reaction_anim: default_reaction_anim(ctx.event, ctx.channel).to_string(),
            effects: rule.effects.clone(),
            sounds: rule.sounds.clone(),
            timing_offset: self.timing_offset(ctx, ctx.intent),
            damage_display: damage_display(ctx.event, ctx.channel),
        }
    }
}

pub fn default_action_anim(intent: Intent) -> &'static str {
    match intent {
        Intent::SlashLight => "anim_slash_fast",
        Intent::SlashHeavy => "anim_slash_heavy",
        Intent::StrikeBlunt => "anim_strike",
        Intent::BeamInstant => "anim_rifle_shoot",
        Intent::BeamMassive => "anim_mega_beam",
        Intent::ProjectileSingle => "anim_shoot_single",
        Intent::ProjectileRain => "anim_missile_rain",
        Intent::ImpactMassive => "anim_collision",
        Intent::PsychoWave => "anim_psycho",
        Intent::AoeBurst => "anim_aoe_burst",
    }
}

pub fn default_reaction_anim(event: &RawEvent, channel: Channel) -> &'static str {
    if channel == Channel::Fatal {
        return "anim_explosion_fatal";
    }
    if channel == Channel::Evade || !event.attack_result.connects() {
        return "anim_evade";
    }
    match event.attack_result {
        AttackResult::Block => "anim_block",
        AttackResult::Crit => "anim_hit_critical",
        _ => match event.physics_class {
            PhysicsClass::Energy => "anim_hit_energy",
            PhysicsClass::Kinetic => "anim_hit_kinetic",
            PhysicsClass::Blade => "anim_hit_blade",
            PhysicsClass::Impact => "anim_hit_impact",
        },
    }
}

/// Damage shown to the player: nothing for evasions.
pub fn damage_display(event: &RawEvent, channel: Channel) -> u32 {
    if channel == Channel::Evade || !event.attack_result.connects() {
        0
    } else {
        event.damage
    }
}
