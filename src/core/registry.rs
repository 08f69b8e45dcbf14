//! The compiled, immutable rule registry.
//!
//! Built once from a `RuleSet` and a `PresentationConfig`; afterwards it is
//! only read, so one registry can serve any number of concurrent
//! resolutions.

use rustc_hash::FxHashMap;
use std::fmt;
use tracing::{info, warn};

use crate::core::assembler::LabelTable;
use crate::core::condition::{Condition, MatchContext, SymbolTable};
use crate::core::dispatcher::Dispatcher;
use crate::core::location::LocationTable;
use crate::core::router::route;
use crate::core::ruleset::{PresentationConfig, RuleError, RuleSet};
use crate::core::template::Template;
use crate::core::waterfall::{action_candidates, reaction_candidates, Side};
use crate::schema::channel::{Channel, Tier};
use crate::schema::event::{AttackResult, PhysicsClass, RawEvent, WeaponType};
use crate::schema::intent::{Intent, IntentSet};
use crate::schema::rule::{ActionRuleDef, ReactionRuleDef, ScriptedRuleDef};

/// The shared shape of action and reaction rules, as seen by the waterfall
/// and the bidder.
pub trait TieredRule {
    fn id(&self) -> &str;
    fn tier(&self) -> Tier;
    fn condition(&self) -> &Condition;
    fn weight(&self) -> u32;

    /// Channel gate. Only reaction rules restrict it.
    fn applies_to(&self, _channel: Channel) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct ActionRule {
    pub id: String,
    pub tier: Tier,
    pub condition: Condition,
    pub physics: Option<PhysicsClass>,
    pub fragments: Vec<Template>,
    pub intent: Intent,
    pub anim: Option<String>,
    pub weight: u32,
}

#[derive(Debug, Clone)]
pub struct ReactionRule {
    pub id: String,
    pub tier: Tier,
    pub condition: Condition,
    pub physics: Option<PhysicsClass>,
    pub fragments: Vec<Template>,
    pub accepts: IntentSet,
    pub channels: Vec<Channel>,
    pub effects: Vec<String>,
    pub sounds: Vec<String>,
    pub anim: Option<String>,
    pub location: Option<String>,
    pub weight: u32,
}

#[derive(Debug, Clone)]
pub struct ScriptedRule {
    pub id: String,
    pub condition: Condition,
    pub action: Vec<Template>,
    pub reaction: Vec<Template>,
    pub camera: Option<String>,
    pub anim: Option<String>,
    pub effects: Vec<String>,
    pub sounds: Vec<String>,
    pub location: Option<String>,
}

impl TieredRule for ActionRule {
    fn id(&self) -> &str {
        &self.id
    }
    fn tier(&self) -> Tier {
        self.tier
    }
    fn condition(&self) -> &Condition {
        &self.condition
    }
    fn weight(&self) -> u32 {
        self.weight
    }
}

impl TieredRule for ReactionRule {
    fn id(&self) -> &str {
        &self.id
    }
    fn tier(&self) -> Tier {
        self.tier
    }
    fn condition(&self) -> &Condition {
        &self.condition
    }
    fn weight(&self) -> u32 {
        self.weight
    }
    fn applies_to(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }
}

/// Reaction rules of one tier, indexed by the intents they accept.
/// Positions refer to the tier's declaration-ordered rule list.
#[derive(Debug, Clone, Default)]
struct IntentIndex {
    by_intent: FxHashMap<Intent, Vec<usize>>,
    wildcard: Vec<usize>,
}

impl IntentIndex {
    fn build(rules: &[ReactionRule]) -> Self {
        let mut index = IntentIndex::default();
        for (pos, rule) in rules.iter().enumerate() {
            match &rule.accepts {
                IntentSet::Any => index.wildcard.push(pos),
                IntentSet::Only(intents) => {
                    for intent in intents {
                        let slots = index.by_intent.entry(*intent).or_default();
                        if slots.last() != Some(&pos) {
                            slots.push(pos);
                        }
                    }
                }
            }
        }
        index
    }

    /// Positions of rules accepting `intent`, in declaration order.
    fn accepting(&self, intent: Intent) -> Vec<usize> {
        let mut positions = self.wildcard.clone();
        if let Some(specific) = self.by_intent.get(&intent) {
            positions.extend_from_slice(specific);
        }
        positions.sort_unstable();
        positions
    }
}

/// A side/channel the authored content leaves without a guaranteed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackGap {
    pub side: Side,
    /// `None` for the action side, which is not channel-gated.
    pub channel: Option<Channel>,
}

impl fmt::Display for FallbackGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.channel {
            Some(channel) => write!(
                f,
                "no unconditional wildcard T3 {} rule for channel {}",
                self.side, channel
            ),
            None => write!(f, "no unconditional T3 {} rule", self.side),
        }
    }
}

/// A probed event shape for which a waterfall came up empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    pub side: Side,
    pub channel: Channel,
    pub weapon_type: WeaponType,
    pub result: AttackResult,
    pub physics: PhysicsClass,
    pub lethal: bool,
    pub counter: bool,
    /// The action intent being answered, for reaction-side gaps.
    pub intent: Option<Intent>,
}

impl fmt::Display for CoverageGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} side empty for {} / {} / {:?} (channel {}{}{})",
            self.side,
            self.weapon_type,
            self.result,
            self.physics,
            self.channel,
            if self.lethal { ", lethal" } else { "" },
            if self.counter { ", counter" } else { "" },
        )?;
        if let Some(intent) = self.intent {
            write!(f, " answering {}", intent)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RuleRegistry {
    symbols: SymbolTable,
    actions: [Vec<ActionRule>; 3],
    reactions: [Vec<ReactionRule>; 3],
    reaction_index: [IntentIndex; 3],
    scripted: Vec<ScriptedRule>,
    dispatcher: Dispatcher,
    locations: LocationTable,
    labels: LabelTable,
}

impl RuleRegistry {
    /// Validate and compile authored rules into an immutable registry.
    pub fn compile(rules: RuleSet, presentation: PresentationConfig) -> Result<Self, RuleError> {
        let mut symbols = SymbolTable::new();
        let mut actions: [Vec<ActionRule>; 3] = Default::default();
        let mut reactions: [Vec<ReactionRule>; 3] = Default::default();

        for def in rules.actions {
            let rule = compile_action(def, &mut symbols)?;
            if let Some(slot) = rule.tier.slot() {
                actions[slot].push(rule);
            }
        }
        for def in rules.reactions {
            let rule = compile_reaction(def, &mut symbols)?;
            if rule.location.is_some() && rule.tier != Tier::T1 {
                warn!(rule = %rule.id, tier = %rule.tier, "location override ignored outside T1");
            }
            if let Some(slot) = rule.tier.slot() {
                reactions[slot].push(rule);
            }
        }
        let scripted = rules
            .scripted
            .into_iter()
            .map(|def| compile_scripted(def, &mut symbols))
            .collect::<Result<Vec<_>, _>>()?;

        let reaction_index = [
            IntentIndex::build(&reactions[0]),
            IntentIndex::build(&reactions[1]),
            IntentIndex::build(&reactions[2]),
        ];

        let dispatcher = Dispatcher::compile(
            &presentation.cameras,
            &presentation.base_delays,
            &presentation.timing_modifiers,
            &mut symbols,
        );

        let registry = RuleRegistry {
            symbols,
            actions,
            reactions,
            reaction_index,
            scripted,
            dispatcher,
            locations: presentation.locations,
            labels: LabelTable::new(presentation.labels),
        };

        info!(
            actions = registry.action_count(),
            reactions = registry.reaction_count(),
            scripted = registry.scripted.len(),
            symbols = registry.symbols.len(),
            "rule registry compiled"
        );
        for gap in registry.static_fallback_gaps() {
            warn!(%gap, "fallback coverage gap");
        }
        for gap in registry.coverage_gaps() {
            warn!(%gap, "probed coverage gap");
        }

        Ok(registry)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn locations(&self) -> &LocationTable {
        &self.locations
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Action rules of a tier, in declaration order. Empty for `T0`.
    pub fn actions(&self, tier: Tier) -> &[ActionRule] {
        match tier.slot() {
            Some(slot) => &self.actions[slot],
            None => &[],
        }
    }

    /// Reaction rules of a tier, in declaration order. Empty for `T0`.
    pub fn reactions(&self, tier: Tier) -> &[ReactionRule] {
        match tier.slot() {
            Some(slot) => &self.reactions[slot],
            None => &[],
        }
    }

    /// Reaction rules of a tier that accept `intent`, in declaration order.
    pub fn reactions_accepting(
        &self,
        tier: Tier,
        intent: Intent,
    ) -> impl Iterator<Item = &ReactionRule> + '_ {
        let (rules, positions) = match tier.slot() {
            Some(slot) => (
                self.reactions[slot].as_slice(),
                self.reaction_index[slot].accepting(intent),
            ),
            None => (&[] as &[ReactionRule], Vec::new()),
        };
        positions.into_iter().filter_map(move |pos| rules.get(pos))
    }

    /// `T0` rules, in declaration order.
    pub fn scripted(&self) -> &[ScriptedRule] {
        &self.scripted
    }

    pub fn action(&self, id: &str) -> Option<&ActionRule> {
        self.actions.iter().flatten().find(|r| r.id == id)
    }

    pub fn reaction(&self, id: &str) -> Option<&ReactionRule> {
        self.reactions.iter().flatten().find(|r| r.id == id)
    }

    pub fn action_count(&self) -> usize {
        self.actions.iter().map(Vec::len).sum()
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions.iter().map(Vec::len).sum()
    }

    /// Sides and channels lacking an unconditional, wildcard `T3` rule.
    pub fn static_fallback_gaps(&self) -> Vec<FallbackGap> {
        let mut gaps = Vec::new();
        if !self.actions(Tier::T3).iter().any(|r| r.condition.is_always()) {
            gaps.push(FallbackGap {
                side: Side::Action,
                channel: None,
            });
        }
        for channel in Channel::ALL {
            let covered = self.reactions(Tier::T3).iter().any(|r| {
                r.condition.is_always() && r.accepts.is_wildcard() && r.applies_to(channel)
            });
            if !covered {
                gaps.push(FallbackGap {
                    side: Side::Reaction,
                    channel: Some(channel),
                });
            }
        }
        gaps
    }

    /// Push a synthetic event for every weapon type, result, physics class,
    /// lethality and counter flag through the router and both waterfalls.
    /// Every action candidate's intent is probed on the reaction side.
    pub fn coverage_gaps(&self) -> Vec<CoverageGap> {
        let mut gaps = Vec::new();
        for weapon_type in WeaponType::ALL {
            for result in AttackResult::ALL {
                for physics in PhysicsClass::ALL {
                    for lethal in [false, true] {
                        for counter in [false, true] {
                            let event = probe_event(weapon_type, result, physics, lethal, counter);
                            self.probe(&event, &mut gaps);
                        }
                    }
                }
            }
        }
        gaps
    }

    fn probe(&self, event: &RawEvent, gaps: &mut Vec<CoverageGap>) {
        let channel = route(event);
        let ctx = MatchContext::new(event, channel, &self.symbols);
        let gap = |side, intent| CoverageGap {
            side,
            channel,
            weapon_type: event.weapon_type,
            result: event.attack_result,
            physics: event.physics_class,
            lethal: event.is_lethal,
            counter: event.is_counter,
            intent,
        };

        let actions = match action_candidates(self, &ctx) {
            Ok(found) => found,
            Err(_) => {
                gaps.push(gap(Side::Action, None));
                return;
            }
        };
        let mut intents: Vec<Intent> = actions.rules.iter().map(|r| r.intent).collect();
        intents.sort_unstable();
        intents.dedup();
        for intent in intents {
            if reaction_candidates(self, &ctx, intent).is_err() {
                gaps.push(gap(Side::Reaction, Some(intent)));
            }
        }
    }
}

fn probe_event(
    weapon_type: WeaponType,
    result: AttackResult,
    physics: PhysicsClass,
    lethal: bool,
    counter: bool,
) -> RawEvent {
    RawEvent {
        round_number: 1,
        attacker_name: "Attacker".to_string(),
        defender_name: "Defender".to_string(),
        weapon_name: "Weapon".to_string(),
        weapon_type,
        physics_class: physics,
        attack_result: result,
        damage: 1000,
        distance: 400,
        is_lethal: lethal,
        is_counter: counter,
        ..Default::default()
    }
}

fn compile_fragments(rule_id: &str, fragments: &[String]) -> Result<Vec<Template>, RuleError> {
    fragments
        .iter()
        .enumerate()
        .map(|(index, text)| {
            Template::parse(text).map_err(|source| RuleError::Template {
                rule_id: rule_id.to_string(),
                index,
                source,
            })
        })
        .collect()
}

fn check_common(id: &str, tier: Tier, weight: u32, fragments: &[String]) -> Result<(), RuleError> {
    if tier == Tier::T0 {
        return Err(RuleError::ScriptedTier {
            rule_id: id.to_string(),
        });
    }
    if weight == 0 {
        return Err(RuleError::ZeroWeight {
            rule_id: id.to_string(),
        });
    }
    if fragments.is_empty() {
        return Err(RuleError::EmptyFragments {
            rule_id: id.to_string(),
        });
    }
    Ok(())
}

fn compile_action(def: ActionRuleDef, symbols: &mut SymbolTable) -> Result<ActionRule, RuleError> {
    check_common(&def.id, def.tier, def.weight, &def.fragments)?;
    Ok(ActionRule {
        fragments: compile_fragments(&def.id, &def.fragments)?,
        condition: Condition::compile(&def.when, symbols),
        id: def.id,
        tier: def.tier,
        physics: def.physics,
        intent: def.intent,
        anim: def.anim,
        weight: def.weight,
    })
}

fn compile_reaction(
    def: ReactionRuleDef,
    symbols: &mut SymbolTable,
) -> Result<ReactionRule, RuleError> {
    check_common(&def.id, def.tier, def.weight, &def.fragments)?;
    if def.channels.is_empty() {
        return Err(RuleError::EmptyChannels { rule_id: def.id });
    }
    Ok(ReactionRule {
        fragments: compile_fragments(&def.id, &def.fragments)?,
        condition: Condition::compile(&def.when, symbols),
        id: def.id,
        tier: def.tier,
        physics: def.physics,
        accepts: def.accepts,
        channels: def.channels,
        effects: def.effects,
        sounds: def.sounds,
        anim: def.anim,
        location: def.location,
        weight: def.weight,
    })
}

fn compile_scripted(
    def: ScriptedRuleDef,
    symbols: &mut SymbolTable,
) -> Result<ScriptedRule, RuleError> {
    if def.action.is_empty() || def.reaction.is_empty() {
        return Err(RuleError::EmptyFragments { rule_id: def.id });
    }
    Ok(ScriptedRule {
        action: compile_fragments(&def.id, &def.action)?,
        reaction: compile_fragments(&def.id, &def.reaction)?,
        condition: Condition::compile(&def.when, symbols),
        id: def.id,
        camera: def.camera,
        anim: def.anim,
        effects: def.effects,
        sounds: def.sounds,
        location: def.location,
    })
}
