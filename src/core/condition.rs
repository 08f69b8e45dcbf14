//! Compiled rule predicates.
//!
//! `ConditionSpec` trees are compiled once against a `SymbolTable`, after
//! which every open-ended string key is a `Symbol`. A `MatchContext` is
//! built once per event and every rule's condition is evaluated against it.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::schema::channel::Channel;
use crate::schema::condition::ConditionSpec;
use crate::schema::event::{AttackResult, HpStatus, PhysicsClass, RawEvent, WeaponType};
use crate::schema::intent::Intent;

/// Interned string key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    ids: FxHashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.ids.get(name) {
            return sym;
        }
        let sym = Symbol(self.ids.len() as u32);
        self.ids.insert(name.to_string(), sym);
        sym
    }

    /// Looks up an existing symbol without interning.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Always,
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    Tag(Symbol),
    Skill(Symbol),
    SpiritCommand(Symbol),
    Result(AttackResult),
    ResultIn(Vec<AttackResult>),
    WeaponType(WeaponType),
    WeaponId(Symbol),
    WeaponTag(Symbol),
    Physics(PhysicsClass),
    Intent(Intent),
    Channel(Channel),
    Lethal,
    Counter,
    Support,
    DamageAtLeast(u32),
    DamageBelow(u32),
    HpStatus(HpStatus),
    DistanceAtLeast(u32),
    DistanceBelow(u32),
    Round(u32),
    Attacker(Symbol),
    Defender(Symbol),
}

impl Condition {
    pub fn compile(spec: &ConditionSpec, symbols: &mut SymbolTable) -> Condition {
        match spec {
            ConditionSpec::Always => Condition::Always,
            ConditionSpec::All(parts) => {
                Condition::All(parts.iter().map(|p| Self::compile(p, symbols)).collect())
            }
            ConditionSpec::Any(parts) => {
                Condition::Any(parts.iter().map(|p| Self::compile(p, symbols)).collect())
            }
            ConditionSpec::Not(inner) => Condition::Not(Box::new(Self::compile(inner, symbols))),
            ConditionSpec::Tag(t) => Condition::Tag(symbols.intern(t)),
            ConditionSpec::Skill(s) => Condition::Skill(symbols.intern(s)),
            ConditionSpec::SpiritCommand(s) => Condition::SpiritCommand(symbols.intern(s)),
            ConditionSpec::Result(r) => Condition::Result(*r),
            ConditionSpec::ResultIn(rs) => Condition::ResultIn(rs.clone()),
            ConditionSpec::WeaponType(w) => Condition::WeaponType(*w),
            ConditionSpec::WeaponId(w) => Condition::WeaponId(symbols.intern(w)),
            ConditionSpec::WeaponTag(t) => Condition::WeaponTag(symbols.intern(&t.to_lowercase())),
            ConditionSpec::Physics(p) => Condition::Physics(*p),
            ConditionSpec::Intent(i) => Condition::Intent(*i),
            ConditionSpec::Channel(c) => Condition::Channel(*c),
            ConditionSpec::Lethal => Condition::Lethal,
            ConditionSpec::Counter => Condition::Counter,
            ConditionSpec::Support => Condition::Support,
            ConditionSpec::DamageAtLeast(n) => Condition::DamageAtLeast(*n),
            ConditionSpec::DamageBelow(n) => Condition::DamageBelow(*n),
            ConditionSpec::HpStatus(h) => Condition::HpStatus(*h),
            ConditionSpec::DistanceAtLeast(n) => Condition::DistanceAtLeast(*n),
            ConditionSpec::DistanceBelow(n) => Condition::DistanceBelow(*n),
            ConditionSpec::Round(n) => Condition::Round(*n),
            ConditionSpec::Attacker(id) => Condition::Attacker(symbols.intern(id)),
            ConditionSpec::Defender(id) => Condition::Defender(symbols.intern(id)),
        }
    }

    /// True for a condition that holds for every event.
    pub fn is_always(&self) -> bool {
        match self {
            Condition::Always => true,
            Condition::All(parts) => parts.iter().all(Condition::is_always),
            _ => false,
        }
    }

    pub fn evaluate(&self, ctx: &MatchContext<'_>) -> bool {
        let event = ctx.event;
        match self {
            Condition::Always => true,
            Condition::All(parts) => parts.iter().all(|p| p.evaluate(ctx)),
            Condition::Any(parts) => parts.iter().any(|p| p.evaluate(ctx)),
            Condition::Not(inner) => !inner.evaluate(ctx),
            Condition::Tag(sym) => ctx.tags.contains(sym),
            Condition::Skill(sym) => ctx.skills.contains(sym),
            Condition::SpiritCommand(sym) => ctx.spirits.contains(sym),
            Condition::Result(r) => event.attack_result == *r,
            Condition::ResultIn(rs) => rs.contains(&event.attack_result),
            Condition::WeaponType(w) => event.weapon_type == *w,
            Condition::WeaponId(sym) => ctx.weapon_id == Some(*sym),
            Condition::WeaponTag(sym) => ctx.weapon_tags.contains(sym),
            Condition::Physics(p) => event.physics_class == *p,
            Condition::Intent(i) => ctx.intent == *i,
            Condition::Channel(c) => ctx.channel == *c,
            Condition::Lethal => event.is_lethal,
            Condition::Counter => event.is_counter,
            Condition::Support => event.is_support,
            Condition::DamageAtLeast(n) => event.damage >= *n,
            Condition::DamageBelow(n) => event.damage < *n,
            Condition::HpStatus(h) => ctx.hp_status == Some(*h),
            Condition::DistanceAtLeast(n) => event.distance >= *n,
            Condition::DistanceBelow(n) => event.distance < *n,
            Condition::Round(n) => event.round_number == *n,
            Condition::Attacker(sym) => ctx.attacker == Some(*sym),
            Condition::Defender(sym) => ctx.defender == Some(*sym),
        }
    }
}

/// Per-event view used by every condition evaluation in one resolution.
///
/// Strings the registry never interned are dropped here, so they can never
/// satisfy a condition.
#[derive(Debug)]
pub struct MatchContext<'a> {
    pub event: &'a RawEvent,
    pub channel: Channel,
    /// The weapon's natural intent.
    pub intent: Intent,
    pub hp_status: Option<HpStatus>,
    tags: FxHashSet<Symbol>,
    skills: FxHashSet<Symbol>,
    spirits: FxHashSet<Symbol>,
    weapon_tags: FxHashSet<Symbol>,
    weapon_id: Option<Symbol>,
    attacker: Option<Symbol>,
    defender: Option<Symbol>,
}

impl<'a> MatchContext<'a> {
    pub fn new(event: &'a RawEvent, channel: Channel, symbols: &SymbolTable) -> Self {
        let weapon_tags = event
            .weapon_tags
            .iter()
            .filter_map(|t| symbols.get(&t.to_lowercase()))
            .collect();

        MatchContext {
            event,
            channel,
            intent: Intent::natural(event.weapon_type, &event.weapon_tags),
            hp_status: event.hp_status(),
            tags: known_symbols(event.context_tags.iter(), symbols),
            skills: known_symbols(event.triggered_skills.iter(), symbols),
            spirits: known_symbols(event.spirit_commands.iter(), symbols),
            weapon_tags,
            weapon_id: symbols.get(&event.weapon_id),
            attacker: symbols.get(&event.attacker_id),
            defender: symbols.get(&event.defender_id),
        }
    }
}

fn known_symbols<'s>(
    names: impl Iterator<Item = &'s String>,
    symbols: &SymbolTable,
) -> FxHashSet<Symbol> {
    names.filter_map(|n| symbols.get(n)).collect()
}
