//! Priority waterfall: scan tiers from highest to lowest priority and stop
//! at the first tier with any eligible rule.

use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::condition::MatchContext;
use crate::core::registry::{ActionRule, ReactionRule, RuleRegistry, TieredRule};
use crate::schema::channel::{Channel, Tier};
use crate::schema::event::{AttackResult, WeaponType};
use crate::schema::intent::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Action,
    Reaction,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Action => "action",
            Side::Reaction => "reaction",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaterfallError {
    #[error(
        "configuration integrity: no {side} rule down to T3 for {weapon_type} / {result} on channel {channel}"
    )]
    ConfigurationIntegrity {
        side: Side,
        channel: Channel,
        result: AttackResult,
        weapon_type: WeaponType,
    },
}

/// The eligible rules of the tier that settled one side.
#[derive(Debug)]
pub struct Candidates<'r, R> {
    pub side: Side,
    pub tier: Tier,
    /// Declaration order.
    pub rules: Vec<&'r R>,
}

/// Walk `tiers` in order. A rule is eligible when its condition holds and
/// it applies to the event's channel. Returns the first non-empty tier.
pub fn candidates<'r, R, I, F>(
    side: Side,
    tiers: &[Tier],
    ctx: &MatchContext<'_>,
    mut pool: F,
) -> Option<Candidates<'r, R>>
where
    R: TieredRule + 'r,
    I: Iterator<Item = &'r R>,
    F: FnMut(Tier) -> I,
{
    for &tier in tiers {
        let rules: Vec<&'r R> = pool(tier)
            .filter(|rule| rule.applies_to(ctx.channel) && rule.condition().evaluate(ctx))
            .collect();
        if !rules.is_empty() {
            debug!(%side, %tier, candidates = rules.len(), "waterfall settled");
            return Some(Candidates { side, tier, rules });
        }
    }
    None
}

fn integrity_error(side: Side, ctx: &MatchContext<'_>) -> WaterfallError {
    let err = WaterfallError::ConfigurationIntegrity {
        side,
        channel: ctx.channel,
        result: ctx.event.attack_result,
        weapon_type: ctx.event.weapon_type,
    };
    warn!(error = %err, "waterfall exhausted");
    err
}

/// Action-side waterfall over `T1..=T3`.
pub fn action_candidates<'r>(
    registry: &'r RuleRegistry,
    ctx: &MatchContext<'_>,
) -> Result<Candidates<'r, ActionRule>, WaterfallError> {
    candidates(Side::Action, &Tier::WATERFALL, ctx, |tier| {
        registry.actions(tier).iter()
    })
    .ok_or_else(|| integrity_error(Side::Action, ctx))
}

/// Reaction-side waterfall over `T1..=T3`, restricted to rules that accept
/// the action winner's intent and apply to the event's channel.
pub fn reaction_candidates<'r>(
    registry: &'r RuleRegistry,
    ctx: &MatchContext<'_>,
    intent: Intent,
) -> Result<Candidates<'r, ReactionRule>, WaterfallError> {
    candidates(Side::Reaction, &Tier::WATERFALL, ctx, |tier| {
        registry.reactions_accepting(tier, intent)
    })
    .ok_or_else(|| integrity_error(Side::Reaction, ctx))
}
