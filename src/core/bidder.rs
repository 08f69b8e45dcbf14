//! Dual bidder: one winner per side from that side's candidates.
//!
//! Pools are sorted by rule id before sampling so results never depend on
//! load order. The action side is picked first; the reaction side may read
//! the action winner but never changes it.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use thiserror::Error;
use tracing::{trace, warn};

use crate::core::registry::{ActionRule, ReactionRule, TieredRule};
use crate::core::waterfall::{Candidates, Side};
use crate::schema::intent::Intent;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidError {
    #[error(
        "internal consistency: reaction '{reaction_rule}' does not accept {intent} from action '{action_rule}'"
    )]
    IncompatibleIntent {
        action_rule: String,
        reaction_rule: String,
        intent: Intent,
    },
    #[error("no {side} candidates to bid on")]
    EmptyCandidates { side: Side },
}

pub fn select_action<'r, G: Rng + ?Sized>(
    candidates: &Candidates<'r, ActionRule>,
    rng: &mut G,
) -> Result<&'r ActionRule, BidError> {
    weighted_pick(candidates.rules.clone(), Side::Action, rng)
}

/// Pick the reaction winner. When the action winner declares a physics
/// class, candidates declaring the same class are preferred if any exist.
pub fn select_reaction<'r, G: Rng + ?Sized>(
    candidates: &Candidates<'r, ReactionRule>,
    action: &ActionRule,
    rng: &mut G,
) -> Result<&'r ReactionRule, BidError> {
    let affine: Vec<&'r ReactionRule> = match action.physics {
        Some(physics) => candidates
            .rules
            .iter()
            .copied()
            .filter(|r| r.physics == Some(physics))
            .collect(),
        None => Vec::new(),
    };
    let pool = if affine.is_empty() {
        candidates.rules.clone()
    } else {
        affine
    };

    let winner = weighted_pick(pool, Side::Reaction, rng)?;
    if !winner.accepts.accepts(action.intent) {
        let err = BidError::IncompatibleIntent {
            action_rule: action.id.clone(),
            reaction_rule: winner.id.clone(),
            intent: action.intent,
        };
        warn!(error = %err, "bidder diverged from waterfall filter");
        return Err(err);
    }
    Ok(winner)
}

fn weighted_pick<'r, R: TieredRule, G: Rng + ?Sized>(
    mut pool: Vec<&'r R>,
    side: Side,
    rng: &mut G,
) -> Result<&'r R, BidError> {
    pool.sort_by(|a, b| a.id().cmp(b.id()));
    // Summed in u64: a u32 total can overflow with large authored weights.
    let dist = WeightedIndex::new(pool.iter().map(|r| u64::from(r.weight())))
        .map_err(|_| BidError::EmptyCandidates { side })?;
    let winner = pool[dist.sample(rng)];
    trace!(%side, rule = winner.id(), pool = pool.len(), "bid won");
    Ok(winner)
}
