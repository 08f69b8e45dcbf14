use tracing::debug;

use crate::core::condition::MatchContext;
use crate::core::registry::{RuleRegistry, ScriptedRule};

/// Tier 0: the first scripted rule whose condition holds, in declaration
/// order. A match locks out every lower tier on both sides.
pub fn match_forced<'r>(
    registry: &'r RuleRegistry,
    ctx: &MatchContext<'_>,
) -> Option<&'r ScriptedRule> {
    let found = registry
        .scripted()
        .iter()
        .find(|rule| rule.condition.evaluate(ctx));
    if let Some(rule) = found {
        debug!(rule = %rule.id, round = ctx.event.round_number, "scripted override");
    }
    found
}
