//! Hit-location resolution.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::schema::channel::Channel;
use crate::schema::event::{AttackResult, RawEvent};

/// A context tag that pins the hit to a specific location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "TagOverride")]
pub struct TagOverride {
    pub tag: String,
    pub label: String,
}

/// Candidate location labels per outcome, plus tag overrides checked in
/// declaration order before any random draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Locations", default)]
pub struct LocationTable {
    pub fatal: Vec<String>,
    /// Critical hits.
    pub critical: Vec<String>,
    /// Blocked hits.
    pub guarded: Vec<String>,
    pub impact: Vec<String>,
    pub tag_overrides: Vec<TagOverride>,
}

fn labels(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for LocationTable {
    fn default() -> Self {
        LocationTable {
            fatal: labels(&["cockpit", "power core", "reactor housing"]),
            critical: labels(&["main camera", "thruster port", "joint actuator", "sensor array"]),
            guarded: labels(&["shield face", "forward armor", "defensive field"]),
            impact: labels(&["outer armor", "flank", "waist armor", "shoulder plating"]),
            tag_overrides: vec![
                TagOverride { tag: "TAG_LOC_HEAD".to_string(), label: "head unit".to_string() },
                TagOverride { tag: "TAG_LOC_ARM".to_string(), label: "arm".to_string() },
                TagOverride { tag: "TAG_LOC_LEG".to_string(), label: "leg".to_string() },
                TagOverride { tag: "TAG_LOC_BACKPACK".to_string(), label: "backpack".to_string() },
            ],
        }
    }
}

impl LocationTable {
    /// The random pool for an outcome. Empty when no location applies.
    pub fn pool(&self, channel: Channel, result: AttackResult) -> &[String] {
        match channel {
            Channel::Evade => &[],
            Channel::Fatal => &self.fatal,
            Channel::Special | Channel::Impact => match result {
                AttackResult::Crit => &self.critical,
                AttackResult::Block => &self.guarded,
                AttackResult::Hit => &self.impact,
                AttackResult::Miss | AttackResult::Dodge | AttackResult::Parry => &[],
            },
        }
    }

    /// Resolve the location token for one event.
    ///
    /// Order: no location for evasions; then the rule's dedicated label;
    /// then the first matching tag override; then a uniform draw. Only the
    /// last step touches `rng`.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        channel: Channel,
        event: &RawEvent,
        dedicated: Option<&str>,
        rng: &mut R,
    ) -> Option<String> {
        if channel == Channel::Evade
            || (channel != Channel::Fatal && !event.attack_result.connects())
        {
            return None;
        }
        if let Some(label) = dedicated {
            return Some(label.to_string());
        }
        if let Some(o) = self.tag_overrides.iter().find(|o| event.has_tag(&o.tag)) {
            return Some(o.label.clone());
        }
        self.pool(channel, event.attack_result).choose(rng).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_event(result: AttackResult) -> RawEvent {
        RawEvent {
            attack_result: result,
            ..Default::default()
        }
    }

    #[test]
    fn evade_has_no_location() {
        let table = LocationTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut event = make_event(AttackResult::Dodge);
        event.context_tags.insert("TAG_LOC_HEAD".to_string());
        assert_eq!(table.resolve(Channel::Evade, &event, Some("head unit"), &mut rng), None);
    }

    #[test]
    fn non_connecting_special_has_no_location() {
        let table = LocationTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        let event = make_event(AttackResult::Miss);
        assert_eq!(table.resolve(Channel::Special, &event, None, &mut rng), None);
    }

    #[test]
    fn fatal_miss_still_draws_from_fatal_pool() {
        let table = LocationTable::default();
        let mut rng = StdRng::seed_from_u64(3);
        let event = make_event(AttackResult::Miss);
        let loc = table.resolve(Channel::Fatal, &event, None, &mut rng).unwrap();
        assert!(table.fatal.contains(&loc));
    }

    #[test]
    fn dedicated_label_beats_tag_override() {
        let table = LocationTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut event = make_event(AttackResult::Hit);
        event.context_tags.insert("TAG_LOC_ARM".to_string());
        assert_eq!(
            table.resolve(Channel::Impact, &event, Some("visor"), &mut rng),
            Some("visor".to_string())
        );
    }

    #[test]
    fn tag_override_is_seed_independent() {
        let table = LocationTable::default();
        let mut event = make_event(AttackResult::Crit);
        event.context_tags.insert("TAG_LOC_HEAD".to_string());
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(
                table.resolve(Channel::Impact, &event, None, &mut rng),
                Some("head unit".to_string())
            );
        }
    }

    #[test]
    fn pools_follow_result() {
        let table = LocationTable::default();
        let mut rng = StdRng::seed_from_u64(9);
        for (result, pool) in [
            (AttackResult::Crit, &table.critical),
            (AttackResult::Block, &table.guarded),
            (AttackResult::Hit, &table.impact),
        ] {
            let event = make_event(result);
            let loc = table.resolve(Channel::Impact, &event, None, &mut rng).unwrap();
            assert!(pool.contains(&loc), "{} not in pool for {}", loc, result);
        }
    }

    #[test]
    fn empty_pool_yields_none() {
        let table = LocationTable {
            impact: Vec::new(),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let event = make_event(AttackResult::Hit);
        assert_eq!(table.resolve(Channel::Impact, &event, None, &mut rng), None);
    }
}
