/// Rule data tests: the shipped mecha pack parses, compiles and covers every
/// outcome down to the fallback tier.

use combat_presentation::core::registry::RuleRegistry;
use combat_presentation::core::ruleset::{load_rule_dir, PresentationConfig, RuleSet};
use combat_presentation::core::template::Template;
use combat_presentation::schema::channel::{Channel, Tier};
use combat_presentation::schema::intent::Intent;
use std::collections::BTreeSet;
use std::path::Path;

const PACK: &str = "rule_data/mecha";

fn load_pack() -> RuleRegistry {
    let loaded = load_rule_dir(Path::new(PACK)).unwrap();
    RuleRegistry::compile(loaded.rules, loaded.presentation.unwrap()).unwrap()
}

#[test]
fn each_file_parses_on_its_own() {
    let actions = RuleSet::load_from_ron(&Path::new(PACK).join("actions.ron")).unwrap();
    assert!(!actions.actions.is_empty());
    assert!(actions.reactions.is_empty());

    let reactions = RuleSet::load_from_ron(&Path::new(PACK).join("reactions.ron")).unwrap();
    assert!(!reactions.reactions.is_empty());

    let scripted = RuleSet::load_from_ron(&Path::new(PACK).join("scripted.ron")).unwrap();
    assert_eq!(scripted.scripted.len(), 2);

    let presentation =
        PresentationConfig::load_from_ron(&Path::new(PACK).join("presentation.ron")).unwrap();
    assert_eq!(presentation.labels.get("hot_blood").map(String::as_str), Some("Hot Blood"));
    assert_eq!(presentation.cameras[0].priority, 100);
}

#[test]
fn presentation_file_matches_builtin_defaults_where_shared() {
    let presentation =
        PresentationConfig::load_from_ron(&Path::new(PACK).join("presentation.ron")).unwrap();
    let defaults = PresentationConfig::default();
    assert_eq!(presentation.locations, defaults.locations);
    assert_eq!(presentation.timing_modifiers, defaults.timing_modifiers);
}

#[test]
fn every_channel_has_an_unconditional_fallback() {
    let registry = load_pack();
    assert!(registry.static_fallback_gaps().is_empty());
    for channel in Channel::ALL {
        assert!(
            registry
                .reactions(Tier::T3)
                .iter()
                .any(|r| r.channels.contains(&channel) && r.condition.is_always() && r.accepts.is_wildcard()),
            "no wildcard fallback for {}",
            channel
        );
    }
}

#[test]
fn probed_grid_has_no_gaps() {
    let registry = load_pack();
    let gaps = registry.coverage_gaps();
    assert!(gaps.is_empty(), "coverage gaps: {:?}", gaps);
}

#[test]
fn scripted_rules_sit_outside_the_waterfall() {
    let registry = load_pack();
    assert_eq!(registry.scripted().len(), 2);
    assert_eq!(registry.scripted()[0].id, "boss_last_stand");
    for tier in Tier::WATERFALL {
        assert!(registry.actions(tier).iter().all(|r| r.tier == tier));
        assert!(registry.reactions(tier).iter().all(|r| r.tier == tier));
    }
}

#[test]
fn every_accepted_intent_is_produced_by_some_action() {
    let registry = load_pack();
    let produced: BTreeSet<Intent> = Tier::WATERFALL
        .iter()
        .flat_map(|&tier| registry.actions(tier).iter().map(|r| r.intent))
        .collect();
    for tier in Tier::WATERFALL {
        for reaction in registry.reactions(tier) {
            for &intent in Intent::ALL.iter().filter(|&&i| reaction.accepts.accepts(i)) {
                if !reaction.accepts.is_wildcard() {
                    assert!(
                        produced.contains(&intent),
                        "{} accepts {} but no action produces it",
                        reaction.id,
                        intent
                    );
                }
            }
        }
    }
}

#[test]
fn dedicated_locations_only_on_t1() {
    let registry = load_pack();
    for tier in [Tier::T2, Tier::T3] {
        assert!(registry.reactions(tier).iter().all(|r| r.location.is_none()));
    }
    assert!(registry
        .reactions(Tier::T1)
        .iter()
        .any(|r| r.location.as_deref() == Some("head unit")));
}

#[test]
fn evade_reactions_never_need_a_location() {
    let registry = load_pack();
    for tier in Tier::WATERFALL {
        for reaction in registry.reactions(tier) {
            if !reaction.channels.contains(&Channel::Evade) {
                continue;
            }
            let bare_location = reaction
                .fragments
                .iter()
                .any(|f: &Template| f.required_variables().iter().any(|v| v.name() == "location"));
            assert!(!bare_location, "{} needs a location on EVADE", reaction.id);
        }
    }
}

#[test]
fn rule_ids_are_unique() {
    let loaded = load_rule_dir(Path::new(PACK)).unwrap();
    let mut seen = BTreeSet::new();
    for id in loaded
        .rules
        .actions
        .iter()
        .map(|r| &r.id)
        .chain(loaded.rules.reactions.iter().map(|r| &r.id))
        .chain(loaded.rules.scripted.iter().map(|r| &r.id))
    {
        assert!(seen.insert(id.clone()), "duplicate rule id {}", id);
    }
}
