/// Pipeline integration tests: raw combat events to presentation events,
/// using the shipped mecha rule pack.

use combat_presentation::core::assembler::highlight_label;
use combat_presentation::core::pipeline::{PresentationEngine, ResolveError};
use combat_presentation::core::ruleset::RuleSet;
use combat_presentation::schema::channel::{Channel, Tier};
use combat_presentation::schema::event::{AttackResult, PhysicsClass, RawEvent, WeaponType};
use combat_presentation::schema::intent::Intent;
use combat_presentation::schema::presentation::PresentationEvent;

fn mecha_engine() -> PresentationEngine {
    PresentationEngine::builder()
        .rule_packs(&["mecha"])
        .build()
        .unwrap()
}

fn make_event(
    weapon_type: WeaponType,
    physics: PhysicsClass,
    result: AttackResult,
    weapon_name: &str,
) -> RawEvent {
    RawEvent {
        round_number: 3,
        attacker_id: "rx78_2".to_string(),
        defender_id: "ms06s".to_string(),
        attacker_name: "Gundam".to_string(),
        defender_name: "Char's Zaku".to_string(),
        weapon_id: "w_test".to_string(),
        weapon_name: weapon_name.to_string(),
        weapon_type,
        physics_class: physics,
        attack_result: result,
        damage: 3000,
        distance: 400,
        defender_max_hp: Some(8000),
        ..Default::default()
    }
}

/// The reaction winner must accept the action winner's intent, and must be
/// allowed on the routed channel.
fn assert_consistent(engine: &PresentationEngine, out: &PresentationEvent) {
    if out.scripted {
        return;
    }
    let registry = engine.registry();
    let action = registry.action(&out.action_rule).unwrap();
    let reaction = registry.reaction(&out.reaction_rule).unwrap();
    assert!(
        reaction.accepts.accepts(action.intent),
        "{} does not accept {} from {}",
        reaction.id,
        action.intent,
        action.id
    );
    assert!(
        reaction.channels.contains(&out.channel),
        "{} is not allowed on {}",
        reaction.id,
        out.channel
    );
}

#[test]
fn every_outcome_resolves_across_seeds() {
    let engine = mecha_engine();
    for weapon_type in WeaponType::ALL {
        for physics in PhysicsClass::ALL {
            for result in AttackResult::ALL {
                for lethal in [false, true] {
                    for counter in [false, true] {
                        let event = RawEvent {
                            is_lethal: lethal,
                            is_counter: counter,
                            ..make_event(weapon_type, physics, result, "Test Weapon")
                        };
                        for seed in 0..4 {
                            let out = engine.resolve_seeded(&event, seed).unwrap_or_else(|e| {
                                panic!("{:?} failed with seed {}: {}", event, seed, e)
                            });
                            assert!(!out.narration.is_empty());
                            assert!(!out.action_text.is_empty());
                            assert!(!out.reaction_text.is_empty());
                            assert!(!out.camera.is_empty());
                            assert!(out.timing_offset >= 1.5);
                            assert_consistent(&engine, &out);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn lethal_miss_routes_to_fatal() {
    let engine = mecha_engine();
    let event = RawEvent {
        is_lethal: true,
        ..make_event(WeaponType::Rifle, PhysicsClass::Kinetic, AttackResult::Miss, "Bazooka")
    };
    let out = engine.resolve_seeded(&event, 11).unwrap();
    assert_eq!(out.channel, Channel::Fatal);
    assert_eq!(out.camera, "cam_dramatic_zoom");
    let location = out.location.unwrap();
    assert!(engine.registry().locations().fatal.contains(&location));
}

#[test]
fn beam_crit_to_the_head_uses_head_reaction() {
    let engine = mecha_engine();
    let mut event = make_event(WeaponType::Rifle, PhysicsClass::Energy, AttackResult::Crit, "Beam Rifle");
    event.context_tags.insert("TAG_LOC_HEAD".to_string());

    for seed in 0..20 {
        let out = engine.resolve_seeded(&event, seed).unwrap();
        assert_eq!(out.channel, Channel::Impact);
        assert_eq!(out.action_tier, Tier::T2);
        assert_eq!(
            engine.registry().action(&out.action_rule).unwrap().intent,
            Intent::BeamInstant
        );
        assert_eq!(out.reaction_tier, Tier::T1);
        assert_eq!(out.reaction_rule, "head_hit_beam");
        assert_eq!(out.location.as_deref(), Some("head unit"));
        assert!(out.reaction_text.contains("head unit"));
        assert!(out.reaction_text.contains("main camera"));
        assert!(!out.narration.contains("torso"));
        assert!(out.effects.contains(&"vfx_head_explosion".to_string()));
        assert_eq!(out.camera, "cam_dramatic_zoom");
        assert!((out.timing_offset - 2.0).abs() < 1e-5);
    }
}

#[test]
fn critical_hp_reaction_reports_defender_condition() {
    let engine = mecha_engine();
    let event = RawEvent {
        defender_hp_after: Some(1500),
        ..make_event(WeaponType::Rifle, PhysicsClass::Energy, AttackResult::Hit, "Beam Rifle")
    };
    for seed in 0..10 {
        let out = engine.resolve_seeded(&event, seed).unwrap();
        assert_eq!(out.reaction_rule, "critical_damage");
        assert_eq!(out.reaction_tier, Tier::T1);
        assert!(out.reaction_text.ends_with("barely holding together."));
        assert!(out.location.is_some());
    }

    let lightly_hit = RawEvent {
        damage: 1000,
        defender_hp_after: Some(7000),
        ..event
    };
    let out = engine.resolve_seeded(&lightly_hit, 3).unwrap();
    assert_ne!(out.reaction_rule, "critical_damage");
    assert_eq!(out.reaction_tier, Tier::T2);
}

#[test]
fn beam_crit_without_head_tag_stays_generic() {
    let engine = mecha_engine();
    let event = make_event(WeaponType::Rifle, PhysicsClass::Energy, AttackResult::Crit, "Beam Rifle");
    let found_torso = (0..30).any(|seed| {
        let out = engine.resolve_seeded(&event, seed).unwrap();
        assert_eq!(out.reaction_tier, Tier::T2);
        assert_ne!(out.location.as_deref(), Some("head unit"));
        out.narration.contains("torso plating")
    });
    assert!(found_torso);
}

#[test]
fn lethal_hit_settles_on_fatal_reaction() {
    let engine = mecha_engine();
    let event = RawEvent {
        is_lethal: true,
        ..make_event(WeaponType::Rifle, PhysicsClass::Energy, AttackResult::Hit, "Beam Rifle")
    };
    for seed in 0..10 {
        let out = engine.resolve_seeded(&event, seed).unwrap();
        assert_eq!(out.channel, Channel::Fatal);
        assert_eq!(out.reaction_rule, "beam_fatal");
        let reaction = engine.registry().reaction(&out.reaction_rule).unwrap();
        assert!(reaction.channels.contains(&Channel::Fatal));
        assert!(out.effects.contains(&"vfx_explosion_large".to_string()));
        assert!((out.timing_offset - 1.9).abs() < 1e-5);
    }
}

#[test]
fn plain_melee_block_settles_below_t1_with_weapon_highlight() {
    let engine = mecha_engine();
    let event = make_event(WeaponType::Melee, PhysicsClass::Blade, AttackResult::Block, "Beam Saber");
    assert_eq!(
        highlight_label(&event, engine.registry().labels()),
        Some("Beam Saber")
    );
    for seed in 0..10 {
        let out = engine.resolve_seeded(&event, seed).unwrap();
        assert_eq!(out.channel, Channel::Impact);
        assert_ne!(out.action_tier, Tier::T1);
        assert_ne!(out.reaction_tier, Tier::T1);
        assert_eq!(out.reaction_rule, "shield_block");
        assert!(out.reaction_text.contains("Beam Saber"));
        let location = out.location.unwrap();
        assert!(engine.registry().locations().guarded.contains(&location));
    }
}

#[test]
fn spirit_command_preempts_lower_tiers() {
    let engine = mecha_engine();
    let mut event = make_event(WeaponType::Melee, PhysicsClass::Blade, AttackResult::Hit, "Heat Hawk");
    event.spirit_commands.push("hot_blood".to_string());
    for seed in 0..10 {
        let out = engine.resolve_seeded(&event, seed).unwrap();
        assert_eq!(out.action_tier, Tier::T1);
        assert_eq!(out.action_rule, "hot_blood_cleave");
        assert!(out.action_text.starts_with("Hot Blood!"));
        assert_eq!(out.action_anim, "anim_slash_overdrive");
    }
}

#[test]
fn evasion_never_carries_a_location() {
    let engine = mecha_engine();
    for result in [AttackResult::Miss, AttackResult::Dodge, AttackResult::Parry] {
        let mut event = make_event(WeaponType::Melee, PhysicsClass::Blade, result, "Beam Saber");
        event.context_tags.insert("TAG_LOC_HEAD".to_string());
        for seed in 0..5 {
            let out = engine.resolve_seeded(&event, seed).unwrap();
            assert_eq!(out.channel, Channel::Evade);
            assert_eq!(out.location, None);
            assert_eq!(out.damage_display, 0);
        }
    }
}

#[test]
fn flash_evasion_uses_spirit_label() {
    let engine = mecha_engine();
    let mut event = make_event(WeaponType::Rifle, PhysicsClass::Energy, AttackResult::Dodge, "Beam Rifle");
    event.spirit_commands.push("flash".to_string());
    let out = engine.resolve_seeded(&event, 2).unwrap();
    assert_eq!(out.reaction_rule, "flash_evade");
    assert!(out.reaction_text.starts_with("Flash!"));
}

#[test]
fn same_seed_is_reproducible_across_engines() {
    let first = mecha_engine();
    let second = mecha_engine();
    let event = make_event(WeaponType::Rifle, PhysicsClass::Kinetic, AttackResult::Hit, "Bazooka");
    for seed in [0, 7, 42, 9001] {
        assert_eq!(
            first.resolve_seeded(&event, seed).unwrap(),
            second.resolve_seeded(&event, seed).unwrap()
        );
    }
}

#[test]
fn variants_differ_somewhere() {
    let engine = mecha_engine();
    let event = make_event(WeaponType::Melee, PhysicsClass::Blade, AttackResult::Hit, "Beam Saber");
    let variants = engine.resolve_variants(&event, 8, 5).unwrap();
    assert_eq!(variants.len(), 8);
    let first = &variants[0];
    assert!(variants
        .iter()
        .any(|v| v.narration != first.narration || v.location != first.location));
}

#[test]
fn boss_phase_scripted_override() {
    let engine = mecha_engine();
    let mut event = RawEvent {
        is_lethal: true,
        ..make_event(WeaponType::Rifle, PhysicsClass::Energy, AttackResult::Hit, "Hyper Bazooka")
    };
    event.context_tags.insert("TAG_BOSS_PHASE_2".to_string());
    event.spirit_commands.push("hot_blood".to_string());

    let out = engine.resolve_seeded(&event, 4).unwrap();
    assert!(out.scripted);
    assert_eq!(out.action_rule, "boss_last_stand");
    assert_eq!(out.action_tier, Tier::T0);
    assert_eq!(out.reaction_tier, Tier::T0);
    assert_eq!(out.camera, "cam_boss_finale");
    assert_eq!(out.location.as_deref(), Some("reactor housing"));
    assert!(out.action_text.contains("Hyper Bazooka"));
}

#[test]
fn map_weapon_uses_overview_camera_and_longer_delay() {
    let engine = mecha_engine();
    let event = make_event(WeaponType::Special, PhysicsClass::Energy, AttackResult::Hit, "MAP Mega Particle Cannon");
    let out = engine.resolve_seeded(&event, 1).unwrap();
    assert_eq!(out.action_rule, "map_weapon");
    assert_eq!(out.camera, "cam_map_overview");
    // 2.0 base for MAP weapons plus the AOE_BURST modifier
    assert!((out.timing_offset - 2.3).abs() < 1e-5);
}

#[test]
fn game_rules_dir_overrides_pack_rules() {
    let dir = std::env::temp_dir().join(format!("combat_presentation_override_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("overrides.ron"),
        r#"RuleSet(actions: [
            ActionRule(id: "ramming", tier: T2_TACTICAL, when: WeaponType(FALLBACK),
                fragments: ["{attacker} rams {defender} head on."], intent: IMPACT_MASSIVE),
        ])"#,
    )
    .unwrap();

    let engine = PresentationEngine::builder()
        .rule_packs(&["mecha"])
        .rules_dir(dir.to_str().unwrap())
        .build()
        .unwrap();
    let event = make_event(WeaponType::Fallback, PhysicsClass::Impact, AttackResult::Hit, "Frame");
    let out = engine.resolve_seeded(&event, 0).unwrap();
    assert_eq!(out.action_text, "Gundam rams Char's Zaku head on.");
    // Labels still come from the pack's presentation file.
    assert_eq!(engine.registry().labels().display("valor"), "Valor");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unresolved_variable_surfaces_as_assembly_error() {
    let engine = PresentationEngine::builder()
        .with_rules(
            RuleSet::parse_ron(
                r#"RuleSet(
                    actions: [ActionRule(id: "a", tier: T3, fragments: ["{highlight} shines."], intent: STRIKE_BLUNT)],
                    reactions: [ReactionRule(id: "r", tier: T3, fragments: ["{defender} reels."],
                        channels: [FATAL, SPECIAL, EVADE, IMPACT])],
                )"#,
            )
            .unwrap(),
        )
        .build()
        .unwrap();
    let event = make_event(WeaponType::Melee, PhysicsClass::Blade, AttackResult::Hit, "");
    assert!(matches!(
        engine.resolve_seeded(&event, 0),
        Err(ResolveError::Assembly(_))
    ));
}
