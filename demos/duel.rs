/// Duel example: four exchanges between a Gundam and a custom Zaku,
/// narrated from the mecha rule pack.
///
/// A sequence: opening bazooka shot dodged on instinct → beam rifle crit to
///             the head → heat hawk counter caught on a shield → finishing
///             saber strike under Hot Blood.
///
/// Run with: cargo run --example duel

use combat_presentation::core::pipeline::PresentationEngine;
use combat_presentation::schema::event::{AttackResult, PhysicsClass, RawEvent, WeaponType};
use rand::rngs::StdRng;
use rand::SeedableRng;

struct Pilot {
    id: &'static str,
    unit: &'static str,
    max_hp: u32,
}

const AMURO: Pilot = Pilot {
    id: "amuro",
    unit: "Gundam",
    max_hp: 4000,
};

const CHAR: Pilot = Pilot {
    id: "char",
    unit: "Char's Zaku",
    max_hp: 3200,
};

fn exchange(
    round: u32,
    attacker: &Pilot,
    defender: &Pilot,
    weapon: (&str, WeaponType, PhysicsClass),
    result: AttackResult,
    damage: u32,
    distance: u32,
) -> RawEvent {
    let (weapon_name, weapon_type, physics_class) = weapon;
    RawEvent {
        round_number: round,
        attacker_id: attacker.id.to_string(),
        defender_id: defender.id.to_string(),
        attacker_name: attacker.unit.to_string(),
        defender_name: defender.unit.to_string(),
        weapon_id: weapon_name.to_lowercase().replace(' ', "_"),
        weapon_name: weapon_name.to_string(),
        weapon_type,
        physics_class,
        attack_result: result,
        damage,
        distance,
        defender_max_hp: Some(defender.max_hp),
        ..Default::default()
    }
}

fn main() {
    let engine = PresentationEngine::builder()
        .rule_packs(&["mecha"])
        .build()
        .expect("Failed to build engine");

    let mut rng = StdRng::seed_from_u64(1979);

    // --- Exchange 1: Char opens from range, Amuro reads it ---
    let mut opening = exchange(
        1,
        &CHAR,
        &AMURO,
        ("Zaku Bazooka", WeaponType::Rifle, PhysicsClass::Kinetic),
        AttackResult::Dodge,
        0,
        900,
    );
    opening.triggered_skills.push("newtype".to_string());

    // --- Exchange 2: beam rifle to the head ---
    let mut head_shot = exchange(
        1,
        &AMURO,
        &CHAR,
        ("Beam Rifle", WeaponType::Rifle, PhysicsClass::Energy),
        AttackResult::Crit,
        1400,
        600,
    );
    head_shot.context_tags.insert("TAG_LOC_HEAD".to_string());

    // --- Exchange 3: Char closes in and swings on the counter ---
    let mut counter = exchange(
        2,
        &CHAR,
        &AMURO,
        ("Heat Hawk", WeaponType::Melee, PhysicsClass::Blade),
        AttackResult::Block,
        300,
        80,
    );
    counter.is_counter = true;

    // --- Exchange 4: Hot Blood finisher ---
    let mut finisher = exchange(
        2,
        &AMURO,
        &CHAR,
        ("Beam Saber", WeaponType::Melee, PhysicsClass::Energy),
        AttackResult::Hit,
        2100,
        60,
    );
    finisher.spirit_commands.push("hot_blood".to_string());
    finisher.is_lethal = true;

    println!("=== Duel over Side 7 ===\n");

    for event in [opening, head_shot, counter, finisher] {
        match engine.resolve(&event, &mut rng) {
            Ok(out) => {
                println!("{}", out);
                println!(
                    "    camera={} delay={:.1}s damage={} rules={}/{}",
                    out.camera,
                    out.timing_offset,
                    out.damage_display,
                    out.action_rule,
                    out.reaction_rule
                );
                if !out.effects.is_empty() {
                    println!("    effects={}", out.effects.join(", "));
                }
                println!();
            }
            Err(e) => eprintln!("[R{}] resolution failed: {}\n", event.round_number, e),
        }
    }
}
