/// Preview: interactive resolution shell for testing rule packs.
///
/// Usage: preview --rules <dir> [--seed <n>]
///
/// Commands:
///   attack <type> <result> [physics]  resolve a synthetic attack
///   weapon [name]                     set (or reset) the weapon name
///   hp <remaining>                    set the defender's HP after the hit
///   tag <TAG>                         add a context tag
///   skill <id>                        add a triggered skill
///   spirit <id>                       add an active spirit command
///   lethal | counter                  toggle the flag
///   clear                             reset tags, skills, spirits and flags
///   seed <n>                          set RNG seed
///   bulk <n>                          resolve the last attack n times with pick statistics
///   help                              list commands
///   quit                              exit

use combat_presentation::core::pipeline::PresentationEngine;
use combat_presentation::schema::event::{AttackResult, PhysicsClass, RawEvent, WeaponType};
use combat_presentation::schema::presentation::PresentationEvent;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "combat_presentation=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut rules_path = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rules" if i + 1 < args.len() => {
                i += 1;
                rules_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let rules_path = match rules_path {
        Some(path) if Path::new(&path).is_dir() => path,
        Some(path) => {
            eprintln!("Rules directory not found: {}", path);
            process::exit(1);
        }
        None => {
            print_usage();
            process::exit(1);
        }
    };

    let engine = match PresentationEngine::builder().rules_dir(&rules_path).build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} action rules, {} reaction rules, {} scripted rules",
        engine.registry().action_count(),
        engine.registry().reaction_count(),
        engine.registry().scripted().len()
    );
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    // Session state
    let mut event = base_event();
    let mut has_attack = false;
    let mut custom_weapon: Option<String> = None;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut current_seed = seed;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "attack" => {
                if parts.len() < 3 {
                    println!("Usage: attack <type> <result> [physics]");
                    println!("  type: {}", names(WeaponType::ALL.iter().map(|w| w.name())));
                    println!("  result: {}", names(AttackResult::ALL.iter().map(|r| r.name())));
                    println!("  physics: energy, kinetic, blade, impact (default: classified from the weapon name)");
                    continue;
                }
                let weapon_type = match parse_weapon_type(parts[1]) {
                    Some(w) => w,
                    None => {
                        println!("Unknown weapon type: {}", parts[1]);
                        continue;
                    }
                };
                let result = match parse_result(parts[2]) {
                    Some(r) => r,
                    None => {
                        println!("Unknown result: {}", parts[2]);
                        continue;
                    }
                };
                let weapon_name = custom_weapon
                    .clone()
                    .unwrap_or_else(|| default_weapon_name(weapon_type).to_string());
                let physics = match parts.get(3) {
                    Some(p) => match parse_physics(p) {
                        Some(p) => p,
                        None => {
                            println!("Unknown physics class: {}", p);
                            continue;
                        }
                    },
                    None => PhysicsClass::classify(&event.weapon_tags, &weapon_name),
                };

                event.weapon_type = weapon_type;
                event.weapon_name = weapon_name;
                event.physics_class = physics;
                event.attack_result = result;
                has_attack = true;

                match engine.resolve(&event, &mut rng) {
                    Ok(out) => {
                        println!("\n--- Presentation ---");
                        println!("{}", out);
                        println!("--- End ---\n");
                        print_trace(&out);
                    }
                    Err(e) => {
                        println!("ERROR: {}", e);
                    }
                }
                event.round_number += 1;
            }
            "tag" | "skill" | "spirit" => {
                if parts.len() < 2 {
                    println!("Usage: {} <id>", cmd);
                    print_state(&event);
                    continue;
                }
                let id = parts[1].to_string();
                match cmd.as_str() {
                    "tag" => {
                        event.context_tags.insert(id.clone());
                    }
                    "skill" => event.triggered_skills.push(id.clone()),
                    _ => event.spirit_commands.push(id.clone()),
                }
                println!("Added {} '{}'", cmd, id);
            }
            "weapon" => {
                if parts.len() < 2 {
                    custom_weapon = None;
                    println!("Weapon name reset to the per-type default.");
                } else {
                    let name = parts[1..].join(" ");
                    println!(
                        "Weapon set to '{}' ({:?})",
                        name,
                        PhysicsClass::classify(&event.weapon_tags, &name)
                    );
                    custom_weapon = Some(name);
                }
            }
            "hp" => {
                if parts.len() < 2 {
                    println!("Usage: hp <remaining>");
                    println!(
                        "  Defender HP after the hit, out of {}",
                        event.defender_max_hp.unwrap_or(0)
                    );
                    continue;
                }
                match parts[1].parse::<u32>() {
                    Ok(hp) => {
                        event.defender_hp_after = Some(hp);
                        match event.hp_status() {
                            Some(status) => println!("Defender HP: {} ({})", hp, status),
                            None => println!("Defender HP: {}", hp),
                        }
                    }
                    Err(_) => println!("Invalid HP: {}", parts[1]),
                }
            }
            "lethal" => {
                event.is_lethal = !event.is_lethal;
                println!("Lethal: {}", event.is_lethal);
            }
            "counter" => {
                event.is_counter = !event.is_counter;
                println!("Counter: {}", event.is_counter);
            }
            "clear" => {
                let round = event.round_number;
                event = RawEvent {
                    round_number: round,
                    ..base_event()
                };
                has_attack = false;
                custom_weapon = None;
                println!("Event state cleared.");
            }
            "seed" => {
                if parts.len() < 2 {
                    println!("Current seed: {}", current_seed);
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(s) => {
                        current_seed = s;
                        rng = StdRng::seed_from_u64(current_seed);
                        println!("Seed set to {}", current_seed);
                    }
                    Err(_) => {
                        println!("Invalid seed: {}", parts[1]);
                    }
                }
            }
            "bulk" => {
                if parts.len() < 2 {
                    println!("Usage: bulk <n>");
                    println!("  Repeats the last 'attack'. Run one first.");
                    continue;
                }
                let count: usize = match parts[1].parse() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        println!("Invalid count: {}", parts[1]);
                        continue;
                    }
                };
                if !has_attack {
                    println!("No attack defined. Use 'attack' first.");
                    continue;
                }
                run_bulk(&engine, &event, count, current_seed);
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for available commands.", cmd);
            }
        }
    }
}

fn run_bulk(engine: &PresentationEngine, event: &RawEvent, count: usize, seed: u64) {
    let mut outputs = Vec::new();
    let mut errors = 0;
    for i in 0..count as u64 {
        match engine.resolve_seeded(event, seed.wrapping_add(i)) {
            Ok(out) => outputs.push(out),
            Err(_) => errors += 1,
        }
    }

    println!(
        "\n=== Bulk Resolution: {} events ({} errors) ===\n",
        outputs.len(),
        errors
    );

    let unique: std::collections::HashSet<&str> =
        outputs.iter().map(|o| o.narration.as_str()).collect();
    println!("Unique narrations: {} / {}", unique.len(), outputs.len());

    print_counts("Action picks", outputs.iter().map(|o| o.action_rule.as_str()));
    print_counts("Reaction picks", outputs.iter().map(|o| o.reaction_rule.as_str()));
    print_counts(
        "Locations",
        outputs.iter().map(|o| o.location.as_deref().unwrap_or("-")),
    );

    if let Some(first) = outputs.first() {
        println!("\nSample:");
        println!("  {}", first);
    }
    println!();
}

fn print_counts<'a>(title: &str, picks: impl Iterator<Item = &'a str>) {
    let mut counts: FxHashMap<&str, u32> = FxHashMap::default();
    for pick in picks {
        *counts.entry(pick).or_insert(0) += 1;
    }
    let mut sorted: Vec<(&str, u32)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    println!("\n{}:", title);
    for (id, count) in sorted {
        println!("  {}: {}", id, count);
    }
}

fn print_usage() {
    println!("Preview: interactive resolution shell for testing rule packs.");
    println!();
    println!("Usage: preview --rules <dir> [--seed <n>]");
    println!();
    println!("  --rules <dir>  Rules directory (e.g. rule_data/mecha)");
    println!("  --seed <n>     Initial RNG seed (default: 42)");
}

fn print_help() {
    println!("Commands:");
    println!("  attack <type> <result> [physics]  Resolve a synthetic attack");
    println!("  weapon [name]                     Set the weapon name (no name resets it)");
    println!("  hp <remaining>                    Set the defender's HP after the hit");
    println!("  tag <TAG>                         Add a context tag (e.g. TAG_LOC_HEAD)");
    println!("  skill <id>                        Add a triggered skill");
    println!("  spirit <id>                       Add an active spirit command");
    println!("  lethal                            Toggle the lethal flag");
    println!("  counter                           Toggle the counter flag");
    println!("  clear                             Reset tags, skills, spirits and flags");
    println!("  seed <n>                          Set RNG seed");
    println!("  bulk <n>                          Repeat the last attack n times with statistics");
    println!("  help                              Show this help");
    println!("  quit                              Exit");
    println!();
    println!("Weapon types: {}", names(WeaponType::ALL.iter().map(|w| w.name())));
    println!("Results: {}", names(AttackResult::ALL.iter().map(|r| r.name())));
}

fn print_state(event: &RawEvent) {
    let mut tags: Vec<&String> = event.context_tags.iter().collect();
    tags.sort();
    println!("  Tags: {:?}", tags);
    println!("  Skills: {:?}", event.triggered_skills);
    println!("  Spirits: {:?}", event.spirit_commands);
    println!("  Lethal: {}  Counter: {}", event.is_lethal, event.is_counter);
    if let Some(hp) = event.defender_hp_after {
        println!("  Defender HP after: {}", hp);
    }
}

fn print_trace(out: &PresentationEvent) {
    println!(
        "[Trace] action={} ({})  reaction={} ({})",
        out.action_rule, out.action_tier, out.reaction_rule, out.reaction_tier
    );
    println!(
        "[Trace] location={}  camera={}  delay={:.2}s  damage={}",
        out.location.as_deref().unwrap_or("-"),
        out.camera,
        out.timing_offset,
        out.damage_display
    );
    println!(
        "[Trace] anims={} / {}  effects={:?}  sounds={:?}",
        out.action_anim, out.reaction_anim, out.effects, out.sounds
    );
}

fn names<'a>(list: impl Iterator<Item = &'a str>) -> String {
    list.collect::<Vec<_>>().join(", ")
}

fn base_event() -> RawEvent {
    RawEvent {
        round_number: 1,
        attacker_id: "preview_attacker".to_string(),
        defender_id: "preview_defender".to_string(),
        attacker_name: "Gundam".to_string(),
        defender_name: "Zaku II".to_string(),
        weapon_id: "preview_weapon".to_string(),
        damage: 2400,
        distance: 400,
        defender_max_hp: Some(8000),
        ..Default::default()
    }
}

fn parse_weapon_type(s: &str) -> Option<WeaponType> {
    WeaponType::ALL
        .into_iter()
        .find(|w| w.name().eq_ignore_ascii_case(s))
}

fn parse_result(s: &str) -> Option<AttackResult> {
    AttackResult::ALL
        .into_iter()
        .find(|r| r.name().eq_ignore_ascii_case(s))
}

fn parse_physics(s: &str) -> Option<PhysicsClass> {
    match s.to_lowercase().as_str() {
        "energy" => Some(PhysicsClass::Energy),
        "kinetic" => Some(PhysicsClass::Kinetic),
        "blade" => Some(PhysicsClass::Blade),
        "impact" => Some(PhysicsClass::Impact),
        _ => None,
    }
}

fn default_weapon_name(weapon_type: WeaponType) -> &'static str {
    match weapon_type {
        WeaponType::Melee => "Heat Axe",
        WeaponType::Rifle => "Beam Rifle",
        WeaponType::Heavy => "Mega Particle Cannon",
        WeaponType::Awakening => "Funnel Beams",
        WeaponType::Special => "MAP Missile Barrage",
        WeaponType::Fallback => "Shoulder Tackle",
    }
}
