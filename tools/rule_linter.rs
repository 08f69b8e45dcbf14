/// Rule Linter: validates rule coverage and authoring quality for a rules
/// directory.
///
/// Usage: rule_linter <rules_dir>

use combat_presentation::core::registry::RuleRegistry;
use combat_presentation::core::ruleset::load_rule_dir;
use combat_presentation::core::template::{Template, Variable};
use combat_presentation::schema::channel::{Channel, Tier};
use combat_presentation::schema::intent::Intent;
use std::collections::BTreeSet;
use std::path::Path;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "combat_presentation=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: rule_linter <rules_dir>");
        process::exit(0);
    }

    let rules_dir = Path::new(&args[1]);
    if !rules_dir.is_dir() {
        eprintln!("ERROR: Directory '{}' does not exist", rules_dir.display());
        process::exit(1);
    }

    let loaded = match load_rule_dir(rules_dir) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("ERROR: Failed to load rules: {}", e);
            process::exit(1);
        }
    };
    if loaded.presentation.is_none() {
        println!("No presentation.ron found, using built-in cue tables");
    }

    let registry = match RuleRegistry::compile(
        loaded.rules,
        loaded.presentation.unwrap_or_default(),
    ) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("ERROR: Failed to compile rules: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} action rules, {} reaction rules, {} scripted rules",
        registry.action_count(),
        registry.reaction_count(),
        registry.scripted().len()
    );

    let (errors, warnings) = lint_rules(&registry);

    println!("\n=== Rule Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_rules(registry: &RuleRegistry) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Coverage: every channel needs an unconditional T3 rule on both sides,
    // and every probed outcome must settle.
    for gap in registry.static_fallback_gaps() {
        errors.push(format!("Static fallback gap: {}", gap));
    }
    for gap in registry.coverage_gaps() {
        errors.push(format!("Coverage gap: {}", gap));
    }

    // Low variety
    for tier in Tier::WATERFALL {
        let actions = registry.actions(tier);
        if actions.len() == 1 {
            warnings.push(format!(
                "Tier {} has only 1 action rule ('{}')",
                tier, actions[0].id
            ));
        }
        for channel in Channel::ALL {
            let on_channel: Vec<&str> = registry
                .reactions(tier)
                .iter()
                .filter(|r| r.channels.contains(&channel))
                .map(|r| r.id.as_str())
                .collect();
            if on_channel.len() == 1 {
                warnings.push(format!(
                    "Tier {} has only 1 reaction rule for {} ('{}')",
                    tier, channel, on_channel[0]
                ));
            }
        }
    }

    // Reaction intents that no action rule ever hands over
    let produced: BTreeSet<Intent> = Tier::WATERFALL
        .iter()
        .flat_map(|&tier| registry.actions(tier).iter().map(|r| r.intent))
        .collect();
    for tier in Tier::WATERFALL {
        for reaction in registry.reactions(tier) {
            if reaction.accepts.is_wildcard() {
                continue;
            }
            for intent in Intent::ALL {
                if reaction.accepts.accepts(intent) && !produced.contains(&intent) {
                    warnings.push(format!(
                        "Reaction '{}' accepts {} but no action rule produces it",
                        reaction.id, intent
                    ));
                }
            }
        }
    }

    // Evasions never resolve a location
    for tier in Tier::WATERFALL {
        for reaction in registry.reactions(tier) {
            if reaction.channels.contains(&Channel::Evade)
                && requires_location(&reaction.fragments)
            {
                warnings.push(format!(
                    "Reaction '{}' applies to EVADE but uses {{location}} outside an optional clause",
                    reaction.id
                ));
            }
        }
    }

    (errors, warnings)
}

fn requires_location(fragments: &[Template]) -> bool {
    fragments
        .iter()
        .any(|f| f.required_variables().contains(&Variable::Location))
}
