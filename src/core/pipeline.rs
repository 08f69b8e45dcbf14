//! The presentation pipeline: RawEvent → PresentationEvent.
//!
//! Route, check scripted overrides, run both waterfalls and bidders, resolve
//! the hit location, assemble text, then dispatch cues.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::assembler::{assemble, assemble_scripted, AssemblyError};
use crate::core::bidder::{select_action, select_reaction, BidError};
use crate::core::condition::MatchContext;
use crate::core::dispatcher::CueBundle;
use crate::core::registry::{RuleRegistry, ScriptedRule};
use crate::core::router::route;
use crate::core::ruleset::{load_rule_dir, PresentationConfig, RuleError, RuleSet};
use crate::core::scripted::match_forced;
use crate::core::waterfall::{action_candidates, reaction_candidates, WaterfallError};
use crate::schema::channel::Tier;
use crate::schema::event::RawEvent;
use crate::schema::presentation::PresentationEvent;

/// Directory holding the shipped rule packs, relative to the working directory.
pub const RULE_DATA_ROOT: &str = "rule_data";

/// Seed spacing between variants produced by `resolve_variants`.
const VARIANT_SEED_STRIDE: u64 = 1000;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("rule error: {0}")]
    Rules(#[from] RuleError),
}

/// Failure of a single resolution. The engine stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Waterfall(#[from] WaterfallError),
    #[error(transparent)]
    Bid(#[from] BidError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// The top-level presentation engine. Built via `PresentationEngine::builder()`.
#[derive(Debug, Clone)]
pub struct PresentationEngine {
    registry: RuleRegistry,
}

/// Builder for constructing a `PresentationEngine`.
#[derive(Debug, Default)]
pub struct PresentationEngineBuilder {
    rule_packs: Vec<String>,
    rules_dir: Option<String>,
    /// Directly provided rules (for testing without files).
    rules: Option<RuleSet>,
    /// Directly provided presentation config (for testing without files).
    presentation: Option<PresentationConfig>,
}

impl PresentationEngine {
    pub fn builder() -> PresentationEngineBuilder {
        PresentationEngineBuilder::default()
    }

    /// Wrap an already compiled registry.
    pub fn from_registry(registry: RuleRegistry) -> Self {
        PresentationEngine { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Resolve one event. Pure apart from draws on `rng`.
    pub fn resolve<G: Rng + ?Sized>(
        &self,
        event: &RawEvent,
        rng: &mut G,
    ) -> Result<PresentationEvent, ResolveError> {
        let channel = route(event);
        let ctx = MatchContext::new(event, channel, self.registry.symbols());

        if let Some(rule) = match_forced(&self.registry, &ctx) {
            return self.present_scripted(&ctx, rule, rng);
        }

        let actions = action_candidates(&self.registry, &ctx)?;
        let action = select_action(&actions, rng)?;
        let reactions = reaction_candidates(&self.registry, &ctx, action.intent)?;
        let reaction = select_reaction(&reactions, action, rng)?;

        let dedicated = reaction
            .location
            .as_deref()
            .filter(|_| reaction.tier == Tier::T1);
        let location = self
            .registry
            .locations()
            .resolve(channel, event, dedicated, rng);

        let (action_text, reaction_text) = assemble(
            action,
            reaction,
            event,
            location.as_deref(),
            self.registry.labels(),
        )?;
        let cues = self.registry.dispatcher().dispatch(&ctx, action, reaction);

        debug!(
            round = event.round_number,
            %channel,
            action = %action.id,
            reaction = %reaction.id,
            "resolved"
        );

        Ok(build_event(
            event,
            &ctx,
            Picked {
                action_rule: &action.id,
                reaction_rule: &reaction.id,
                action_tier: action.tier,
                reaction_tier: reaction.tier,
                scripted: false,
            },
            action_text,
            reaction_text,
            location,
            cues,
        ))
    }

    /// Resolve with a fresh `StdRng` seeded from `seed`.
    pub fn resolve_seeded(
        &self,
        event: &RawEvent,
        seed: u64,
    ) -> Result<PresentationEvent, ResolveError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.resolve(event, &mut rng)
    }

    /// Resolve the same event `count` times with spaced seeds.
    pub fn resolve_variants(
        &self,
        event: &RawEvent,
        count: usize,
        seed: u64,
    ) -> Result<Vec<PresentationEvent>, ResolveError> {
        (0..count as u64)
            .map(|i| self.resolve_seeded(event, variant_seed(seed, i)))
            .collect()
    }

    fn present_scripted<G: Rng + ?Sized>(
        &self,
        ctx: &MatchContext<'_>,
        rule: &ScriptedRule,
        rng: &mut G,
    ) -> Result<PresentationEvent, ResolveError> {
        let event = ctx.event;
        let location =
            self.registry
                .locations()
                .resolve(ctx.channel, event, rule.location.as_deref(), rng);
        let (action_text, reaction_text) =
            assemble_scripted(rule, event, location.as_deref(), self.registry.labels())?;
        let cues = self.registry.dispatcher().dispatch_scripted(ctx, rule);

        Ok(build_event(
            event,
            ctx,
            Picked {
                action_rule: &rule.id,
                reaction_rule: &rule.id,
                action_tier: Tier::T0,
                reaction_tier: Tier::T0,
                scripted: true,
            },
            action_text,
            reaction_text,
            location,
            cues,
        ))
    }
}

fn variant_seed(seed: u64, index: u64) -> u64 {
    seed.wrapping_add(index.wrapping_mul(VARIANT_SEED_STRIDE))
}

struct Picked<'a> {
    action_rule: &'a str,
    reaction_rule: &'a str,
    action_tier: Tier,
    reaction_tier: Tier,
    scripted: bool,
}

fn build_event(
    event: &RawEvent,
    ctx: &MatchContext<'_>,
    picked: Picked<'_>,
    action_text: String,
    reaction_text: String,
    location: Option<String>,
    cues: CueBundle,
) -> PresentationEvent {
    let narration = format!("{} {}", action_text, reaction_text)
        .trim()
        .to_string();
    PresentationEvent {
        round_number: event.round_number,
        channel: ctx.channel,
        narration,
        action_text,
        reaction_text,
        location,
        camera: cues.camera,
        action_anim: cues.action_anim,
        reaction_anim: cues.reaction_anim,
        effects: cues.effects,
        sounds: cues.sounds,
        timing_offset: cues.timing_offset,
        damage_display: cues.damage_display,
        action_rule: picked.action_rule.to_string(),
        reaction_rule: picked.reaction_rule.to_string(),
        action_tier: picked.action_tier,
        reaction_tier: picked.reaction_tier,
        scripted: picked.scripted,
    }
}

impl PresentationEngineBuilder {
    /// Shipped packs under `rule_data/`, merged in the given order.
    pub fn rule_packs(mut self, packs: &[&str]) -> Self {
        self.rule_packs = packs.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Game-specific rules; override the packs.
    pub fn rules_dir(mut self, path: &str) -> Self {
        self.rules_dir = Some(path.to_string());
        self
    }

    /// Provide rules directly (for testing without files).
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Provide presentation config directly (for testing without files).
    pub fn with_presentation(mut self, presentation: PresentationConfig) -> Self {
        self.presentation = Some(presentation);
        self
    }

    pub fn build(self) -> Result<PresentationEngine, PipelineError> {
        let mut rules = self.rules.unwrap_or_default();
        let mut presentation = self.presentation.unwrap_or_default();

        let mut dirs: Vec<String> = self
            .rule_packs
            .iter()
            .map(|pack| format!("{}/{}", RULE_DATA_ROOT, pack))
            .collect();
        dirs.extend(self.rules_dir);

        for dir in &dirs {
            if !Path::new(dir).exists() {
                warn!(dir = %dir, "rules directory not found, skipping");
                continue;
            }
            let loaded = load_rule_dir(Path::new(dir))?;
            rules.merge(loaded.rules);
            if let Some(config) = loaded.presentation {
                presentation = config;
            }
        }

        let registry = RuleRegistry::compile(rules, presentation)?;
        Ok(PresentationEngine { registry })
    }
}
