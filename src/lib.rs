//! Combat Presentation: narration and media cues for turn-based mecha combat.
//!
//! Turns already-resolved attack outcomes into prose and camera, animation
//! and timing cues, using tiered rule tables: a scripted override tier, a
//! short-circuiting priority waterfall run independently for the attacker
//! and defender sides, and an intent handshake that keeps the two halves
//! physically consistent.

pub mod core;
pub mod schema;

pub use crate::core::pipeline::{PipelineError, PresentationEngine, ResolveError};
pub use crate::core::ruleset::{PresentationConfig, RuleSet};
pub use crate::schema::event::RawEvent;
pub use crate::schema::presentation::PresentationEvent;
