//! Authored rule tables: RON loading and merging.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::dispatcher::{
    default_base_delays, default_cameras, default_timing_modifiers, CueRuleDef, TimingModifier,
};
use crate::core::location::LocationTable;
use crate::core::template::TemplateError;
use crate::schema::rule::{ActionRuleDef, ReactionRuleDef, ScriptedRuleDef};

/// File name reserved for presentation settings inside a rules directory.
pub const PRESENTATION_FILE: &str = "presentation.ron";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error in {path}: {source}")]
    Ron {
        path: String,
        source: ron::error::SpannedError,
    },
    #[error("RON deserialization error: {0}")]
    RonInline(#[from] ron::error::SpannedError),
    #[error("rule '{rule_id}': fragment {index}: {source}")]
    Template {
        rule_id: String,
        index: usize,
        source: TemplateError,
    },
    #[error("rule '{rule_id}' uses T0_SCRIPTED; forced rules belong in the scripted table")]
    ScriptedTier { rule_id: String },
    #[error("rule '{rule_id}' has zero weight")]
    ZeroWeight { rule_id: String },
    #[error("rule '{rule_id}' has no fragments")]
    EmptyFragments { rule_id: String },
    #[error("reaction rule '{rule_id}' applies to no channel")]
    EmptyChannels { rule_id: String },
}

/// A partial or complete set of narration rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "RuleSet", default)]
pub struct RuleSet {
    pub actions: Vec<ActionRuleDef>,
    pub reactions: Vec<ReactionRuleDef>,
    pub scripted: Vec<ScriptedRuleDef>,
}

impl RuleSet {
    pub fn load_from_ron(path: &Path) -> Result<RuleSet, RuleError> {
        let contents = std::fs::read_to_string(path)?;
        ron::from_str(&contents).map_err(|source| RuleError::Ron {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn parse_ron(input: &str) -> Result<RuleSet, RuleError> {
        Ok(ron::from_str(input)?)
    }

    /// Merge another rule set into this one. Rules from `other` replace
    /// rules in `self` with the same id, keeping the original position;
    /// new ids are appended.
    pub fn merge(&mut self, other: RuleSet) {
        merge_by_id(&mut self.actions, other.actions, |r| &r.id);
        merge_by_id(&mut self.reactions, other.reactions, |r| &r.id);
        merge_by_id(&mut self.scripted, other.scripted, |r| &r.id);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.reactions.is_empty() && self.scripted.is_empty()
    }
}

fn merge_by_id<T, F>(base: &mut Vec<T>, incoming: Vec<T>, id: F)
where
    F: Fn(&T) -> &String,
{
    for rule in incoming {
        match base.iter().position(|r| id(r) == id(&rule)) {
            Some(pos) => base[pos] = rule,
            None => base.push(rule),
        }
    }
}

/// Cue tables, hit-location pools and display labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "PresentationConfig", default)]
pub struct PresentationConfig {
    pub cameras: Vec<CueRuleDef<String>>,
    pub base_delays: Vec<CueRuleDef<f32>>,
    pub timing_modifiers: Vec<TimingModifier>,
    pub locations: LocationTable,
    /// Display labels for skill and spirit-command ids.
    pub labels: FxHashMap<String, String>,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        PresentationConfig {
            cameras: default_cameras(),
            base_delays: default_base_delays(),
            timing_modifiers: default_timing_modifiers(),
            locations: LocationTable::default(),
            labels: FxHashMap::default(),
        }
    }
}

impl PresentationConfig {
    pub fn load_from_ron(path: &Path) -> Result<PresentationConfig, RuleError> {
        let contents = std::fs::read_to_string(path)?;
        ron::from_str(&contents).map_err(|source| RuleError::Ron {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn parse_ron(input: &str) -> Result<PresentationConfig, RuleError> {
        Ok(ron::from_str(input)?)
    }
}

/// Everything found in one rules directory.
#[derive(Debug, Clone, Default)]
pub struct RuleDir {
    pub rules: RuleSet,
    pub presentation: Option<PresentationConfig>,
}

/// Load every `.ron` file in `dir`, in lexical path order.
pub fn load_rule_dir(dir: &Path) -> Result<RuleDir, RuleError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    paths.retain(|p| p.extension().and_then(|s| s.to_str()) == Some("ron"));
    paths.sort();

    let mut loaded = RuleDir::default();
    for path in paths {
        if path.file_name().and_then(|s| s.to_str()) == Some(PRESENTATION_FILE) {
            debug!(path = %path.display(), "loading presentation config");
            loaded.presentation = Some(PresentationConfig::load_from_ron(&path)?);
        } else {
            debug!(path = %path.display(), "loading rule file");
            loaded.rules.merge(RuleSet::load_from_ron(&path)?);
        }
    }
    Ok(loaded)
}
