//! Text assembly: render each side's fragments against the event.

use rustc_hash::FxHashMap;
use std::borrow::Cow;
use thiserror::Error;

use crate::core::registry::{ActionRule, ReactionRule, ScriptedRule};
use crate::core::template::{Template, Variable};
use crate::schema::event::{HpStatus, RawEvent};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("rule '{rule_id}' references '{{{variable}}}' but no value is available")]
    UnresolvedVariable { rule_id: String, variable: String },
}

/// Display labels for skill and spirit-command ids. Unlabelled ids are
/// shown as-is.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: FxHashMap<String, String>,
}

impl LabelTable {
    pub fn new(labels: FxHashMap<String, String>) -> Self {
        LabelTable { labels }
    }

    pub fn display<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels.get(id).map(String::as_str).unwrap_or(id)
    }
}

/// The label named by `{highlight}`: first spirit command, else first
/// triggered skill, else the weapon name.
pub fn highlight_label<'a>(event: &'a RawEvent, labels: &'a LabelTable) -> Option<&'a str> {
    let first_nonempty = |ids: &'a [String]| ids.iter().find(|s| !s.is_empty());
    if let Some(spirit) = first_nonempty(&event.spirit_commands) {
        return Some(labels.display(spirit));
    }
    if let Some(skill) = first_nonempty(&event.triggered_skills) {
        return Some(labels.display(skill));
    }
    Some(event.weapon_name.as_str()).filter(|w| !w.is_empty())
}

/// Qualitative damage relative to the defender's max HP.
pub fn damage_grade(damage: u32, max_hp: Option<u32>) -> Option<&'static str> {
    let max_hp = max_hp.filter(|&hp| hp > 0)?;
    let ratio = f64::from(damage) / f64::from(max_hp);
    Some(if ratio < 0.1 {
        "glancing"
    } else if ratio < 0.3 {
        "solid"
    } else if ratio < 0.6 {
        "heavy"
    } else {
        "devastating"
    })
}

/// Prose for the defender's condition, named by `{status_word}`.
pub fn status_word(status: HpStatus) -> &'static str {
    match status {
        HpStatus::Lethal => "shut down for good",
        HpStatus::Critical => "barely holding together",
        HpStatus::Moderate => "damaged but still fighting",
        HpStatus::Light => "all but untouched",
    }
}

/// Variable values for one event.
pub struct Bindings<'a> {
    pub event: &'a RawEvent,
    pub location: Option<&'a str>,
    pub highlight: Option<&'a str>,
}

impl<'a> Bindings<'a> {
    pub fn new(event: &'a RawEvent, location: Option<&'a str>, labels: &'a LabelTable) -> Self {
        Bindings {
            event,
            location,
            highlight: highlight_label(event, labels),
        }
    }

    pub fn value(&self, var: Variable) -> Option<Cow<'a, str>> {
        let nonempty = |s: &'a str| Some(s).filter(|s| !s.is_empty()).map(Cow::Borrowed);
        match var {
            Variable::Attacker => nonempty(&self.event.attacker_name),
            Variable::Defender => nonempty(&self.event.defender_name),
            Variable::Weapon => nonempty(&self.event.weapon_name),
            Variable::Damage => Some(Cow::Owned(self.event.damage.to_string())),
            Variable::Location => self.location.and_then(nonempty),
            Variable::Highlight => self.highlight.and_then(nonempty),
            Variable::Result => Some(Cow::Borrowed(self.event.attack_result.label())),
            Variable::DamageGrade => {
                damage_grade(self.event.damage, self.event.defender_max_hp).map(Cow::Borrowed)
            }
            Variable::StatusWord => self.event.hp_status().map(status_word).map(Cow::Borrowed),
        }
    }
}

/// Render fragments in order, joined by single spaces.
pub fn render_fragments(
    rule_id: &str,
    fragments: &[Template],
    bindings: &Bindings<'_>,
) -> Result<String, AssemblyError> {
    let mut parts = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        let text = fragment
            .render(|var| bindings.value(var))
            .map_err(|var| AssemblyError::UnresolvedVariable {
                rule_id: rule_id.to_string(),
                variable: var.name().to_string(),
            })?;
        if !text.is_empty() {
            parts.push(text);
        }
    }
    Ok(parts.join(" "))
}

/// Build `(action_text, reaction_text)` from the two winning rules.
pub fn assemble(
    action: &ActionRule,
    reaction: &ReactionRule,
    event: &RawEvent,
    location: Option<&str>,
    labels: &LabelTable,
) -> Result<(String, String), AssemblyError> {
    let bindings = Bindings::new(event, location, labels);
    let action_text = render_fragments(&action.id, &action.fragments, &bindings)?;
    let reaction_text = render_fragments(&reaction.id, &reaction.fragments, &bindings)?;
    Ok((action_text, reaction_text))
}

/// Build `(action_text, reaction_text)` from a scripted rule's own text.
pub fn assemble_scripted(
    rule: &ScriptedRule,
    event: &RawEvent,
    location: Option<&str>,
    labels: &LabelTable,
) -> Result<(String, String), AssemblyError> {
    let bindings = Bindings::new(event, location, labels);
    let action_text = render_fragments(&rule.id, &rule.action, &bindings)?;
    let reaction_text = render_fragments(&rule.id, &rule.reaction, &bindings)?;
    Ok((action_text, reaction_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::event::AttackResult;

    fn make_event() -> RawEvent {
        RawEvent {
            attacker_name: "Gundam".to_string(),
            defender_name: "Zaku II".to_string(),
            weapon_name: "Beam Saber".to_string(),
            attack_result: AttackResult::Crit,
            damage: 2400,
            defender_max_hp: Some(6000),
            ..Default::default()
        }
    }

    fn labels() -> LabelTable {
        let mut map = FxHashMap::default();
        map.insert("hot_blood".to_string(), "Hot Blood".to_string());
        LabelTable::new(map)
    }

    fn templates(texts: &[&str]) -> Vec<Template> {
        texts.iter().map(|t| Template::parse(t).unwrap()).collect()
    }

    #[test]
    fn highlight_priority() {
        let labels = labels();
        let mut event = make_event();
        assert_eq!(highlight_label(&event, &labels), Some("Beam Saber"));

        event.triggered_skills.push("newtype".to_string());
        assert_eq!(highlight_label(&event, &labels), Some("newtype"));

        event.spirit_commands.push("hot_blood".to_string());
        assert_eq!(highlight_label(&event, &labels), Some("Hot Blood"));

        let bare = RawEvent::default();
        assert_eq!(highlight_label(&bare, &labels), None);
    }

    #[test]
    fn damage_grades() {
        assert_eq!(damage_grade(50, Some(1000)), Some("glancing"));
        assert_eq!(damage_grade(100, Some(1000)), Some("solid"));
        assert_eq!(damage_grade(300, Some(1000)), Some("heavy"));
        assert_eq!(damage_grade(600, Some(1000)), Some("devastating"));
        assert_eq!(damage_grade(600, Some(0)), None);
        assert_eq!(damage_grade(600, None), None);
    }

    #[test]
    fn renders_all_variables() {
        let labels = labels();
        let event = make_event();
        let bindings = Bindings::new(&event, Some("main camera"), &labels);
        let text = render_fragments(
            "r",
            &templates(&[
                "{attacker} lands a {result} with the {weapon}.",
                "{defender}'s {location} takes {damage}, a {damage_grade} blow.",
            ]),
            &bindings,
        )
        .unwrap();
        assert_eq!(
            text,
            "Gundam lands a critical hit with the Beam Saber. Zaku II's main camera takes 2400, a heavy blow."
        );
    }

    #[test]
    fn optional_clause_degrades_without_location() {
        let labels = labels();
        let event = make_event();
        let bindings = Bindings::new(&event, None, &labels);
        let text = render_fragments(
            "r",
            &templates(&["{defender} slips aside[, sparing its {location}]."]),
            &bindings,
        )
        .unwrap();
        assert_eq!(text, "Zaku II slips aside.");
    }

    #[test]
    fn unresolved_highlight_is_an_error() {
        let labels = labels();
        let event = RawEvent::default();
        let bindings = Bindings::new(&event, None, &labels);
        let err = render_fragments("spirit_line", &templates(&["{highlight} blazes!"]), &bindings)
            .unwrap_err();
        assert_eq!(
            err,
            AssemblyError::UnresolvedVariable {
                rule_id: "spirit_line".to_string(),
                variable: "highlight".to_string(),
            }
        );
    }

    #[test]
    fn status_word_follows_remaining_hp() {
        let labels = labels();
        let event = RawEvent {
            defender_hp_after: Some(1200),
            ..make_event()
        };
        let bindings = Bindings::new(&event, None, &labels);
        let text = render_fragments(
            "r",
            &templates(&["{defender} reels[, {status_word}]."]),
            &bindings,
        )
        .unwrap();
        assert_eq!(text, "Zaku II reels, barely holding together.");
    }

    #[test]
    fn status_word_without_hp_is_unresolved() {
        let labels = labels();
        let event = make_event();
        let bindings = Bindings::new(&event, None, &labels);
        assert_eq!(
            render_fragments("r", &templates(&["{defender} shudders[, {status_word}]."]), &bindings)
                .unwrap(),
            "Zaku II shudders."
        );
        let err = render_fragments("r", &templates(&["It is {status_word}."]), &bindings)
            .unwrap_err();
        assert_eq!(
            err,
            AssemblyError::UnresolvedVariable {
                rule_id: "r".to_string(),
                variable: "status_word".to_string(),
            }
        );
    }

    #[test]
    fn unresolved_grade_is_an_error() {
        let labels = labels();
        let event = RawEvent {
            defender_max_hp: None,
            ..make_event()
        };
        let bindings = Bindings::new(&event, None, &labels);
        assert!(render_fragments("r", &templates(&["A {damage_grade} hit."]), &bindings).is_err());
    }
}
