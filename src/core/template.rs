//! Narration fragment templates: parsing and rendering.

use std::borrow::Cow;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed brace")]
    UnclosedBrace,
    #[error("nested braces are not allowed")]
    NestedBrace,
    #[error("empty braces")]
    EmptyBraces,
    #[error("unmatched closing '{0}'")]
    UnmatchedClose(char),
    #[error("unclosed optional clause")]
    UnclosedClause,
    #[error("nested optional clauses are not allowed")]
    NestedClause,
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
}

/// A value a fragment can interpolate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Attacker,
    Defender,
    Weapon,
    Damage,
    Location,
    Highlight,
    Result,
    DamageGrade,
    StatusWord,
}

impl Variable {
    pub const ALL: [Variable; 9] = [
        Variable::Attacker,
        Variable::Defender,
        Variable::Weapon,
        Variable::Damage,
        Variable::Location,
        Variable::Highlight,
        Variable::Result,
        Variable::DamageGrade,
        Variable::StatusWord,
    ];

    pub fn from_name(name: &str) -> Option<Variable> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Attacker => "attacker",
            Self::Defender => "defender",
            Self::Weapon => "weapon",
            Self::Damage => "damage",
            Self::Location => "location",
            Self::Highlight => "highlight",
            Self::Result => "result",
            Self::DamageGrade => "damage_grade",
            Self::StatusWord => "status_word",
        }
    }

    /// Value used when the variable is unresolved outside an optional clause.
    pub fn fallback(&self) -> Option<&'static str> {
        match self {
            Self::Location => Some("frame"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Var(Variable),
    /// `[ ... ]`: dropped whole if any variable inside is unresolved.
    Optional(Vec<Segment>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    /// Parse a fragment.
    ///
    /// Syntax:
    /// - `{name}` → variable
    /// - `[ ... ]` → optional clause (may contain variables, not other clauses)
    /// - `{{`, `}}`, `[[`, `]]` → the literal character
    ///
    /// Doubled characters are always read as escapes, so a clause cannot be
    /// closed by the first `]` of a `]]` pair: `"[in the {location}]]"` is an
    /// unclosed clause holding a literal `]`.
    pub fn parse(input: &str) -> Result<Template, TemplateError> {
        let chars: Vec<char> = input.chars().collect();
        let mut i = 0;
        let segments = parse_segments(&chars, &mut i, false)?;
        Ok(Template { segments })
    }

    /// Every variable referenced, including those inside clauses.
    pub fn variables(&self) -> Vec<Variable> {
        fn walk(segments: &[Segment], out: &mut Vec<Variable>) {
            for seg in segments {
                match seg {
                    Segment::Var(v) => out.push(*v),
                    Segment::Optional(inner) => walk(inner, out),
                    Segment::Literal(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.segments, &mut out);
        out
    }

    /// Variables referenced outside any optional clause.
    pub fn required_variables(&self) -> Vec<Variable> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Var(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    /// Render with the given resolver. Returns the first variable that could
    /// not be resolved outside an optional clause.
    pub fn render<'v, F>(&self, resolve: F) -> Result<String, Variable>
    where
        F: Fn(Variable) -> Option<Cow<'v, str>>,
    {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(v) => match resolve(*v) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(v.fallback().ok_or(*v)?),
                },
                Segment::Optional(inner) => {
                    if let Some(clause) = render_clause(inner, &resolve) {
                        out.push_str(&clause);
                    }
                }
            }
        }
        Ok(collapse_whitespace(&out))
    }
}

fn render_clause<'v, F>(segments: &[Segment], resolve: &F) -> Option<String>
where
    F: Fn(Variable) -> Option<Cow<'v, str>>,
{
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Literal(text) => out.push_str(text),
            Segment::Var(v) => out.push_str(&resolve(*v)?),
            Segment::Optional(_) => return None,
        }
    }
    Some(out)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_segments(
    chars: &[char],
    i: &mut usize,
    in_clause: bool,
) -> Result<Vec<Segment>, TemplateError> {
    let len = chars.len();
    let mut segments = Vec::new();
    let mut literal_buf = String::new();

    while *i < len {
        let c = chars[*i];
        let doubled = *i + 1 < len && chars[*i + 1] == c;
        match c {
            '{' | '}' | '[' | ']' if doubled => {
                literal_buf.push(c);
                *i += 2;
            }
            '{' => {
                flush(&mut literal_buf, &mut segments);
                let start = *i + 1;
                let mut end = start;
                while end < len && chars[end] != '}' {
                    if chars[end] == '{' {
                        return Err(TemplateError::NestedBrace);
                    }
                    end += 1;
                }
                if end >= len {
                    return Err(TemplateError::UnclosedBrace);
                }
                let name: String = chars[start..end].iter().collect();
                let name = name.trim();
                if name.is_empty() {
                    return Err(TemplateError::EmptyBraces);
                }
                let var = Variable::from_name(name)
                    .ok_or_else(|| TemplateError::UnknownVariable(name.to_string()))?;
                segments.push(Segment::Var(var));
                *i = end + 1;
            }
            '}' => return Err(TemplateError::UnmatchedClose('}')),
            '[' => {
                if in_clause {
                    return Err(TemplateError::NestedClause);
                }
                flush(&mut literal_buf, &mut segments);
                *i += 1;
                let inner = parse_segments(chars, i, true)?;
                segments.push(Segment::Optional(inner));
            }
            ']' => {
                if !in_clause {
                    return Err(TemplateError::UnmatchedClose(']'));
                }
                flush(&mut literal_buf, &mut segments);
                *i += 1;
                return Ok(segments);
            }
            _ => {
                literal_buf.push(c);
                *i += 1;
            }
        }
    }

    if in_clause {
        return Err(TemplateError::UnclosedClause);
    }
    flush(&mut literal_buf, &mut segments);
    Ok(segments)
}

fn flush(literal_buf: &mut String, segments: &mut Vec<Segment>) {
    if !literal_buf.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal_buf)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(var: Variable) -> Option<Cow<'static, str>> {
        match var {
            Variable::Attacker => Some(Cow::Borrowed("Gundam")),
            Variable::Defender => Some(Cow::Borrowed("Zaku II")),
            Variable::Damage => Some(Cow::Owned(3000.to_string())),
            _ => None,
        }
    }

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("The hangar is quiet.").unwrap();
        assert_eq!(
            t.segments,
            vec![Segment::Literal("The hangar is quiet.".to_string())]
        );
    }

    #[test]
    fn parse_variables() {
        let t = Template::parse("{attacker} fires at {defender}.").unwrap();
        assert_eq!(t.segments.len(), 4);
        assert_eq!(t.segments[0], Segment::Var(Variable::Attacker));
        assert_eq!(t.segments[2], Segment::Var(Variable::Defender));
    }

    #[test]
    fn parse_optional_clause() {
        let t = Template::parse("Hit[ on the {location}].").unwrap();
        assert_eq!(
            t.segments[1],
            Segment::Optional(vec![
                Segment::Literal(" on the ".to_string()),
                Segment::Var(Variable::Location),
            ])
        );
        assert_eq!(t.variables(), vec![Variable::Location]);
        assert!(t.required_variables().is_empty());
    }

    #[test]
    fn parse_escapes() {
        let t = Template::parse("Use {{braces}} and [[brackets]].").unwrap();
        assert_eq!(
            t.segments,
            vec![Segment::Literal("Use {braces} and [brackets].".to_string())]
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Template::parse("Bad {} here"), Err(TemplateError::EmptyBraces));
        assert_eq!(
            Template::parse("Bad {outer{inner}}"),
            Err(TemplateError::NestedBrace)
        );
        assert_eq!(Template::parse("Bad {attacker"), Err(TemplateError::UnclosedBrace));
        assert_eq!(
            Template::parse("Bad } here"),
            Err(TemplateError::UnmatchedClose('}'))
        );
        assert_eq!(
            Template::parse("Bad ] here"),
            Err(TemplateError::UnmatchedClose(']'))
        );
        assert_eq!(Template::parse("Bad [clause"), Err(TemplateError::UnclosedClause));
        assert_eq!(Template::parse("[a [b] c]"), Err(TemplateError::NestedClause));
        assert_eq!(
            Template::parse("{pilot} sorties"),
            Err(TemplateError::UnknownVariable("pilot".to_string()))
        );
    }

    #[test]
    fn escape_wins_over_clause_close() {
        assert_eq!(
            Template::parse("[in the {location}]]"),
            Err(TemplateError::UnclosedClause)
        );
        let t = Template::parse("[in the {location}]]]").unwrap();
        assert_eq!(
            t.segments,
            vec![Segment::Optional(vec![
                Segment::Literal("in the ".to_string()),
                Segment::Var(Variable::Location),
                Segment::Literal("]".to_string()),
            ])]
        );
    }

    #[test]
    fn status_word_is_a_known_variable() {
        let t = Template::parse("{defender} is {status_word}.").unwrap();
        assert_eq!(t.required_variables(), vec![Variable::Defender, Variable::StatusWord]);
        assert_eq!(t.render(resolver), Err(Variable::StatusWord));
    }

    #[test]
    fn render_substitutes() {
        let t = Template::parse("{attacker} deals {damage} to {defender}.").unwrap();
        assert_eq!(t.render(resolver).unwrap(), "Gundam deals 3000 to Zaku II.");
    }

    #[test]
    fn render_drops_unresolved_clause() {
        let t = Template::parse("{defender} reels[ as the {location} buckles].").unwrap();
        assert_eq!(t.render(resolver).unwrap(), "Zaku II reels.");
    }

    #[test]
    fn render_location_fallback_outside_clause() {
        let t = Template::parse("Sparks fly from the {location}.").unwrap();
        assert_eq!(t.render(resolver).unwrap(), "Sparks fly from the frame.");
    }

    #[test]
    fn render_reports_unresolved_variable() {
        let t = Template::parse("{highlight} flares!").unwrap();
        assert_eq!(t.render(resolver), Err(Variable::Highlight));
    }

    #[test]
    fn render_collapses_whitespace() {
        let t = Template::parse("{attacker}  strikes [{highlight}] hard.").unwrap();
        assert_eq!(t.render(resolver).unwrap(), "Gundam strikes hard.");
    }
}
