use std::sync::OnceLock;

use regex::Regex;
use sm_core::SkinMenuError;

use super::ast::{CompareOp, Condition};

pub fn parse_condition(raw: &str) -> Result<Condition, SkinMenuError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Condition::Always);
    }
    ensure_balanced(trimmed)?;

    if trimmed.contains('|') {
        let expanded = expand_compact_or(trimmed);
        parse_expr(&expanded)
    } else {
        parse_expr(trimmed)
    }
}

/// Rewrites compact OR so each alternative names its property:
/// `widgetType=movies | episodes` becomes
/// `widgetType=movies | widgetType=episodes`.
///
/// The property cascades from the most recent full comparison within the
/// same OR chain. Bracketed groups are expanded independently. Empty
/// alternatives are kept so the parser still rejects dangling operators.
pub fn expand_compact_or(condition: &str) -> String {
    if condition.trim().is_empty() {
        return condition.to_string();
    }
    split_top_level(condition, '+')
        .into_iter()
        .map(expand_and_part)
        .collect::<Vec<_>>()
        .join(" + ")
}

fn expand_and_part(part: &str) -> String {
    let trimmed = part.trim();
    let (negation, body) = split_negation(trimmed);
    if let Some(inner) = bracket_inner(body) {
        return format!("{negation}[{}]", expand_compact_or(inner));
    }
    format!("{negation}{}", expand_or_segment(body))
}

fn expand_or_segment(segment: &str) -> String {
    let parts = split_top_level(segment, '|');
    if parts.len() <= 1 {
        return segment.trim().to_string();
    }

    let mut current: Option<(String, String)> = None;
    let mut expanded = Vec::with_capacity(parts.len());
    for part in parts {
        let part = part.trim();
        let (negation, body) = split_negation(part);

        if let Some(inner) = bracket_inner(body) {
            expanded.push(format!("{negation}[{}]", expand_compact_or(inner)));
            continue;
        }
        if let Some(captures) = comparison_regex().captures(part) {
            current = Some((captures[2].to_string(), captures[3].to_string()));
            expanded.push(part.to_string());
            continue;
        }
        match &current {
            Some((property, op)) if is_bare_value(body) => {
                expanded.push(format!("{negation}{property}{op}{body}"));
            }
            _ => expanded.push(part.to_string()),
        }
    }
    expanded.join(" | ")
}

fn parse_expr(text: &str) -> Result<Condition, SkinMenuError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(syntax_error("empty operand"));
    }

    if let Some(inner) = bracket_inner(text) {
        return parse_expr(inner);
    }

    let and_parts = split_top_level(text, '+');
    if and_parts.len() > 1 {
        return and_parts
            .into_iter()
            .map(parse_expr)
            .collect::<Result<Vec<_>, _>>()
            .map(Condition::All);
    }

    let or_parts = split_top_level(text, '|');
    if or_parts.len() > 1 {
        return or_parts
            .into_iter()
            .map(parse_expr)
            .collect::<Result<Vec<_>, _>>()
            .map(Condition::Any);
    }

    if let Some(rest) = text.strip_prefix('!') {
        if rest.trim().is_empty() {
            return Err(syntax_error("negation without operand"));
        }
        return Ok(Condition::Not(Box::new(parse_expr(rest)?)));
    }

    parse_atom(text)
}

fn parse_atom(text: &str) -> Result<Condition, SkinMenuError> {
    let operator = text.char_indices().find_map(|(index, ch)| {
        CompareOp::from_char(ch).map(|op| (index, op))
    });

    let Some((index, op)) = operator else {
        ensure_plain_name(text)?;
        return Ok(Condition::Truthy {
            property: text.to_string(),
        });
    };

    let property = text[..index].trim();
    if property.is_empty() {
        return Err(syntax_error(format!(
            "missing property name before '{op}' in \"{text}\""
        )));
    }
    ensure_plain_name(property)?;

    Ok(Condition::Compare {
        property: property.to_string(),
        op,
        value: text[index + 1..].trim().to_string(),
    })
}

fn ensure_plain_name(name: &str) -> Result<(), SkinMenuError> {
    if name.contains(['[', ']', '!']) {
        return Err(syntax_error(format!("invalid property name \"{name}\"")));
    }
    Ok(())
}

fn ensure_balanced(text: &str) -> Result<(), SkinMenuError> {
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '[' => depth += 1,
            ']' => {
                if depth == 0 {
                    return Err(syntax_error(format!("unmatched ']' in \"{text}\"")));
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(syntax_error(format!("unclosed '[' in \"{text}\"")));
    }
    Ok(())
}

/// Splits on `delimiter` outside brackets; empty pieces are kept.
pub(crate) fn split_top_level(text: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth -= 1,
            _ if ch == delimiter && depth == 0 => {
                parts.push(&text[start..index]);
                start = index + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Inner text when `text` is one bracket group spanning the whole string.
fn bracket_inner(text: &str) -> Option<&str> {
    if !text.starts_with('[') || !text.ends_with(']') || text.len() < 2 {
        return None;
    }
    let mut depth = 0i32;
    for (index, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 && index + 1 < text.len() {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0).then(|| &text[1..text.len() - 1])
}

fn split_negation(text: &str) -> (&str, &str) {
    match text.strip_prefix('!') {
        Some(rest) => ("!", rest.trim_start()),
        None => ("", text),
    }
}

fn is_bare_value(text: &str) -> bool {
    !text.is_empty() && !text.contains(['=', '~', '[', ']', '!'])
}

fn comparison_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^(!?)([A-Za-z_][A-Za-z0-9_.]*)\s*([=~])(.*)$")
            .expect("comparison regex must compile")
    })
}

fn syntax_error(message: impl Into<String>) -> SkinMenuError {
    SkinMenuError::new("CONDITION_SYNTAX", message)
}
