use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use sm_core::{Menu, PropertyMap};

use crate::TEMPLATE_INCLUDE_PREFIX;

/// Substitutes `$PROPERTY[name]` from the context, then the entry's own
/// properties, then the empty string.
pub fn substitute_properties(text: &str, context: &PropertyMap, entry: &PropertyMap) -> String {
    if !text.contains("$PROPERTY[") {
        return text.to_string();
    }
    property_ref_regex()
        .replace_all(text, |captures: &Captures<'_>| {
            let name = captures[1].trim();
            context
                .get(name)
                .or_else(|| entry.get(name))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSegment<'a> {
    Text(&'a str),
    Include(&'a str),
}

/// Splits text around `$INCLUDE[name]` references.
pub fn split_include_refs(text: &str) -> Vec<TextSegment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for captures in include_ref_regex().captures_iter(text) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(TextSegment::Text(&text[last..whole.start()]));
        }
        segments.push(TextSegment::Include(name.as_str().trim()));
        last = whole.end();
    }
    if last < text.len() {
        segments.push(TextSegment::Text(&text[last..]));
    }
    segments
}

/// Template includes referenced from any menu entry property value.
pub fn collect_assigned_templates(menus: &[Menu]) -> BTreeSet<String> {
    let mut assigned = BTreeSet::new();
    for menu in menus {
        for item in &menu.items {
            for value in item.properties.values() {
                for captures in include_ref_regex().captures_iter(value) {
                    let name = captures[1].trim();
                    if name.starts_with(TEMPLATE_INCLUDE_PREFIX) {
                        assigned.insert(name.to_string());
                    }
                }
            }
        }
    }
    assigned
}

fn property_ref_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\$PROPERTY\[([^\]]+)\]").expect("property regex must compile"))
}

fn include_ref_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\$INCLUDE\[([^\]]+)\]").expect("include regex must compile"))
}
