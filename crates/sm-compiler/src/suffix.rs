use std::sync::OnceLock;

use regex::Regex;

pub const NO_SUFFIX_OPEN: &str = "{NOSUFFIX:";

/// Names that refer to the entry itself and never take a slot suffix.
pub const SUFFIX_EXEMPT: &[&str] = &["index", "name", "menu", "default", "id", "idprefix", "suffix"];

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

pub fn is_suffix_exempt(name: &str) -> bool {
    SUFFIX_EXEMPT.contains(&name)
}

pub fn wrap_no_suffix(text: &str) -> String {
    format!("{NO_SUFFIX_OPEN}{text}}}")
}

/// Slot suffixing: appends `suffix` (e.g. `.2`) to every property name that
/// starts an atom and is followed by `=` or `~`. Values, exempt names and
/// `{NOSUFFIX:...}` regions are left untouched; markers survive the rewrite.
pub fn apply_suffix_to_condition(condition: &str, suffix: &str) -> String {
    if suffix.is_empty() || condition.is_empty() {
        return condition.to_string();
    }
    let (protected, regions) = protect_regions(condition);
    let rewritten = rewrite_property_names(&protected, suffix);
    restore_regions(&rewritten, &regions)
}

/// Suffixes an indirection source. A source with `$PROPERTY[...]`
/// placeholders has only its last placeholder's name suffixed.
pub fn apply_suffix_to_source(source: &str, suffix: &str) -> String {
    if suffix.is_empty() || source.is_empty() || is_suffix_exempt(source.trim()) {
        return source.to_string();
    }
    if !source.contains("$PROPERTY[") {
        return format!("{source}{suffix}");
    }
    let Some(last) = property_ref_regex().captures_iter(source).last() else {
        return source.to_string();
    };
    let Some(name) = last.get(1) else {
        return source.to_string();
    };
    if is_suffix_exempt(name.as_str().trim()) {
        return source.to_string();
    }
    let mut result = String::with_capacity(source.len() + suffix.len());
    result.push_str(&source[..name.end()]);
    result.push_str(suffix);
    result.push_str(&source[name.end()..]);
    result
}

/// Removes `{NOSUFFIX:...}` wrappers, keeping their content.
pub fn strip_no_suffix_markers(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(NO_SUFFIX_OPEN) {
        result.push_str(&rest[..start]);
        let region = &rest[start..];
        match marker_len(region) {
            Some(len) => {
                let inner = &region[NO_SUFFIX_OPEN.len()..len - 1];
                result.push_str(&strip_no_suffix_markers(inner));
                rest = &region[len..];
            }
            None => {
                result.push_str(&region[NO_SUFFIX_OPEN.len()..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Byte length of the marker region at the start of `text`, closing brace
/// included. `None` when the braces never balance.
fn marker_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn protect_regions(text: &str) -> (String, Vec<String>) {
    let mut regions = Vec::new();
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(NO_SUFFIX_OPEN) {
        result.push_str(&rest[..start]);
        let region = &rest[start..];
        let len = marker_len(region).unwrap_or(region.len());
        result.push(PLACEHOLDER_OPEN);
        result.push_str(&regions.len().to_string());
        result.push(PLACEHOLDER_CLOSE);
        regions.push(region[..len].to_string());
        rest = &region[len..];
    }
    result.push_str(rest);
    (result, regions)
}

fn restore_regions(text: &str, regions: &[String]) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != PLACEHOLDER_OPEN {
            result.push(ch);
            continue;
        }
        let digits = chars
            .by_ref()
            .take_while(|next| *next != PLACEHOLDER_CLOSE)
            .collect::<String>();
        if let Some(region) = digits.parse::<usize>().ok().and_then(|i| regions.get(i)) {
            result.push_str(region);
        }
    }
    result
}

fn rewrite_property_names(text: &str, suffix: &str) -> String {
    let chars = text.char_indices().collect::<Vec<_>>();
    let mut result = String::with_capacity(text.len() + suffix.len() * 2);
    let mut at_atom_start = true;
    let mut in_value = false;
    let mut index = 0;

    while index < chars.len() {
        let (offset, ch) = chars[index];
        match ch {
            '+' | '|' => {
                at_atom_start = true;
                in_value = false;
                result.push(ch);
                index += 1;
            }
            '[' | ']' if !in_value => {
                at_atom_start = true;
                result.push(ch);
                index += 1;
            }
            '=' | '~' if !in_value => {
                in_value = true;
                at_atom_start = false;
                result.push(ch);
                index += 1;
            }
            '!' if at_atom_start => {
                result.push(ch);
                index += 1;
            }
            _ if ch.is_whitespace() => {
                result.push(ch);
                index += 1;
            }
            _ if at_atom_start && (ch.is_ascii_alphabetic() || ch == '_') => {
                let mut end = index;
                while end < chars.len() && is_name_char(chars[end].1) {
                    end += 1;
                }
                let name_end = chars.get(end).map_or(text.len(), |(pos, _)| *pos);
                let name = &text[offset..name_end];

                let mut lookahead = end;
                while lookahead < chars.len() && chars[lookahead].1.is_whitespace() {
                    lookahead += 1;
                }
                let followed_by_operator = chars
                    .get(lookahead)
                    .is_some_and(|(_, next)| *next == '=' || *next == '~');

                result.push_str(name);
                if followed_by_operator && !is_suffix_exempt(name) {
                    result.push_str(suffix);
                }
                at_atom_start = false;
                index = end;
            }
            _ => {
                at_atom_start = false;
                result.push(ch);
                index += 1;
            }
        }
    }
    result
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

fn property_ref_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\$PROPERTY\[([^\]]+)\]").expect("property regex must compile"))
}
