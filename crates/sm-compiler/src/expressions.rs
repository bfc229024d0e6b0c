use std::sync::OnceLock;

use regex::{Captures, Regex};
use sm_core::TemplateSchema;

use crate::diagnostics::Diagnostics;
use crate::suffix::wrap_no_suffix;

pub const MAX_EXPANSION_DEPTH: usize = 16;

/// Replaces `$EXP[name]` references with the named expression, recursively.
/// Expressions flagged `nosuffix` come back wrapped in `{NOSUFFIX:...}`.
/// Unknown and cyclic references stay verbatim and are reported.
pub fn expand_expressions(
    condition: &str,
    schema: &TemplateSchema,
    diagnostics: &mut Diagnostics,
) -> String {
    if !condition.contains("$EXP[") {
        return condition.to_string();
    }
    let mut visiting = Vec::new();
    expand_with_stack(condition, schema, diagnostics, &mut visiting)
}

fn expand_with_stack(
    text: &str,
    schema: &TemplateSchema,
    diagnostics: &mut Diagnostics,
    visiting: &mut Vec<String>,
) -> String {
    expression_ref_regex()
        .replace_all(text, |captures: &Captures<'_>| {
            let whole = captures[0].to_string();
            let name = captures[1].trim();

            if visiting.iter().any(|entry| entry == name) || visiting.len() >= MAX_EXPANSION_DEPTH
            {
                let mut chain = visiting.clone();
                chain.push(name.to_string());
                diagnostics.push(
                    "EXPRESSION_CYCLE",
                    format!("Expression cycle detected: {}", chain.join(" -> ")),
                );
                return whole;
            }

            let Some(expression) = schema.expression(name) else {
                diagnostics.push(
                    "EXPRESSION_UNKNOWN",
                    format!("Expression \"{name}\" is not defined."),
                );
                return whole;
            };

            visiting.push(name.to_string());
            let expanded = expand_with_stack(&expression.value, schema, diagnostics, visiting);
            visiting.pop();

            if expression.no_suffix {
                wrap_no_suffix(&expanded)
            } else {
                expanded
            }
        })
        .into_owned()
}

pub(crate) fn expression_ref_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\$EXP\[([^\]]+)\]").expect("expression regex must compile"))
}

#[cfg(test)]
mod expressions_tests {
    use super::*;
    use sm_core::Expression;

    fn schema_with(expressions: &[(&str, &str, bool)]) -> TemplateSchema {
        let mut schema = TemplateSchema::default();
        for (name, value, no_suffix) in expressions {
            schema.expressions.insert(
                (*name).to_string(),
                Expression {
                    name: (*name).to_string(),
                    value: (*value).to_string(),
                    no_suffix: *no_suffix,
                },
            );
        }
        schema
    }

    #[test]
    fn expands_nested_references() {
        let schema = schema_with(&[
            ("IsMovies", "widgetType=movies", false),
            ("IsVideo", "$EXP[IsMovies] | widgetType=episodes", false),
        ]);
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_expressions("$EXP[IsVideo] + widgetPath", &schema, &mut diagnostics);
        assert_eq!(expanded, "widgetType=movies | widgetType=episodes + widgetPath");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn no_suffix_expressions_are_wrapped() {
        let schema = schema_with(&[("IsMainMenu", "menu=mainmenu", true)]);
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_expressions("!$EXP[IsMainMenu]", &schema, &mut diagnostics);
        assert_eq!(expanded, "!{NOSUFFIX:menu=mainmenu}");
    }

    #[test]
    fn unknown_reference_stays_verbatim_and_is_reported() {
        let schema = TemplateSchema::default();
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_expressions("a=1 + $EXP[Missing]", &schema, &mut diagnostics);
        assert_eq!(expanded, "a=1 + $EXP[Missing]");
        assert!(diagnostics.has_code("EXPRESSION_UNKNOWN"));
    }

    #[test]
    fn cycles_terminate_with_diagnostic() {
        let schema = schema_with(&[("A", "$EXP[B]", false), ("B", "x=1 + $EXP[A]", false)]);
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_expressions("$EXP[A]", &schema, &mut diagnostics);
        assert_eq!(expanded, "x=1 + $EXP[A]");
        assert!(diagnostics.has_code("EXPRESSION_CYCLE"));
    }

    #[test]
    fn plain_conditions_pass_through() {
        let schema = TemplateSchema::default();
        let mut diagnostics = Diagnostics::new();
        assert_eq!(expand_expressions("a=1", &schema, &mut diagnostics), "a=1");
    }
}
