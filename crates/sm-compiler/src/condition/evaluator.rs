use sm_core::PropertyMap;

use super::ast::{CompareOp, Condition};

/// Evaluates a parsed condition. Absent properties read as the empty string.
pub fn evaluate_ast(condition: &Condition, properties: &PropertyMap) -> bool {
    match condition {
        Condition::Always => true,
        Condition::All(parts) => parts.iter().all(|part| evaluate_ast(part, properties)),
        Condition::Any(parts) => parts.iter().any(|part| evaluate_ast(part, properties)),
        Condition::Not(inner) => !evaluate_ast(inner, properties),
        Condition::Compare {
            property,
            op,
            value,
        } => {
            let actual = lookup(properties, property);
            match op {
                CompareOp::Equals => actual == value,
                CompareOp::Contains => actual.contains(value.as_str()),
            }
        }
        Condition::Truthy { property } => !lookup(properties, property).is_empty(),
    }
}

fn lookup<'a>(properties: &'a PropertyMap, name: &str) -> &'a str {
    properties.get(name).map(String::as_str).unwrap_or_default()
}
