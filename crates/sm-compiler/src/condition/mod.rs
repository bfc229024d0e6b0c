mod ast;
mod evaluator;
mod parser;

pub use ast::{CompareOp, Condition};
pub use evaluator::evaluate_ast;
pub use parser::{expand_compact_or, parse_condition};

use sm_core::{PropertyMap, SkinMenuError};

/// Evaluates a property condition, reporting malformed input as an error.
///
/// The language is evaluated against a property snapshot:
/// `name=value` is equality, `name~value` substring containment, and a bare
/// `name` is true when the property is non-empty. `a + b` is AND, `a | b` is
/// OR, `!a` is NOT and `[...]` groups. `widgetType=movies | episodes` repeats
/// the last property. `+` is split before `|`, and `!` only ever binds to the
/// next atom or bracketed group: `!a=1+b=2` is `(!a=1) + (b=2)`.
pub fn try_evaluate(condition: &str, properties: &PropertyMap) -> Result<bool, SkinMenuError> {
    let parsed = parse_condition(condition)?;
    Ok(evaluate_ast(&parsed, properties))
}

/// Evaluates a condition string; malformed input evaluates to `false`.
pub fn evaluate(condition: &str, properties: &PropertyMap) -> bool {
    try_evaluate(condition, properties).unwrap_or(false)
}
