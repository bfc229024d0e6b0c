use sm_core::{PropertyMap, PropertySchema, TemplateSchema};

use crate::builder::BuildOptions;
use crate::condition::try_evaluate;
use crate::diagnostics::Diagnostics;
use crate::expressions::expand_expressions;
use crate::suffix::{apply_suffix_to_condition, strip_no_suffix_markers};

/// Shared state of one build pass: the immutable schemas and options every
/// resolver step reads, plus the diagnostics they report into.
///
/// Context resolution lives in `context.rs`, markup expansion in
/// `expand.rs` and variable expansion in `variables.rs`.
#[derive(Debug)]
pub struct BuildSession<'a> {
    pub(crate) schema: &'a TemplateSchema,
    pub(crate) property_schema: &'a PropertySchema,
    pub(crate) options: &'a BuildOptions,
    pub(crate) diagnostics: Diagnostics,
}

impl<'a> BuildSession<'a> {
    pub fn new(
        schema: &'a TemplateSchema,
        property_schema: &'a PropertySchema,
        options: &'a BuildOptions,
    ) -> Self {
        Self {
            schema,
            property_schema,
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Expands macros, then rewrites property names for `suffix`.
    pub fn prepare_condition(&mut self, condition: &str, suffix: &str) -> String {
        let expanded = expand_expressions(condition, self.schema, &mut self.diagnostics);
        apply_suffix_to_condition(&expanded, suffix)
    }

    /// Evaluates against the entry's properties overlaid with `context`.
    /// Malformed conditions are reported and evaluate to `false`.
    pub fn eval_condition(
        &mut self,
        condition: &str,
        entry: &PropertyMap,
        context: &PropertyMap,
    ) -> bool {
        if condition.trim().is_empty() {
            return true;
        }
        let expanded = expand_expressions(condition, self.schema, &mut self.diagnostics);
        let stripped = strip_no_suffix_markers(&expanded);

        let result = if context.is_empty() {
            try_evaluate(&stripped, entry)
        } else {
            let mut merged = entry.clone();
            merged.extend(context.iter().map(|(key, value)| (key.clone(), value.clone())));
            try_evaluate(&stripped, &merged)
        };

        match result {
            Ok(matched) => matched,
            Err(error) => {
                self.diagnostics.report(error);
                false
            }
        }
    }

    /// Template gating: every condition must hold against the entry alone.
    pub fn check_conditions(
        &mut self,
        conditions: &[String],
        entry: &PropertyMap,
        suffix: &str,
    ) -> bool {
        let empty = PropertyMap::new();
        for condition in conditions {
            let prepared = self.prepare_condition(condition, suffix);
            if !self.eval_condition(&prepared, entry, &empty) {
                return false;
            }
        }
        true
    }
}

pub(crate) fn effective_suffix<'s>(reference_suffix: &'s str, inherited: &'s str) -> &'s str {
    if reference_suffix.is_empty() {
        inherited
    } else {
        reference_suffix
    }
}
