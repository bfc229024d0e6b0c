use std::collections::BTreeSet;

use sm_core::{
    Menu, MenuItem, Preset, PropertyMap, Template, TemplateOutput, TemplateProperty, TemplateVar,
};

use crate::placeholders::substitute_properties;
use crate::session::{effective_suffix, BuildSession};
use crate::suffix::apply_suffix_to_source;

const BUILTIN_SOURCES: &[&str] = &["index", "name", "menu", "id", "idprefix"];

impl<'a> BuildSession<'a> {
    /// Resolves the property map one (template output, menu entry) pair
    /// renders with. Later steps never override values set by earlier
    /// ones, except template properties and vars which replace seeded
    /// entry values.
    pub fn build_context(
        &mut self,
        template: &Template,
        output: &TemplateOutput,
        entry: &MenuItem,
        entry_index: usize,
        menu: &Menu,
    ) -> PropertyMap {
        let mut context = menu.defaults.clone();
        context.extend(
            entry
                .properties
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        context.insert("index".to_string(), entry_index.to_string());
        context.insert("name".to_string(), entry.name.clone());
        context.insert("menu".to_string(), menu.name.clone());
        context.insert("idprefix".to_string(), output.id_prefix.clone());
        let id = if output.id_prefix.is_empty() {
            entry_index.to_string()
        } else {
            format!("{}{}", output.id_prefix, entry_index)
        };
        context.insert("id".to_string(), id);
        context.insert("suffix".to_string(), output.suffix.clone());

        self.apply_fallbacks(entry, &mut context);

        let mut resolved = BTreeSet::new();
        for property in &template.properties {
            if resolved.contains(property.name.as_str()) {
                continue;
            }
            if let Some(value) = self.resolve_property(property, entry, &context, &output.suffix) {
                context.insert(property.name.clone(), value);
                resolved.insert(property.name.as_str());
            }
        }

        for var in &template.vars {
            if let Some(value) = self.resolve_var(var, entry, &context, &output.suffix) {
                context.insert(var.name.clone(), value);
            }
        }

        self.apply_preset_refs(template, output, entry, &mut context);
        self.apply_preset_group_refs(template, output, entry, &mut context);
        self.apply_property_group_refs(template, output, entry, &mut context);

        context
    }

    /// `None` when the property's condition fails.
    pub fn resolve_property(
        &mut self,
        property: &TemplateProperty,
        entry: &MenuItem,
        context: &PropertyMap,
        suffix: &str,
    ) -> Option<String> {
        if !property.condition.is_empty() {
            let condition = self.prepare_condition(&property.condition, suffix);
            if !self.eval_condition(&condition, &entry.properties, context) {
                return None;
            }
        }

        if !property.from_source.is_empty() {
            let source = apply_suffix_to_source(&property.from_source, suffix);
            return Some(get_from_source(&source, entry, context));
        }

        Some(substitute_properties(&property.value, context, &entry.properties))
    }

    /// First matching value wins.
    pub fn resolve_var(
        &mut self,
        var: &TemplateVar,
        entry: &MenuItem,
        context: &PropertyMap,
        suffix: &str,
    ) -> Option<String> {
        var.values
            .iter()
            .find_map(|value| self.resolve_property(value, entry, context, suffix))
    }

    fn apply_fallbacks(&mut self, entry: &MenuItem, context: &mut PropertyMap) {
        let property_schema = self.property_schema;
        if property_schema.fallbacks.is_empty() {
            return;
        }

        let variants = suffix_variants(&entry.properties);
        for (property, fallback) in &property_schema.fallbacks {
            for variant in &variants {
                let key = format!("{property}{variant}");
                if context.contains_key(&key) || entry.properties.contains_key(&key) {
                    continue;
                }
                for rule in &fallback.rules {
                    if rule.condition.is_empty() {
                        context.insert(key.clone(), rule.value.clone());
                        break;
                    }
                    let condition = self.prepare_condition(&rule.condition, variant);
                    if self.eval_condition(&condition, &entry.properties, context) {
                        context.insert(key.clone(), rule.value.clone());
                        break;
                    }
                }
            }
        }
    }

    fn apply_preset_refs(
        &mut self,
        template: &Template,
        output: &TemplateOutput,
        entry: &MenuItem,
        context: &mut PropertyMap,
    ) {
        let schema = self.schema;
        for reference in &template.preset_refs {
            let suffix = effective_suffix(&reference.suffix, &output.suffix);
            if !self.reference_applies(&reference.condition, suffix, entry, context) {
                continue;
            }
            let Some(preset) = schema.preset(&reference.name) else {
                self.diagnostics.push(
                    "PRESET_UNKNOWN",
                    format!("Preset \"{}\" is not defined.", reference.name),
                );
                continue;
            };
            if let Some(values) = self.first_matching_row(preset, entry, context, suffix) {
                merge_absent(context, values);
            }
        }
    }

    fn apply_preset_group_refs(
        &mut self,
        template: &Template,
        output: &TemplateOutput,
        entry: &MenuItem,
        context: &mut PropertyMap,
    ) {
        let schema = self.schema;
        for reference in &template.preset_group_refs {
            let suffix = effective_suffix(&reference.suffix, &output.suffix);
            if !self.reference_applies(&reference.condition, suffix, entry, context) {
                continue;
            }
            let Some(group) = schema.preset_group(&reference.name) else {
                self.diagnostics.push(
                    "PRESET_GROUP_UNKNOWN",
                    format!("Preset group \"{}\" is not defined.", reference.name),
                );
                continue;
            };

            for child in &group.children {
                if !child.condition.is_empty() {
                    let condition = self.prepare_condition(&child.condition, suffix);
                    if !self.eval_condition(&condition, &entry.properties, context) {
                        continue;
                    }
                }
                match &child.preset {
                    Some(name) => {
                        let Some(preset) = schema.preset(name) else {
                            self.diagnostics.push(
                                "PRESET_UNKNOWN",
                                format!(
                                    "Preset \"{name}\" referenced by preset group \"{}\" is not defined.",
                                    group.name
                                ),
                            );
                            continue;
                        };
                        if let Some(values) = self.first_matching_row(preset, entry, context, suffix)
                        {
                            merge_absent(context, values);
                            break;
                        }
                    }
                    None if !child.values.is_empty() => {
                        merge_absent(context, &child.values);
                        break;
                    }
                    None => {}
                }
            }
        }
    }

    fn apply_property_group_refs(
        &mut self,
        template: &Template,
        output: &TemplateOutput,
        entry: &MenuItem,
        context: &mut PropertyMap,
    ) {
        let schema = self.schema;
        for reference in &template.property_group_refs {
            let suffix = effective_suffix(&reference.suffix, &output.suffix);
            if !self.reference_applies(&reference.condition, suffix, entry, context) {
                continue;
            }
            let Some(group) = schema.property_group(&reference.name) else {
                self.diagnostics.push(
                    "PROPERTY_GROUP_UNKNOWN",
                    format!("Property group \"{}\" is not defined.", reference.name),
                );
                continue;
            };

            for property in &group.properties {
                if context.contains_key(&property.name) {
                    continue;
                }
                if let Some(value) = self.resolve_property(property, entry, context, suffix) {
                    context.insert(property.name.clone(), value);
                }
            }
            for var in &group.vars {
                if context.contains_key(&var.name) {
                    continue;
                }
                if let Some(value) = self.resolve_var(var, entry, context, suffix) {
                    context.insert(var.name.clone(), value);
                }
            }
        }
    }

    fn reference_applies(
        &mut self,
        condition: &str,
        suffix: &str,
        entry: &MenuItem,
        context: &PropertyMap,
    ) -> bool {
        if condition.is_empty() {
            return true;
        }
        let prepared = self.prepare_condition(condition, suffix);
        self.eval_condition(&prepared, &entry.properties, context)
    }

    fn first_matching_row<'p>(
        &mut self,
        preset: &'p Preset,
        entry: &MenuItem,
        context: &PropertyMap,
        suffix: &str,
    ) -> Option<&'p PropertyMap> {
        for row in &preset.rows {
            if row.condition.is_empty() {
                return Some(&row.values);
            }
            let condition = self.prepare_condition(&row.condition, suffix);
            if self.eval_condition(&condition, &entry.properties, context) {
                return Some(&row.values);
            }
        }
        None
    }
}

/// Built-ins, then the context, then the entry, then `""`. A source with
/// `$PROPERTY[...]` placeholders is substituted instead.
pub(crate) fn get_from_source(source: &str, entry: &MenuItem, context: &PropertyMap) -> String {
    if source.contains("$PROPERTY[") {
        return substitute_properties(source, context, &entry.properties);
    }
    if BUILTIN_SOURCES.contains(&source) {
        return context.get(source).cloned().unwrap_or_default();
    }
    context
        .get(source)
        .or_else(|| entry.properties.get(source))
        .cloned()
        .unwrap_or_default()
}

/// `""` plus every numeric `.N` suffix found on the entry's property names.
fn suffix_variants(properties: &PropertyMap) -> BTreeSet<String> {
    let mut variants = BTreeSet::from([String::new()]);
    for name in properties.keys() {
        if let Some((_, tail)) = name.rsplit_once('.') {
            if !tail.is_empty() && tail.chars().all(|ch| ch.is_ascii_digit()) {
                variants.insert(format!(".{tail}"));
            }
        }
    }
    variants
}

fn merge_absent(context: &mut PropertyMap, values: &PropertyMap) {
    for (key, value) in values {
        context
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}
