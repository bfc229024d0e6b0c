use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sm_core::{
    MarkupElement, MarkupNode, Menu, PropertySchema, SkinMenuError, Template, TemplateOnly,
    TemplateOutput, TemplateSchema,
};

use crate::menu_includes::build_menu_includes;
use crate::placeholders::collect_assigned_templates;
use crate::reference_graph::validate_reference_graph;
use crate::session::BuildSession;
use crate::TEMPLATE_INCLUDE_PREFIX;

pub const EMPTY_INCLUDE_DESCRIPTION: &str =
    "Automatically generated - no menu items matched this template";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Id of the skin container whose focused item drives `visibility`.
    pub container: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            container: "9000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    pub root: MarkupElement,
    pub diagnostics: Vec<SkinMenuError>,
}

/// One build pass over every template output and menu entry.
#[derive(Debug, Clone, Copy)]
pub struct TemplateBuilder<'a> {
    schema: &'a TemplateSchema,
    property_schema: &'a PropertySchema,
    menus: &'a [Menu],
    options: &'a BuildOptions,
}

impl<'a> TemplateBuilder<'a> {
    pub fn new(
        schema: &'a TemplateSchema,
        property_schema: &'a PropertySchema,
        menus: &'a [Menu],
        options: &'a BuildOptions,
    ) -> Self {
        Self {
            schema,
            property_schema,
            menus,
            options,
        }
    }

    pub fn build(&self) -> BuildOutput {
        let mut session = BuildSession::new(self.schema, self.property_schema, self.options);
        session.diagnostics.extend(validate_reference_graph(self.schema));

        let assigned = collect_assigned_templates(self.menus);
        let mut includes: Vec<MarkupElement> = Vec::new();
        let mut include_slots: BTreeMap<String, usize> = BTreeMap::new();
        let mut template_only: BTreeMap<String, TemplateOnly> = BTreeMap::new();
        let mut variables = Vec::new();

        for template in &self.schema.templates {
            for output in template.outputs() {
                let include_name = format!("{TEMPLATE_INCLUDE_PREFIX}{}", output.include);
                if template.template_only != TemplateOnly::Never {
                    template_only.insert(include_name.clone(), template.template_only);
                }

                let slot = *include_slots
                    .entry(include_name.clone())
                    .or_insert_with(|| {
                        includes.push(
                            MarkupElement::new("include").with_attr("name", include_name.as_str()),
                        );
                        includes.len() - 1
                    });

                let controls_before = includes[slot].children.len();
                let variables_before = variables.len();
                self.build_output_into(
                    &mut session,
                    template,
                    &output,
                    &mut includes[slot],
                    &mut variables,
                );
                log::debug!(
                    "built {include_name} (suffix \"{}\"): {} controls, {} variables",
                    output.suffix,
                    includes[slot].children.len() - controls_before,
                    variables.len() - variables_before
                );
            }
        }

        let variable_count = variables.len();
        let mut root = MarkupElement::new("includes");
        root.children
            .extend(variables.into_iter().map(MarkupNode::Element));

        let mut emitted = 0usize;
        for mut include in includes {
            let name = include.attr("name").unwrap_or_default().to_string();
            match template_only.get(&name) {
                Some(TemplateOnly::Always) => {
                    log::debug!("skipping template-only include {name}");
                    continue;
                }
                Some(TemplateOnly::Auto) if !assigned.contains(&name) => {
                    log::debug!("skipping unassigned include {name}");
                    continue;
                }
                _ => {}
            }
            if include.children.is_empty() {
                include = include.with_child(
                    MarkupElement::new("description").with_text(EMPTY_INCLUDE_DESCRIPTION),
                );
            }
            root.children.push(MarkupNode::Element(include));
            emitted += 1;
        }

        let diagnostics = session.into_diagnostics().into_vec();
        log::info!(
            "generated {emitted} includes and {variable_count} variables from {} templates ({} diagnostics)",
            self.schema.templates.len(),
            diagnostics.len()
        );

        BuildOutput { root, diagnostics }
    }

    /// Full includes document: menu includes first, then the template pass.
    pub fn build_document(&self) -> BuildOutput {
        let mut output = self.build();
        let menu_includes = build_menu_includes(self.menus);
        let templated = std::mem::take(&mut output.root.children);
        output.root.children = menu_includes
            .into_iter()
            .map(MarkupNode::Element)
            .chain(templated)
            .collect();
        output
    }

    fn build_output_into(
        &self,
        session: &mut BuildSession<'a>,
        template: &Template,
        output: &TemplateOutput,
        include: &mut MarkupElement,
        variables: &mut Vec<MarkupElement>,
    ) {
        for menu in self.menus {
            for (position, entry) in menu.items.iter().enumerate() {
                if entry.disabled {
                    continue;
                }
                if !session.check_conditions(&template.conditions, &entry.properties, &output.suffix)
                {
                    continue;
                }

                let context = session.build_context(template, output, entry, position + 1, menu);

                if let Some(controls) = &template.controls {
                    if let Some(expanded) = session.expand_output(controls, &context, entry) {
                        include.children.extend(expanded.children);
                    }
                }
                for definition in &template.variables {
                    if let Some(variable) = session.expand_variable(definition, &context, entry) {
                        variables.push(variable);
                    }
                }
                for reference in &template.variable_group_refs {
                    session.expand_variable_group(
                        reference,
                        &context,
                        entry,
                        &output.suffix,
                        variables,
                    );
                }
            }
        }
    }
}
