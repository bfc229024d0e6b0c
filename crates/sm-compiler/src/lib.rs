mod builder;
pub mod condition;
mod context;
mod diagnostics;
mod expand;
mod expressions;
mod menu_includes;
mod placeholders;
mod reference_graph;
mod schema_loader;
mod session;
mod suffix;
mod variables;
mod writer;
mod xml_utils;

pub use builder::{BuildOptions, BuildOutput, TemplateBuilder, EMPTY_INCLUDE_DESCRIPTION};
pub use condition::{evaluate, expand_compact_or, parse_condition, try_evaluate};
pub use diagnostics::Diagnostics;
pub use expand::MAX_INCLUDE_DEPTH;
pub use expressions::{expand_expressions, MAX_EXPANSION_DEPTH};
pub use menu_includes::{build_menu_includes, MENU_INCLUDE_PREFIX};
pub use placeholders::{collect_assigned_templates, substitute_properties};
pub use reference_graph::validate_reference_graph;
pub use schema_loader::{load_menus, load_property_schema, load_template_schema};
pub use session::BuildSession;
pub use suffix::{
    apply_suffix_to_condition, apply_suffix_to_source, is_suffix_exempt,
    strip_no_suffix_markers, wrap_no_suffix, SUFFIX_EXEMPT,
};
pub use writer::render_document;

use sm_core::{
    MarkupElement, Menu, MenuItem, PropertyMap, PropertySchema, Template, TemplateOutput,
    TemplateSchema, VariableDefinition,
};

pub const TEMPLATE_INCLUDE_PREFIX: &str = "skinshortcuts-template-";

/// Resolves one context outside a build pass. Diagnostics are logged only.
pub fn build_context(
    template: &Template,
    output: &TemplateOutput,
    entry: &MenuItem,
    entry_index: usize,
    menu: &Menu,
    schema: &TemplateSchema,
    property_schema: &PropertySchema,
) -> PropertyMap {
    let options = BuildOptions::default();
    let mut session = BuildSession::new(schema, property_schema, &options);
    session.build_context(template, output, entry, entry_index, menu)
}

pub fn expand_output(
    fragment: &MarkupElement,
    context: &PropertyMap,
    entry: &MenuItem,
    schema: &TemplateSchema,
    options: &BuildOptions,
) -> Option<MarkupElement> {
    let property_schema = PropertySchema::default();
    let mut session = BuildSession::new(schema, &property_schema, options);
    session.expand_output(fragment, context, entry)
}

pub fn expand_variable(
    definition: &VariableDefinition,
    context: &PropertyMap,
    entry: &MenuItem,
    schema: &TemplateSchema,
) -> Option<MarkupElement> {
    let options = BuildOptions::default();
    let property_schema = PropertySchema::default();
    let mut session = BuildSession::new(schema, &property_schema, &options);
    session.expand_variable(definition, context, entry)
}
