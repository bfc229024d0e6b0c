use sm_core::{
    MarkupElement, MarkupNode, MarkupText, MenuItem, PropertyMap, Reference, VariableDefinition,
};

use crate::placeholders::substitute_properties;
use crate::session::{effective_suffix, BuildSession};

impl<'a> BuildSession<'a> {
    /// Builds one output `<variable>` for an entry, or `None` when the
    /// definition's condition fails.
    pub fn expand_variable(
        &mut self,
        definition: &VariableDefinition,
        context: &PropertyMap,
        entry: &MenuItem,
    ) -> Option<MarkupElement> {
        if !definition.condition.is_empty()
            && !self.eval_condition(&definition.condition, &entry.properties, context)
        {
            return None;
        }

        let raw_name = if !definition.output.is_empty() {
            definition.output.as_str()
        } else {
            definition
                .content
                .attr("name")
                .filter(|name| !name.is_empty())
                .unwrap_or(definition.name.as_str())
        };
        let name = substitute_properties(raw_name, context, &entry.properties);

        let mut variable = substitute_tree(&definition.content, context, &entry.properties);
        variable.attributes.insert("name".to_string(), name);
        Some(variable)
    }

    /// Expands a variable group reference into `out`. Nested groups come
    /// first; each carries its own suffix or inherits the enclosing one.
    pub fn expand_variable_group(
        &mut self,
        reference: &Reference,
        context: &PropertyMap,
        entry: &MenuItem,
        inherited_suffix: &str,
        out: &mut Vec<MarkupElement>,
    ) {
        let mut visiting = Vec::new();
        self.expand_variable_group_inner(
            reference,
            context,
            entry,
            inherited_suffix,
            out,
            &mut visiting,
        );
    }

    fn expand_variable_group_inner(
        &mut self,
        reference: &Reference,
        context: &PropertyMap,
        entry: &MenuItem,
        inherited_suffix: &str,
        out: &mut Vec<MarkupElement>,
        visiting: &mut Vec<String>,
    ) {
        if !reference.condition.is_empty()
            && !self.eval_condition(&reference.condition, &entry.properties, context)
        {
            return;
        }

        if visiting.contains(&reference.name) {
            let mut chain = visiting.clone();
            chain.push(reference.name.clone());
            self.diagnostics.push(
                "VARIABLE_GROUP_CYCLE",
                format!("Variable group cycle detected: {}", chain.join(" -> ")),
            );
            return;
        }

        let schema = self.schema;
        let Some(group) = schema.variable_group(&reference.name) else {
            self.diagnostics.push(
                "VARIABLE_GROUP_UNKNOWN",
                format!("Variable group \"{}\" is not defined.", reference.name),
            );
            return;
        };

        let suffix = effective_suffix(&reference.suffix, inherited_suffix).to_string();
        visiting.push(reference.name.clone());

        for link in &group.group_refs {
            let nested = Reference {
                name: link.name.clone(),
                suffix: effective_suffix(&link.suffix, &suffix).to_string(),
                condition: String::new(),
            };
            self.expand_variable_group_inner(&nested, context, entry, &suffix, out, visiting);
        }

        for variable_ref in &group.references {
            if !variable_ref.condition.is_empty() {
                let condition = self.prepare_condition(&variable_ref.condition, &suffix);
                if !self.eval_condition(&condition, &entry.properties, context) {
                    continue;
                }
            }
            let Some(definition) = schema.variable_definition(&variable_ref.name) else {
                self.diagnostics.push(
                    "VARIABLE_UNKNOWN",
                    format!(
                        "Variable \"{}\" referenced by group \"{}\" is not defined.",
                        variable_ref.name, group.name
                    ),
                );
                continue;
            };
            if let Some(variable) = self.expand_variable(definition, context, entry) {
                out.push(variable);
            }
        }

        visiting.pop();
    }
}

fn substitute_tree(
    element: &MarkupElement,
    context: &PropertyMap,
    entry: &PropertyMap,
) -> MarkupElement {
    MarkupElement {
        name: element.name.clone(),
        attributes: element
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), substitute_properties(value, context, entry)))
            .collect(),
        children: element
            .children
            .iter()
            .map(|child| match child {
                MarkupNode::Element(inner) => {
                    MarkupNode::Element(substitute_tree(inner, context, entry))
                }
                MarkupNode::Text(text) => MarkupNode::Text(MarkupText {
                    value: substitute_properties(&text.value, context, entry),
                    location: text.location.clone(),
                }),
            })
            .collect(),
        location: element.location.clone(),
    }
}

#[cfg(test)]
mod variables_tests {
    use super::*;
    use crate::builder::BuildOptions;
    use sm_core::{
        PropertySchema, TemplateSchema, VariableGroup, VariableGroupLink, VariableReference,
    };
    use sm_parser::parse_xml_document;

    fn props(entries: &[(&str, &str)]) -> PropertyMap {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    fn definition(name: &str, condition: &str, output: &str, source: &str) -> VariableDefinition {
        VariableDefinition {
            name: name.to_string(),
            condition: condition.to_string(),
            output: output.to_string(),
            content: parse_xml_document(source).expect("content should parse").root,
        }
    }

    fn entry(entries: &[(&str, &str)]) -> MenuItem {
        MenuItem {
            name: "movies".to_string(),
            disabled: false,
            properties: props(entries),
        }
    }

    fn schema_with_groups() -> TemplateSchema {
        let mut schema = TemplateSchema::default();
        schema.variable_definitions.insert(
            "WidgetLabel".to_string(),
            definition(
                "WidgetLabel",
                "",
                "WidgetLabel$PROPERTY[id]$PROPERTY[suffix]",
                r#"<variable name="WidgetLabel"><value>$PROPERTY[label]</value></variable>"#,
            ),
        );
        schema.variable_definitions.insert(
            "WidgetArt".to_string(),
            definition(
                "WidgetArt",
                "",
                "WidgetArt$PROPERTY[id]",
                r#"<variable name="WidgetArt"><value>$PROPERTY[art]</value></variable>"#,
            ),
        );
        schema.variable_groups.insert(
            "common".to_string(),
            VariableGroup {
                name: "common".to_string(),
                references: vec![VariableReference {
                    name: "WidgetLabel".to_string(),
                    condition: String::new(),
                }],
                group_refs: Vec::new(),
            },
        );
        schema.variable_groups.insert(
            "widget".to_string(),
            VariableGroup {
                name: "widget".to_string(),
                references: vec![
                    VariableReference {
                        name: "WidgetArt".to_string(),
                        condition: "widgetArt=Poster".to_string(),
                    },
                    VariableReference {
                        name: "Missing".to_string(),
                        condition: String::new(),
                    },
                ],
                group_refs: vec![VariableGroupLink {
                    name: "common".to_string(),
                    suffix: String::new(),
                }],
            },
        );
        schema
    }

    #[test]
    fn expand_variable_names_from_output_then_content_then_definition() {
        let schema = TemplateSchema::default();
        let property_schema = PropertySchema::default();
        let options = BuildOptions::default();
        let mut session = BuildSession::new(&schema, &property_schema, &options);
        let context = props(&[("id", "801"), ("label", "Movies")]);
        let item = entry(&[]);

        let from_output = definition(
            "Label",
            "",
            "Label$PROPERTY[id]",
            r#"<variable name="Ignored"><value>$PROPERTY[label]</value></variable>"#,
        );
        let variable = session
            .expand_variable(&from_output, &context, &item)
            .expect("variable");
        assert_eq!(variable.attr("name"), Some("Label801"));
        assert_eq!(
            variable.first_child("value").map(MarkupElement::text_content),
            Some("Movies".to_string())
        );

        let from_content = definition(
            "Label",
            "",
            "",
            r#"<variable name="Content$PROPERTY[id]"><value>x</value></variable>"#,
        );
        let variable = session
            .expand_variable(&from_content, &context, &item)
            .expect("variable");
        assert_eq!(variable.attr("name"), Some("Content801"));

        let from_definition = definition("Plain", "", "", "<variable><value>x</value></variable>");
        let variable = session
            .expand_variable(&from_definition, &context, &item)
            .expect("variable");
        assert_eq!(variable.attr("name"), Some("Plain"));
    }

    #[test]
    fn expand_variable_respects_condition() {
        let schema = TemplateSchema::default();
        let property_schema = PropertySchema::default();
        let options = BuildOptions::default();
        let mut session = BuildSession::new(&schema, &property_schema, &options);

        let gated = definition(
            "Gated",
            "widgetType=movies",
            "",
            "<variable><value>x</value></variable>",
        );
        assert!(session
            .expand_variable(&gated, &PropertyMap::new(), &entry(&[("widgetType", "movies")]))
            .is_some());
        assert!(session
            .expand_variable(&gated, &PropertyMap::new(), &entry(&[("widgetType", "tv")]))
            .is_none());
    }

    #[test]
    fn variable_group_expands_nested_groups_first_with_suffix() {
        let schema = schema_with_groups();
        let property_schema = PropertySchema::default();
        let options = BuildOptions::default();
        let mut session = BuildSession::new(&schema, &property_schema, &options);

        let context = props(&[("id", "802"), ("suffix", ".2"), ("label", "Movies"), ("art", "poster.png")]);
        let item = entry(&[("widgetArt", "Fanart"), ("widgetArt.2", "Poster")]);
        let reference = Reference {
            name: "widget".to_string(),
            suffix: String::new(),
            condition: String::new(),
        };

        let mut out = Vec::new();
        session.expand_variable_group(&reference, &context, &item, ".2", &mut out);
        let names = out
            .iter()
            .filter_map(|variable| variable.attr("name"))
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["WidgetLabel802.2", "WidgetArt802"]);
        assert!(session.diagnostics().has_code("VARIABLE_UNKNOWN"));

        let mut out = Vec::new();
        session.expand_variable_group(&reference, &context, &item, "", &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn variable_group_reference_condition_and_unknown_group() {
        let schema = schema_with_groups();
        let property_schema = PropertySchema::default();
        let options = BuildOptions::default();
        let mut session = BuildSession::new(&schema, &property_schema, &options);
        let item = entry(&[("widgetType", "tv")]);

        let mut out = Vec::new();
        let gated = Reference {
            name: "common".to_string(),
            suffix: String::new(),
            condition: "widgetType=movies".to_string(),
        };
        session.expand_variable_group(&gated, &PropertyMap::new(), &item, "", &mut out);
        assert!(out.is_empty());

        let unknown = Reference {
            name: "nope".to_string(),
            ..Reference::default()
        };
        session.expand_variable_group(&unknown, &PropertyMap::new(), &item, "", &mut out);
        assert!(out.is_empty());
        assert!(session.diagnostics().has_code("VARIABLE_GROUP_UNKNOWN"));
    }

    #[test]
    fn variable_group_cycle_is_cut() {
        let mut schema = TemplateSchema::default();
        for (name, next) in [("a", "b"), ("b", "a")] {
            schema.variable_groups.insert(
                name.to_string(),
                VariableGroup {
                    name: name.to_string(),
                    references: Vec::new(),
                    group_refs: vec![VariableGroupLink {
                        name: next.to_string(),
                        suffix: String::new(),
                    }],
                },
            );
        }
        let property_schema = PropertySchema::default();
        let options = BuildOptions::default();
        let mut session = BuildSession::new(&schema, &property_schema, &options);

        let mut out = Vec::new();
        let reference = Reference {
            name: "a".to_string(),
            ..Reference::default()
        };
        session.expand_variable_group(&reference, &PropertyMap::new(), &entry(&[]), "", &mut out);
        assert!(out.is_empty());
        assert!(session.diagnostics().has_code("VARIABLE_GROUP_CYCLE"));
    }
}
