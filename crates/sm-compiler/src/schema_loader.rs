use std::collections::BTreeMap;

use sm_core::{
    Expression, FallbackRule, IncludeDefinition, MarkupElement, Menu, MenuItem, Preset,
    PresetGroup, PresetGroupChild, PresetRow, PropertyFallback, PropertyGroup, PropertyMap,
    PropertySchema, Reference, SkinMenuError, Template, TemplateOnly, TemplateOutput,
    TemplateProperty, TemplateSchema, TemplateVar, VariableDefinition, VariableGroup,
    VariableGroupLink, VariableReference,
};
use sm_parser::parse_xml_document;

use crate::xml_utils::{
    attr_or_empty, ensure_root, get_optional_attr, get_required_non_empty_attr, inline_text,
    parse_bool_attr, section_items,
};

/// Parses `templates.xml`. Named definitions may sit in their plural
/// section (`<presets>`, `<expressions>`, ...) or directly under the root.
pub fn load_template_schema(source: &str) -> Result<TemplateSchema, SkinMenuError> {
    let root = parse_xml_document(source)?.root;
    ensure_root(&root, "templates")?;

    let mut schema = TemplateSchema::default();

    for node in section_items(&root, "expressions", "expression") {
        let name = get_required_non_empty_attr(node, "name")?;
        let expression = Expression {
            name: name.clone(),
            value: inline_text(node),
            no_suffix: parse_bool_attr(node, "nosuffix"),
        };
        insert_unique(&mut schema.expressions, name, expression, node)?;
    }

    for node in section_items(&root, "presets", "preset") {
        let preset = parse_preset(node)?;
        insert_unique(&mut schema.presets, preset.name.clone(), preset, node)?;
    }

    for node in section_items(&root, "presetGroups", "presetGroup") {
        let group = parse_preset_group(node)?;
        insert_unique(&mut schema.preset_groups, group.name.clone(), group, node)?;
    }

    for node in section_items(&root, "propertyGroups", "propertyGroup") {
        let group = parse_property_group(node)?;
        insert_unique(&mut schema.property_groups, group.name.clone(), group, node)?;
    }

    for node in section_items(&root, "includes", "include") {
        let name = get_required_non_empty_attr(node, "name")?;
        let definition = IncludeDefinition {
            name: name.clone(),
            controls: node.clone(),
        };
        insert_unique(&mut schema.includes, name, definition, node)?;
    }

    for node in section_items(&root, "variables", "variable") {
        let definition = parse_variable_definition(node)?;
        insert_unique(
            &mut schema.variable_definitions,
            definition.name.clone(),
            definition,
            node,
        )?;
    }

    for node in section_items(&root, "variableGroups", "variableGroup") {
        let group = parse_variable_group(node)?;
        insert_unique(&mut schema.variable_groups, group.name.clone(), group, node)?;
    }

    for node in section_items(&root, "templates", "template") {
        schema.templates.push(parse_template(node)?);
    }

    Ok(schema)
}

/// Parses `properties.xml`; only the `<fallbacks>` section is used.
pub fn load_property_schema(source: &str) -> Result<PropertySchema, SkinMenuError> {
    let root = parse_xml_document(source)?.root;
    ensure_root(&root, "properties")?;

    let mut schema = PropertySchema::default();
    for node in section_items(&root, "fallbacks", "fallback") {
        let property = get_required_non_empty_attr(node, "property")?;
        let mut rules = Vec::new();
        for child in node.element_children() {
            match child.name.as_str() {
                "when" => rules.push(FallbackRule {
                    value: inline_text(child),
                    condition: attr_or_empty(child, "condition").trim().to_string(),
                }),
                "default" => rules.push(FallbackRule {
                    value: inline_text(child),
                    condition: String::new(),
                }),
                _ => {}
            }
        }
        let fallback = PropertyFallback {
            property: property.clone(),
            rules,
        };
        insert_unique(&mut schema.fallbacks, property, fallback, node)?;
    }
    Ok(schema)
}

/// Parses `menus.xml`; `<menu>` and `<submenu>` roots share one namespace.
/// Item children other than `<property>` become properties named after their
/// tag (`<label>`, `<icon>`, `<action>`, ...).
pub fn load_menus(source: &str) -> Result<Vec<Menu>, SkinMenuError> {
    let root = parse_xml_document(source)?.root;
    ensure_root(&root, "menus")?;

    let mut menus = Vec::new();
    let mut seen = BTreeMap::new();
    for node in root
        .element_children()
        .filter(|child| child.name == "menu" || child.name == "submenu")
    {
        let name = get_required_non_empty_attr(node, "name")?;
        insert_unique(&mut seen, name.clone(), (), node)?;

        let mut menu = Menu {
            name,
            is_submenu: node.name == "submenu",
            control_type: attr_or_empty(node, "controltype").trim().to_string(),
            start_id: parse_start_id(node)?,
            container: attr_or_empty(node, "container").trim().to_string(),
            ..Menu::default()
        };
        for child in node.element_children() {
            match child.name.as_str() {
                "defaults" => menu.defaults.extend(parse_property_list(child)?),
                "item" => menu.items.push(parse_menu_item(child)?),
                _ => {}
            }
        }
        menus.push(menu);
    }
    Ok(menus)
}

fn parse_start_id(node: &MarkupElement) -> Result<usize, SkinMenuError> {
    let Some(raw) = get_optional_attr(node, "startid") else {
        return Ok(1);
    };
    raw.trim().parse::<usize>().map_err(|_| {
        SkinMenuError::with_span(
            "XML_INVALID_ATTR",
            format!("Attribute \"startid\" on <{}> must be a non-negative integer.", node.name),
            node.location.clone(),
        )
    })
}

fn parse_menu_item(node: &MarkupElement) -> Result<MenuItem, SkinMenuError> {
    let mut item = MenuItem {
        name: get_required_non_empty_attr(node, "name")?,
        disabled: parse_bool_attr(node, "disabled"),
        properties: PropertyMap::new(),
    };
    for child in node.element_children() {
        if child.name == "property" {
            let name = get_required_non_empty_attr(child, "name")?;
            item.properties.insert(name, inline_text(child));
        } else {
            item.properties.insert(child.name.clone(), inline_text(child));
        }
    }
    Ok(item)
}

fn parse_property_list(node: &MarkupElement) -> Result<PropertyMap, SkinMenuError> {
    let mut properties = PropertyMap::new();
    for child in node.element_children().filter(|child| child.name == "property") {
        let name = get_required_non_empty_attr(child, "name")?;
        properties.insert(name, inline_text(child));
    }
    Ok(properties)
}

fn parse_template(node: &MarkupElement) -> Result<Template, SkinMenuError> {
    let mut template = Template {
        include: get_required_non_empty_attr(node, "include")?,
        id_prefix: attr_or_empty(node, "idprefix").trim().to_string(),
        template_only: TemplateOnly::from_attr(&attr_or_empty(node, "templateonly")),
        ..Template::default()
    };

    for child in node.element_children() {
        match child.name.as_str() {
            "condition" => {
                let condition = inline_text(child);
                if !condition.is_empty() {
                    template.conditions.push(condition);
                }
            }
            "output" => template.outputs.push(TemplateOutput {
                include: get_required_non_empty_attr(child, "include")?,
                id_prefix: attr_or_empty(child, "idprefix").trim().to_string(),
                suffix: attr_or_empty(child, "suffix").trim().to_string(),
            }),
            "property" => template.properties.push(parse_template_property(child)?),
            "var" => template.vars.push(parse_template_var(child)?),
            "preset" => template.preset_refs.push(parse_reference(child)?),
            "presetGroup" => template.preset_group_refs.push(parse_reference(child)?),
            "propertyGroup" => template.property_group_refs.push(parse_reference(child)?),
            "controls" => template.controls = Some(child.clone()),
            "variables" => {
                for entry in child.element_children() {
                    match entry.name.as_str() {
                        "variable" => template.variables.push(parse_variable_definition(entry)?),
                        "variableGroup" => {
                            template.variable_group_refs.push(parse_reference(entry)?)
                        }
                        _ => {}
                    }
                }
            }
            "variable" => template.variables.push(parse_variable_definition(child)?),
            "variableGroup" => template.variable_group_refs.push(parse_reference(child)?),
            _ => {}
        }
    }

    Ok(template)
}

fn parse_template_property(node: &MarkupElement) -> Result<TemplateProperty, SkinMenuError> {
    Ok(TemplateProperty {
        name: get_required_non_empty_attr(node, "name")?,
        value: get_optional_attr(node, "value").unwrap_or_else(|| inline_text(node)),
        from_source: attr_or_empty(node, "from").trim().to_string(),
        condition: attr_or_empty(node, "condition").trim().to_string(),
    })
}

fn parse_template_var(node: &MarkupElement) -> Result<TemplateVar, SkinMenuError> {
    let name = get_required_non_empty_attr(node, "name")?;
    let values = node
        .element_children()
        .filter(|child| child.name == "value")
        .map(|child| TemplateProperty {
            name: name.clone(),
            value: inline_text(child),
            from_source: attr_or_empty(child, "from").trim().to_string(),
            condition: attr_or_empty(child, "condition").trim().to_string(),
        })
        .collect();
    Ok(TemplateVar { name, values })
}

fn parse_reference(node: &MarkupElement) -> Result<Reference, SkinMenuError> {
    Ok(Reference {
        name: get_required_non_empty_attr(node, "name")?,
        suffix: attr_or_empty(node, "suffix").trim().to_string(),
        condition: attr_or_empty(node, "condition").trim().to_string(),
    })
}

/// Every attribute except `condition` is a value of the bundle.
fn value_bundle(node: &MarkupElement) -> PropertyMap {
    node.attributes
        .iter()
        .filter(|(name, _)| name.as_str() != "condition")
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn parse_preset(node: &MarkupElement) -> Result<Preset, SkinMenuError> {
    let rows = node
        .element_children()
        .filter(|child| child.name == "values")
        .map(|child| PresetRow {
            condition: attr_or_empty(child, "condition").trim().to_string(),
            values: value_bundle(child),
        })
        .collect();
    Ok(Preset {
        name: get_required_non_empty_attr(node, "name")?,
        rows,
    })
}

fn parse_preset_group(node: &MarkupElement) -> Result<PresetGroup, SkinMenuError> {
    let name = get_required_non_empty_attr(node, "name")?;
    let mut children = Vec::new();
    for child in node.element_children() {
        match child.name.as_str() {
            "preset" => children.push(PresetGroupChild {
                condition: attr_or_empty(child, "condition").trim().to_string(),
                preset: Some(get_required_non_empty_attr(child, "name")?),
                values: PropertyMap::new(),
            }),
            "values" => children.push(PresetGroupChild {
                condition: attr_or_empty(child, "condition").trim().to_string(),
                preset: None,
                values: value_bundle(child),
            }),
            _ => {}
        }
    }
    Ok(PresetGroup { name, children })
}

fn parse_property_group(node: &MarkupElement) -> Result<PropertyGroup, SkinMenuError> {
    let mut group = PropertyGroup {
        name: get_required_non_empty_attr(node, "name")?,
        ..PropertyGroup::default()
    };
    for child in node.element_children() {
        match child.name.as_str() {
            "property" => group.properties.push(parse_template_property(child)?),
            "var" => group.vars.push(parse_template_var(child)?),
            _ => {}
        }
    }
    Ok(group)
}

fn parse_variable_definition(node: &MarkupElement) -> Result<VariableDefinition, SkinMenuError> {
    let name = get_required_non_empty_attr(node, "name")?;
    let mut content = node.clone();
    content.attributes.remove("condition");
    content.attributes.remove("output");
    Ok(VariableDefinition {
        name,
        condition: attr_or_empty(node, "condition").trim().to_string(),
        output: attr_or_empty(node, "output").trim().to_string(),
        content,
    })
}

fn parse_variable_group(node: &MarkupElement) -> Result<VariableGroup, SkinMenuError> {
    let mut group = VariableGroup {
        name: get_required_non_empty_attr(node, "name")?,
        ..VariableGroup::default()
    };
    for child in node.element_children() {
        match child.name.as_str() {
            "variable" => group.references.push(VariableReference {
                name: get_required_non_empty_attr(child, "name")?,
                condition: attr_or_empty(child, "condition").trim().to_string(),
            }),
            "group" | "variableGroup" => group.group_refs.push(VariableGroupLink {
                name: get_required_non_empty_attr(child, "name")?,
                suffix: attr_or_empty(child, "suffix").trim().to_string(),
            }),
            _ => {}
        }
    }
    Ok(group)
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    name: String,
    value: T,
    node: &MarkupElement,
) -> Result<(), SkinMenuError> {
    if map.contains_key(&name) {
        return Err(SkinMenuError::with_span(
            "SCHEMA_NAME_DUPLICATE",
            format!("Duplicate <{}> name \"{}\".", node.name, name),
            node.location.clone(),
        ));
    }
    map.insert(name, value);
    Ok(())
}
