use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::markup::MarkupElement;

pub type PropertyMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub name: String,
    #[serde(default)]
    pub defaults: PropertyMap,
    #[serde(default)]
    pub items: Vec<MenuItem>,
    /// Declared with `<submenu>`: never emitted as a root menu include.
    #[serde(default)]
    pub is_submenu: bool,
    /// Renders items as `<control type=..>` instead of `<item>`.
    #[serde(default)]
    pub control_type: String,
    #[serde(default)]
    pub start_id: usize,
    /// Container whose focused item gates this menu's combined submenu include.
    #[serde(default)]
    pub container: String,
}

impl Menu {
    /// Id of the first item. `start_id` only applies to control menus.
    pub fn first_id(&self) -> usize {
        if self.control_type.is_empty() {
            1
        } else {
            self.start_id.max(1)
        }
    }
}

/// A property assignment: a literal `value` (which may carry `$PROPERTY[..]`
/// placeholders) or an indirection through `from_source`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateProperty {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub from_source: String,
    #[serde(default)]
    pub condition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVar {
    pub name: String,
    pub values: Vec<TemplateProperty>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateOutput {
    pub include: String,
    #[serde(default)]
    pub id_prefix: String,
    #[serde(default)]
    pub suffix: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateOnly {
    #[default]
    Never,
    Always,
    Auto,
}

impl TemplateOnly {
    pub fn from_attr(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Self::Always,
            "auto" => Self::Auto,
            _ => Self::Never,
        }
    }
}

/// Reference from a template to a named preset, preset group, property
/// group or variable group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub condition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub include: String,
    #[serde(default)]
    pub id_prefix: String,
    #[serde(default)]
    pub template_only: TemplateOnly,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<TemplateOutput>,
    #[serde(default)]
    pub properties: Vec<TemplateProperty>,
    #[serde(default)]
    pub vars: Vec<TemplateVar>,
    #[serde(default)]
    pub preset_refs: Vec<Reference>,
    #[serde(default)]
    pub preset_group_refs: Vec<Reference>,
    #[serde(default)]
    pub property_group_refs: Vec<Reference>,
    #[serde(default)]
    pub controls: Option<MarkupElement>,
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
    #[serde(default)]
    pub variable_group_refs: Vec<Reference>,
}

impl Template {
    /// Declared outputs, or the single implicit output of a template that
    /// declares none.
    pub fn outputs(&self) -> Vec<TemplateOutput> {
        if !self.outputs.is_empty() {
            return self.outputs.clone();
        }
        vec![TemplateOutput {
            include: self.include.clone(),
            id_prefix: self.id_prefix.clone(),
            suffix: String::new(),
        }]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetRow {
    #[serde(default)]
    pub condition: String,
    pub values: PropertyMap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub rows: Vec<PresetRow>,
}

/// One child of a preset group: either a preset reference or an inline
/// value bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetGroupChild {
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub values: PropertyMap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetGroup {
    pub name: String,
    pub children: Vec<PresetGroupChild>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyGroup {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<TemplateProperty>,
    #[serde(default)]
    pub vars: Vec<TemplateVar>,
}

/// Named condition fragment referenced as `$EXP[name]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expression {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub no_suffix: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludeDefinition {
    pub name: String,
    pub controls: MarkupElement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub output: String,
    pub content: MarkupElement,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableReference {
    pub name: String,
    #[serde(default)]
    pub condition: String,
}

/// Nested variable group reference; an empty suffix inherits the parent's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableGroupLink {
    pub name: String,
    #[serde(default)]
    pub suffix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableGroup {
    pub name: String,
    #[serde(default)]
    pub references: Vec<VariableReference>,
    #[serde(default)]
    pub group_refs: Vec<VariableGroupLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSchema {
    pub expressions: BTreeMap<String, Expression>,
    pub presets: BTreeMap<String, Preset>,
    pub preset_groups: BTreeMap<String, PresetGroup>,
    pub property_groups: BTreeMap<String, PropertyGroup>,
    pub includes: BTreeMap<String, IncludeDefinition>,
    pub variable_definitions: BTreeMap<String, VariableDefinition>,
    pub variable_groups: BTreeMap<String, VariableGroup>,
    pub templates: Vec<Template>,
}

impl TemplateSchema {
    pub fn expression(&self, name: &str) -> Option<&Expression> {
        self.expressions.get(name)
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    pub fn preset_group(&self, name: &str) -> Option<&PresetGroup> {
        self.preset_groups.get(name)
    }

    pub fn property_group(&self, name: &str) -> Option<&PropertyGroup> {
        self.property_groups.get(name)
    }

    pub fn include(&self, name: &str) -> Option<&IncludeDefinition> {
        self.includes.get(name)
    }

    pub fn variable_definition(&self, name: &str) -> Option<&VariableDefinition> {
        self.variable_definitions.get(name)
    }

    pub fn variable_group(&self, name: &str) -> Option<&VariableGroup> {
        self.variable_groups.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRule {
    pub value: String,
    #[serde(default)]
    pub condition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFallback {
    pub property: String,
    pub rules: Vec<FallbackRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub fallbacks: BTreeMap<String, PropertyFallback>,
}
