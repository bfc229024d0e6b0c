use sm_core::{MarkupElement, MarkupNode, MarkupText, MenuItem, PropertyMap};

use crate::placeholders::{split_include_refs, substitute_properties, TextSegment};
use crate::session::BuildSession;

pub const MAX_INCLUDE_DEPTH: usize = 16;

impl<'a> BuildSession<'a> {
    /// Rebuilds a template fragment for one entry: placeholders are
    /// substituted, `<skinshortcuts>` directives are resolved and pruned
    /// nodes are simply left out of the rebuilt tree.
    pub fn expand_output(
        &mut self,
        fragment: &MarkupElement,
        context: &PropertyMap,
        entry: &MenuItem,
    ) -> Option<MarkupElement> {
        let mut nodes = self.expand_element(fragment, context, entry, 0);
        match nodes.len() {
            0 => None,
            1 => match nodes.pop() {
                Some(MarkupNode::Element(element)) => Some(element),
                Some(text) => Some(MarkupElement {
                    name: fragment.name.clone(),
                    attributes: Default::default(),
                    children: vec![text],
                    location: fragment.location.clone(),
                }),
                None => None,
            },
            _ => Some(MarkupElement {
                name: fragment.name.clone(),
                attributes: Default::default(),
                children: nodes,
                location: fragment.location.clone(),
            }),
        }
    }

    /// Nodes replacing `element` in its parent: none when pruned, several
    /// when an include is spliced in place.
    fn expand_element(
        &mut self,
        element: &MarkupElement,
        context: &PropertyMap,
        entry: &MenuItem,
        depth: usize,
    ) -> Vec<MarkupNode> {
        if element.name == "skinshortcuts" {
            if let Some(include) = element.attr("include") {
                return self.expand_include_directive(element, include, context, entry, depth);
            }
            if element.text_content().trim() == "visibility" {
                let visible = format!(
                    "String.IsEqual(Container({}).ListItem.Property(name),{})",
                    self.options.container, entry.name
                );
                let mut replacement = MarkupElement::new("visible").with_text(visible);
                replacement.location = element.location.clone();
                return vec![MarkupNode::Element(replacement)];
            }
        }

        let attributes = element
            .attributes
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    substitute_properties(value, context, &entry.properties),
                )
            })
            .collect();

        vec![MarkupNode::Element(MarkupElement {
            name: element.name.clone(),
            attributes,
            children: self.expand_children(&element.children, context, entry, depth),
            location: element.location.clone(),
        })]
    }

    fn expand_children(
        &mut self,
        children: &[MarkupNode],
        context: &PropertyMap,
        entry: &MenuItem,
        depth: usize,
    ) -> Vec<MarkupNode> {
        let mut expanded = Vec::with_capacity(children.len());
        for child in children {
            match child {
                MarkupNode::Element(element) => {
                    expanded.extend(self.expand_element(element, context, entry, depth));
                }
                MarkupNode::Text(text) => {
                    let value = substitute_properties(&text.value, context, &entry.properties);
                    expanded.extend(text_with_includes(&value, text));
                }
            }
        }
        expanded
    }

    fn expand_include_directive(
        &mut self,
        directive: &MarkupElement,
        include: &str,
        context: &PropertyMap,
        entry: &MenuItem,
        depth: usize,
    ) -> Vec<MarkupNode> {
        if let Some(condition) = directive.attr("condition") {
            if !self.eval_condition(condition, &entry.properties, context) {
                return Vec::new();
            }
        }

        let name = substitute_properties(include, context, &entry.properties);
        if depth >= MAX_INCLUDE_DEPTH {
            self.diagnostics.push(
                "INCLUDE_DEPTH",
                format!("Include \"{name}\" exceeds the maximum nesting depth of {MAX_INCLUDE_DEPTH}."),
            );
            return Vec::new();
        }
        let schema = self.schema;
        let Some(definition) = schema.include(&name) else {
            self.diagnostics.push(
                "INCLUDE_UNKNOWN",
                format!("Include \"{name}\" is not defined."),
            );
            return Vec::new();
        };

        log::trace!("expanding include {name} at depth {depth}");
        let children = self.expand_children(&definition.controls.children, context, entry, depth + 1);

        let wrap = directive
            .attr("wrap")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
        if !wrap {
            return children;
        }
        let mut wrapper = MarkupElement::new("include").with_attr("name", name);
        wrapper.children = children;
        wrapper.location = directive.location.clone();
        vec![MarkupNode::Element(wrapper)]
    }
}

/// Turns `$INCLUDE[name]` inside text into `<include>name</include>`.
fn text_with_includes(value: &str, original: &MarkupText) -> Vec<MarkupNode> {
    if !value.contains("$INCLUDE[") {
        return vec![MarkupNode::Text(MarkupText {
            value: value.to_string(),
            location: original.location.clone(),
        })];
    }
    split_include_refs(value)
        .into_iter()
        .map(|segment| match segment {
            TextSegment::Text(text) => MarkupNode::Text(MarkupText {
                value: text.to_string(),
                location: original.location.clone(),
            }),
            TextSegment::Include(name) => {
                let mut include = MarkupElement::new("include").with_text(name);
                include.location = original.location.clone();
                MarkupNode::Element(include)
            }
        })
        .collect()
}
