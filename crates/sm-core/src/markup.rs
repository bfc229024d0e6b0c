use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn synthetic() -> Self {
        Self {
            start: SourceLocation { line: 1, column: 1 },
            end: SourceLocation { line: 1, column: 1 },
        }
    }
}

/// A node of a markup fragment: schema content, expanded controls and the
/// generated includes document all share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(MarkupText),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<MarkupNode>,
    pub location: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupText {
    pub value: String,
    pub location: SourceSpan,
}

impl MarkupNode {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(MarkupText {
            value: value.into(),
            location: SourceSpan::synthetic(),
        })
    }

    pub fn as_element(&self) -> Option<&MarkupElement> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }
}

impl MarkupElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            location: SourceSpan::synthetic(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, value: impl Into<String>) -> Self {
        self.children.push(MarkupNode::text(value));
        self
    }

    pub fn with_child(mut self, child: MarkupElement) -> Self {
        self.children.push(MarkupNode::Element(child));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn element_children(&self) -> impl Iterator<Item = &MarkupElement> {
        self.children.iter().filter_map(MarkupNode::as_element)
    }

    pub fn first_child(&self, name: &str) -> Option<&MarkupElement> {
        self.element_children().find(|child| child.name == name)
    }

    /// Concatenated direct text content.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|entry| match entry {
                MarkupNode::Text(text) => Some(text.value.as_str()),
                MarkupNode::Element(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn has_element_children(&self) -> bool {
        self.element_children().next().is_some()
    }
}

#[cfg(test)]
mod markup_tests {
    use super::*;

    #[test]
    fn builders_compose_tree() {
        let element = MarkupElement::new("control")
            .with_attr("type", "image")
            .with_child(MarkupElement::new("texture").with_text("a.png"))
            .with_text(" tail");

        assert_eq!(element.attr("type"), Some("image"));
        assert_eq!(element.element_children().count(), 1);
        assert_eq!(
            element.first_child("texture").map(MarkupElement::text_content),
            Some("a.png".to_string())
        );
        assert_eq!(element.text_content(), " tail");
        assert!(element.has_element_children());
    }

    #[test]
    fn markup_node_serializes_with_kind_tag() {
        let node = MarkupNode::text("x");
        let json = serde_json::to_value(&node).expect("node should serialize");
        assert_eq!(json["kind"], "text");
        assert_eq!(json["value"], "x");
    }
}
