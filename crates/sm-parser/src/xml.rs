use std::collections::BTreeMap;

use roxmltree::{Document, Node, NodeType};
use sm_core::{
    MarkupElement, MarkupNode, MarkupText, SkinMenuError, SourceLocation, SourceSpan,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupDocument {
    pub root: MarkupElement,
}

/// Parses schema or menu XML into a markup tree. Whitespace-only text nodes
/// between elements are dropped; every other text node is kept verbatim.
pub fn parse_xml_document(source: &str) -> Result<MarkupDocument, SkinMenuError> {
    let document = Document::parse(source)
        .map_err(|error| SkinMenuError::new("XML_PARSE_ERROR", error.to_string()))?;

    let Some(root) = document.root().children().find(|node| node.is_element()) else {
        return Err(SkinMenuError::new(
            "XML_PARSE_ERROR",
            "XML document must contain a root element.",
        ));
    };

    Ok(MarkupDocument {
        root: parse_element(&document, root),
    })
}

fn parse_element(document: &Document<'_>, node: Node<'_, '_>) -> MarkupElement {
    let mut attributes = BTreeMap::new();
    for attribute in node.attributes() {
        attributes.insert(attribute.name().to_string(), attribute.value().to_string());
    }

    let mut children = Vec::new();
    for child in node.children() {
        match child.node_type() {
            NodeType::Element => children.push(MarkupNode::Element(parse_element(document, child))),
            NodeType::Text => {
                let value = child.text().unwrap_or_default().to_string();
                if value.trim().is_empty() {
                    continue;
                }
                children.push(MarkupNode::Text(MarkupText {
                    value,
                    location: node_span(document, child.range().start, child.range().end),
                }));
            }
            _ => {}
        }
    }

    MarkupElement {
        name: node.tag_name().name().to_string(),
        attributes,
        children,
        location: node_span(document, node.range().start, node.range().end),
    }
}

fn node_span(document: &Document<'_>, start: usize, end: usize) -> SourceSpan {
    let start_pos = document.text_pos_at(start);
    let end_pos = document.text_pos_at(end);
    SourceSpan {
        start: SourceLocation {
            line: start_pos.row as usize,
            column: start_pos.col as usize,
        },
        end: SourceLocation {
            line: end_pos.row as usize,
            column: end_pos.col as usize,
        },
    }
}
