use sm_core::{MarkupElement, SkinMenuError};

pub(crate) fn get_optional_attr(node: &MarkupElement, name: &str) -> Option<String> {
    node.attributes.get(name).cloned()
}

pub(crate) fn attr_or_empty(node: &MarkupElement, name: &str) -> String {
    get_optional_attr(node, name).unwrap_or_default()
}

pub(crate) fn get_required_non_empty_attr(
    node: &MarkupElement,
    name: &str,
) -> Result<String, SkinMenuError> {
    let Some(raw) = node.attributes.get(name) else {
        return Err(SkinMenuError::with_span(
            "XML_MISSING_ATTR",
            format!("Missing required attribute \"{}\" on <{}>.", name, node.name),
            node.location.clone(),
        ));
    };

    if raw.trim().is_empty() {
        return Err(SkinMenuError::with_span(
            "XML_EMPTY_ATTR",
            format!("Attribute \"{}\" on <{}> cannot be empty.", name, node.name),
            node.location.clone(),
        ));
    }

    Ok(raw.trim().to_string())
}

pub(crate) fn parse_bool_attr(node: &MarkupElement, name: &str) -> bool {
    node.attr(name)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

/// Trimmed direct text of `node`.
pub(crate) fn inline_text(node: &MarkupElement) -> String {
    node.text_content().trim().to_string()
}

/// Children named `item` found either inside a `section` wrapper or
/// directly under `root`.
pub(crate) fn section_items<'a>(
    root: &'a MarkupElement,
    section: &str,
    item: &str,
) -> Vec<&'a MarkupElement> {
    let mut found = Vec::new();
    for child in root.element_children() {
        if child.name == section {
            found.extend(child.element_children().filter(|entry| entry.name == item));
        } else if child.name == item {
            found.push(child);
        }
    }
    found
}

pub(crate) fn ensure_root(root: &MarkupElement, expected: &str) -> Result<(), SkinMenuError> {
    if root.name == expected {
        return Ok(());
    }
    Err(SkinMenuError::with_span(
        "XML_ROOT_INVALID",
        format!("Expected <{expected}> root element but found <{}>.", root.name),
        root.location.clone(),
    ))
}
