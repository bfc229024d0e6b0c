use sm_core::{MarkupElement, MarkupNode};

/// Serializes a markup tree as an XML document. Element-only content is
/// indented with tabs; text and mixed content stay on one line.
pub fn render_document(root: &MarkupElement) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_element(&mut out, root, 0);
    out.push('\n');
    out
}

fn write_element(out: &mut String, element: &MarkupElement, depth: usize) {
    push_indent(out, depth);
    write_open_tag(out, element);

    if element.children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');

    let has_text = element.children.iter().any(|child| match child {
        MarkupNode::Text(text) => !text.value.trim().is_empty(),
        MarkupNode::Element(_) => false,
    });

    if has_text {
        for child in &element.children {
            write_inline(out, child);
        }
    } else {
        for child in element.element_children() {
            out.push('\n');
            write_element(out, child, depth + 1);
        }
        out.push('\n');
        push_indent(out, depth);
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn write_inline(out: &mut String, node: &MarkupNode) {
    match node {
        MarkupNode::Text(text) => out.push_str(&xml_escape(&text.value)),
        MarkupNode::Element(element) => {
            write_open_tag(out, element);
            if element.children.is_empty() {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in &element.children {
                write_inline(out, child);
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

fn write_open_tag(out: &mut String, element: &MarkupElement) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&xml_escape(value));
        out.push('"');
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
