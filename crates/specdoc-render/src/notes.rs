//! `<emu-note>` labelling.
//!
//! A note gets a `Note` label, numbered when its section holds more than one
//! note. Sections nested inside a section count their notes separately.

use crate::tree::{Element, Node};

pub(crate) fn label_notes(nodes: &mut [Node]) {
    let total = count(nodes);
    let mut index = 0;
    label(nodes, total, &mut index);
}

fn is_section(element: &Element) -> bool {
    matches!(
        element.name.as_str(),
        "emu-clause" | "emu-annex" | "emu-intro"
    )
}

fn count(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Element(e) if e.is("emu-note") => 1,
            Node::Element(e) if is_section(e) => 0,
            Node::Element(e) => count(&e.children),
            _ => 0,
        })
        .sum()
}

fn label(nodes: &mut [Node], total: usize, index: &mut usize) {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };
        if element.is("emu-note") {
            *index += 1;
            wrap_note(element, total, *index);
        } else if is_section(element) {
            label_notes(&mut element.children);
        } else {
            label(&mut element.children, total, index);
        }
    }
}

fn wrap_note(note: &mut Element, total: usize, index: usize) {
    let kind = if note.attr("type") == Some("editor") {
        "Editor's Note"
    } else {
        "Note"
    };
    let text = if total > 1 {
        format!("{kind} {index}")
    } else {
        kind.to_owned()
    };

    let span = note.span.clone();
    let contents = std::mem::take(&mut note.children);
    note.children = vec![
        Node::Element(
            Element::new("span", span.clone())
                .with_attr("class", "note")
                .with_children(vec![Node::Text(text)]),
        ),
        Node::Element(
            Element::new("div", span)
                .with_attr("class", "note-contents")
                .with_children(contents),
        ),
    ];
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::tree;
    use pretty_assertions::assert_eq;

    fn render(src: &str) -> String {
        let mut nodes = tree::parse(src, &Arc::from(Path::new("index.html"))).unwrap();
        label_notes(&mut nodes);
        let mut out = String::new();
        tree::serialize(&nodes, &mut out);
        out
    }

    #[test]
    fn test_single_note_is_unnumbered() {
        assert_eq!(
            render("<emu-note>Careful.</emu-note>"),
            "<emu-note><span class=\"note\">Note</span><div class=\"note-contents\">Careful.</div></emu-note>"
        );
    }

    #[test]
    fn test_multiple_notes_are_numbered_per_section() {
        let out = render(
            "<emu-clause><emu-note>a</emu-note><div><emu-note>b</emu-note></div>\
             <emu-clause><emu-note>c</emu-note></emu-clause></emu-clause>",
        );
        assert!(out.contains("<span class=\"note\">Note 1</span><div class=\"note-contents\">a"));
        assert!(out.contains("<span class=\"note\">Note 2</span><div class=\"note-contents\">b"));
        assert!(out.contains("<span class=\"note\">Note</span><div class=\"note-contents\">c"));
    }

    #[test]
    fn test_editor_note() {
        let out = render("<emu-note type=editor>TBD</emu-note>");
        assert!(out.contains("<span class=\"note\">Editor's Note</span>"));
    }
}
