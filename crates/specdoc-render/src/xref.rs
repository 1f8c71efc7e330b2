//! `<emu-xref>` resolution.

use std::collections::HashMap;

use crate::error::RenderError;
use crate::sections::Target;
use crate::tree::{Element, Node};

/// Replace every `<emu-xref href="#id">` with a link to its target.
///
/// Empty references get the target's label: the section number for
/// sections, the element text otherwise. References to other documents
/// (`href` not starting with `#`) are linked without validation.
pub(crate) fn resolve(
    nodes: &mut [Node],
    targets: &HashMap<String, Target>,
) -> Result<(), RenderError> {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };
        resolve(&mut element.children, targets)?;
        if !element.is("emu-xref") {
            continue;
        }

        let href = element
            .attr("href")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RenderError::markup(&element.span, "<emu-xref> requires an href attribute"))?
            .to_owned();

        let mut children = std::mem::take(&mut element.children);
        if let Some(id) = href.strip_prefix('#') {
            let target = targets.get(id).ok_or_else(|| RenderError::UnknownReference {
                id: id.to_owned(),
                file: element.span.file.to_path_buf(),
                line: element.span.line,
                column: element.span.column,
            })?;
            if is_blank(&children) {
                let label = target
                    .section_label
                    .clone()
                    .filter(|l| !l.is_empty())
                    .or_else(|| Some(target.text.clone()).filter(|t| !t.is_empty()))
                    .unwrap_or_else(|| id.to_owned());
                children = vec![Node::Text(label)];
            }
        }

        *node = Node::Element(
            Element::new("a", element.span.clone())
                .with_attr("href", &href)
                .with_children(children),
        );
    }
    Ok(())
}

fn is_blank(nodes: &[Node]) -> bool {
    nodes.iter().all(|n| match n {
        Node::Text(t) => t.trim().is_empty(),
        Node::Comment(_) => true,
        Node::Element(_) | Node::Doctype(_) => false,
    })
}
