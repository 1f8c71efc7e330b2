//! Document metadata from `<pre class="metadata">`.

use serde::Deserialize;

use crate::error::RenderError;
use crate::tree::{Element, Node};
use crate::util::dedent;

/// Front matter of a specification document.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document status (e.g. "proposal", "draft", "standard").
    pub status: Option<String>,
    /// Proposal stage; numbers and strings are both accepted.
    pub stage: Option<serde_yaml::Value>,
    /// Short name used in the page header.
    pub shortname: Option<String>,
    /// Contributors shown in the footer.
    pub contributors: Option<String>,
    /// Copyright notice shown in the footer.
    pub copyright: Option<String>,
    /// Whether to generate a table of contents.
    pub toc: Option<bool>,
}

impl Metadata {
    /// Stage rendered as text.
    pub fn stage_label(&self) -> Option<String> {
        match self.stage.as_ref()? {
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn toc_enabled(&self) -> bool {
        self.toc.unwrap_or(true)
    }
}

/// Remove the first top-level metadata block from `nodes` and parse it.
///
/// Only blocks outside of sections are considered, matching where authors
/// put front matter.
pub(crate) fn extract(nodes: &mut Vec<Node>) -> Result<Metadata, RenderError> {
    let Some(index) = nodes.iter().position(is_metadata_block) else {
        return Ok(Metadata::default());
    };
    match nodes.remove(index) {
        Node::Element(pre) => parse(&pre),
        _ => Ok(Metadata::default()),
    }
}

fn is_metadata_block(node: &Node) -> bool {
    matches!(node, Node::Element(e) if e.is("pre") && e.has_class("metadata"))
}

fn parse(pre: &Element) -> Result<Metadata, RenderError> {
    let text = dedent(&pre.text_content());
    if text.trim().is_empty() {
        return Ok(Metadata::default());
    }
    serde_yaml::from_str(&text).map_err(|e| RenderError::Metadata {
        file: pre.span.file.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::tree;

    fn parse_nodes(src: &str) -> Vec<Node> {
        tree::parse(src, &Arc::from(Path::new("index.html"))).unwrap()
    }

    #[test]
    fn test_extract_metadata() {
        let mut nodes = parse_nodes(
            "<pre class=metadata>\n  title: Array Grouping\n  stage: 3\n  contributors: Jane Doe\n</pre><p>body</p>",
        );

        let metadata = extract(&mut nodes).unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Array Grouping"));
        assert_eq!(metadata.stage_label().as_deref(), Some("3"));
        assert_eq!(metadata.contributors.as_deref(), Some("Jane Doe"));
        assert!(metadata.toc_enabled());
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_copyright_is_parsed() {
        let mut nodes = parse_nodes("<pre class=metadata>copyright: 2026 Ecma International</pre>");

        let metadata = extract(&mut nodes).unwrap();

        assert_eq!(metadata.copyright.as_deref(), Some("2026 Ecma International"));
    }

    #[test]
    fn test_no_metadata_block() {
        let mut nodes = parse_nodes("<p>body</p>");
        assert_eq!(extract(&mut nodes).unwrap(), Metadata::default());
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_empty_metadata_block() {
        let mut nodes = parse_nodes("<pre class=metadata>\n</pre>");
        assert_eq!(extract(&mut nodes).unwrap(), Metadata::default());
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_toc_can_be_disabled() {
        let mut nodes = parse_nodes("<pre class=metadata>toc: false</pre>");
        assert!(!extract(&mut nodes).unwrap().toc_enabled());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let mut nodes = parse_nodes("<pre class=metadata>title: [unclosed</pre>");
        let err = extract(&mut nodes).unwrap_err();
        assert!(matches!(err, RenderError::Metadata { .. }));
    }

    #[test]
    fn test_plain_pre_is_not_metadata() {
        let mut nodes = parse_nodes("<pre>title: X</pre>");
        assert_eq!(extract(&mut nodes).unwrap(), Metadata::default());
        assert_eq!(nodes.len(), 1);
    }
}
