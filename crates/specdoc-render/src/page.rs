//! Page assembly.
//!
//! Wraps the processed document body in a complete HTML page with the
//! header, table of contents and asset references.

use std::fmt::Write;

use crate::assets;
use crate::metadata::Metadata;
use crate::options::{AssetMode, RenderOptions};
use crate::sections::Section;
use crate::tree::{self, Node};
use crate::util::escape_html;

/// Elements moved into `<head>` when they appear at the top level.
const HEAD_ELEMENTS: &[&str] = &["base", "link", "meta", "style", "title"];

/// Split a parsed document into head and body content.
///
/// `<html>`, `<head>` and `<body>` wrappers are unwrapped. Doctypes, `<title>`
/// and `<meta charset>` are dropped since the page template supplies them.
pub(crate) fn split_head(nodes: Vec<Node>) -> (Vec<Node>, Vec<Node>) {
    let mut head = Vec::new();
    let mut body = Vec::new();
    split_into(nodes, &mut head, &mut body, false);
    (head, body)
}

fn split_into(nodes: Vec<Node>, head: &mut Vec<Node>, body: &mut Vec<Node>, in_head: bool) {
    for node in nodes {
        match node {
            Node::Doctype(_) => {}
            Node::Element(element) if element.is("html") || element.is("body") => {
                split_into(element.children, head, body, false);
            }
            Node::Element(element) if element.is("head") => {
                split_into(element.children, head, body, true);
            }
            Node::Element(element)
                if element.is("title") || (element.is("meta") && element.attr("charset").is_some()) => {}
            Node::Element(element)
                if in_head || HEAD_ELEMENTS.iter().any(|name| element.is(name)) =>
            {
                head.push(Node::Element(element));
            }
            // Whitespace between head elements.
            Node::Text(_) if in_head => {}
            Node::Text(text) if body.is_empty() && text.trim().is_empty() => {}
            other => body.push(other),
        }
    }
}

/// Inputs of the page template.
pub(crate) struct Page<'a> {
    pub head: &'a [Node],
    pub body: &'a [Node],
    pub metadata: &'a Metadata,
    pub outline: &'a [Section],
    pub options: &'a RenderOptions,
    /// Title used when neither metadata nor sections provide one.
    pub fallback_title: &'a str,
}

impl Page<'_> {
    pub(crate) fn render(&self) -> String {
        let mut out = String::with_capacity(8192);

        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
        let _ = writeln!(out, "<title>{}</title>", self.title());
        self.write_stylesheet(&mut out);
        for node in self.head {
            tree::serialize(std::slice::from_ref(node), &mut out);
            out.push('\n');
        }
        out.push_str("</head>\n<body>\n");

        if self.metadata.toc_enabled() && !self.outline.is_empty() {
            write_toc(self.outline, &mut out);
        }

        out.push_str("<div id=\"spec-container\">\n");
        self.write_header(&mut out);
        tree::serialize(self.body, &mut out);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        self.write_footer(&mut out);
        out.push_str("</div>\n");

        self.write_script(&mut out);
        out.push_str("</body>\n</html>\n");
        out
    }

    fn write_footer(&self, out: &mut String) {
        let contributors = self.metadata.contributors.as_deref();
        let copyright = self.metadata.copyright.as_deref();
        if contributors.is_none() && copyright.is_none() {
            return;
        }
        out.push_str("<footer>");
        if let Some(contributors) = contributors {
            let _ = write!(
                out,
                "<p class=\"contributors\">Contributors: {}</p>",
                escape_html(contributors)
            );
        }
        if let Some(copyright) = copyright {
            let _ = write!(
                out,
                "<p class=\"copyright\">&copy; {}</p>",
                escape_html(copyright)
            );
        }
        out.push_str("</footer>\n");
    }

    fn title(&self) -> String {
        if let Some(title) = &self.metadata.title {
            return escape_html(title);
        }
        match self.outline.first() {
            Some(section) => section.title_text.clone(),
            None => escape_html(self.fallback_title),
        }
    }

    fn write_header(&self, out: &mut String) {
        if let Some(title) = &self.metadata.title {
            let _ = writeln!(out, "<h1 class=\"title\">{}</h1>", escape_html(title));
        }
        let status: Vec<String> = [
            self.metadata.shortname.clone(),
            self.metadata.status.clone(),
            self.metadata.stage_label().map(|stage| format!("Stage {stage}")),
        ]
        .into_iter()
        .flatten()
        .map(|part| escape_html(&part))
        .collect();
        if !status.is_empty() {
            let _ = writeln!(out, "<p class=\"status\">{}</p>", status.join(" · "));
        }
    }

    fn write_stylesheet(&self, out: &mut String) {
        let Some(css) = &self.options.css else {
            return;
        };
        match self.options.assets {
            AssetMode::None => {}
            AssetMode::External => {
                let _ = writeln!(out, "<link rel=\"stylesheet\" href=\"{}\">", escape_html(css));
            }
            AssetMode::Inline => {
                let _ = writeln!(out, "<style>\n{}</style>", assets::STYLESHEET);
            }
        }
    }

    fn write_script(&self, out: &mut String) {
        let Some(js) = &self.options.js else {
            return;
        };
        match self.options.assets {
            AssetMode::None => {}
            AssetMode::External => {
                let _ = writeln!(out, "<script src=\"{}\"></script>", escape_html(js));
            }
            AssetMode::Inline => {
                let _ = writeln!(out, "<script>\n{}</script>", assets::SCRIPT);
            }
        }
    }
}

fn write_toc(outline: &[Section], out: &mut String) {
    out.push_str("<div id=\"toc\"><h2>Contents</h2>");
    write_toc_list(outline, out);
    out.push_str("</div>\n");
}

fn write_toc_list(sections: &[Section], out: &mut String) {
    out.push_str("<ol class=\"toc\">");
    for section in sections {
        let _ = write!(
            out,
            "<li><a href=\"#{}\" title=\"{}\">",
            section.id,
            section.title_text.replace('"', "&quot;")
        );
        if let Some(number) = &section.number {
            let _ = write!(out, "<span class=\"secnum\">{number}</span> ");
        }
        out.push_str(&section.title_html);
        out.push_str("</a>");
        if !section.children.is_empty() {
            write_toc_list(&section.children, out);
        }
        out.push_str("</li>");
    }
    out.push_str("</ol>");
}
