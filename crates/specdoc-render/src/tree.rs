//! Document tree built from tokens.
//!
//! The tree keeps text verbatim: a [`Node::Text`] holds source HTML text, not
//! decoded characters, so it is written back unescaped.

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use crate::error::RenderError;
use crate::tokenizer::{self, LineIndex, Token};

pub(crate) use crate::tokenizer::Attribute;

/// Elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose end tag may be omitted.
const OPTIONAL_END: &[&str] = &[
    "body", "colgroup", "dd", "dt", "head", "html", "li", "option", "p", "tbody", "td", "tfoot",
    "th", "thead", "tr",
];

/// Elements that implicitly close an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "div",
    "dl",
    "emu-alg",
    "emu-annex",
    "emu-clause",
    "emu-example",
    "emu-figure",
    "emu-grammar",
    "emu-import",
    "emu-intro",
    "emu-note",
    "emu-table",
    "fieldset",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

/// Source position of an element's start tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Span {
    pub file: Arc<Path>,
    pub line: usize,
    pub column: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    Doctype(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    pub span: Span,
}

impl Element {
    pub(crate) fn new(name: &str, span: Span) -> Self {
        Self {
            name: name.to_owned(),
            attrs: Vec::new(),
            children: Vec::new(),
            span,
        }
    }

    pub(crate) fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub(crate) fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub(crate) fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Attribute value; `Some("")` for boolean attributes.
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            attr.value = Some(value.to_owned());
        } else {
            self.attrs.push(Attribute {
                name: name.to_owned(),
                value: Some(value.to_owned()),
            });
        }
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendant text nodes.
    pub(crate) fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub(crate) fn inner_html(&self) -> String {
        let mut out = String::new();
        serialize(&self.children, &mut out);
        out
    }

    pub(crate) fn first_child_element_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(e) if e.is(name) => Some(e),
            _ => None,
        })
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
            Node::Comment(_) | Node::Doctype(_) => {}
        }
    }
}

/// Visit every element depth-first, parents before children.
pub(crate) fn walk<'a>(nodes: &'a [Node], f: &mut impl FnMut(&'a Element)) {
    for node in nodes {
        if let Node::Element(e) = node {
            f(e);
            walk(&e.children, f);
        }
    }
}

/// Parse markup into a node list.
pub(crate) fn parse(src: &str, file: &Arc<Path>) -> Result<Vec<Node>, RenderError> {
    let index = LineIndex::new(src);
    let span_at = |offset: usize| {
        let (line, column) = index.locate(src, offset);
        Span {
            file: Arc::clone(file),
            line,
            column,
        }
    };

    let tokens = tokenizer::tokenize(src)
        .map_err(|e| RenderError::markup(&span_at(e.offset), e.message))?;

    let mut builder = TreeBuilder::default();
    for token in tokens {
        match token {
            Token::Text(text) => builder.append(Node::Text(text)),
            Token::Comment(text) => builder.append(Node::Comment(text)),
            Token::Doctype(text) => builder.append(Node::Doctype(text)),
            Token::StartTag {
                name,
                attrs,
                self_closing,
                offset,
            } => {
                builder.close_implied_by(&name);
                let element = Element {
                    name,
                    attrs,
                    children: Vec::new(),
                    span: span_at(offset),
                };
                if self_closing || element.is_void() {
                    builder.append(Node::Element(element));
                } else {
                    builder.open.push(element);
                }
            }
            Token::EndTag { name, offset } => builder.close(&name, &span_at(offset))?,
        }
    }
    builder.finish()
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn close_top(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
    }

    /// Close open elements whose end tag is implied by a new start tag.
    fn close_implied_by(&mut self, new: &str) {
        while let Some(top) = self.open.last() {
            let implied = match top.name.as_str() {
                "p" => CLOSES_PARAGRAPH.contains(&new),
                "li" | "option" => top.name == new,
                "dt" | "dd" => matches!(new, "dt" | "dd"),
                "tr" => matches!(new, "tr" | "tbody" | "tfoot" | "thead"),
                "td" | "th" => matches!(new, "td" | "th" | "tr" | "tbody" | "tfoot" | "thead"),
                "thead" | "tbody" => matches!(new, "tbody" | "tfoot"),
                _ => false,
            };
            if !implied {
                break;
            }
            self.close_top();
        }
    }

    fn close(&mut self, name: &str, span: &Span) -> Result<(), RenderError> {
        if VOID_ELEMENTS.contains(&name) {
            return Ok(());
        }
        if !self.open.iter().any(|e| e.name == name) {
            return Err(RenderError::markup(
                span,
                format!("unexpected end tag </{name}>"),
            ));
        }
        while let Some(top) = self.open.last() {
            if top.name == name {
                self.close_top();
                return Ok(());
            }
            if !OPTIONAL_END.contains(&top.name.as_str()) {
                return Err(RenderError::markup(
                    &top.span,
                    format!("<{}> is not closed before </{name}>", top.name),
                ));
            }
            self.close_top();
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Node>, RenderError> {
        while let Some(top) = self.open.last() {
            if !OPTIONAL_END.contains(&top.name.as_str()) {
                return Err(RenderError::markup(
                    &top.span,
                    format!("unclosed <{}>", top.name),
                ));
            }
            self.close_top();
        }
        Ok(self.root)
    }
}

/// Write nodes back as HTML.
pub(crate) fn serialize(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Comment(text) => {
                let _ = write!(out, "<!--{text}-->");
            }
            Node::Doctype(text) => {
                let _ = write!(out, "<!{text}>");
            }
            Node::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for attr in &element.attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if let Some(value) = &attr.value {
                        let _ = write!(out, "=\"{}\"", value.replace('"', "&quot;"));
                    }
                }
                out.push('>');
                if !element.is_void() {
                    serialize(&element.children, out);
                    let _ = write!(out, "</{}>", element.name);
                }
            }
        }
    }
}
