//! `<emu-alg>` rendering.
//!
//! Algorithm bodies are Markdown ordered lists. Step nesting is detected from
//! the smallest indentation step used in the block, so both two- and
//! four-space styles produce nested lists.

use std::sync::LazyLock;

use pulldown_cmark::{Parser, html};
use regex::Regex;

use crate::tree::Node;
use crate::util::dedent;

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([A-Za-z][A-Za-z0-9]*)_\b").unwrap());
static VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^\s*][^*\n]*?)\*").unwrap());
static CONSTANT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~([A-Za-z][\w-]*)~").unwrap());
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+\.|[*-])\s").unwrap());

/// Indentation per nesting level fed to the Markdown parser.
const NESTED_INDENT: usize = 4;

pub(crate) fn render_algorithms(nodes: &mut [Node]) {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };
        if element.is("emu-alg") {
            let html = render_steps(&element.inner_html());
            element.children = vec![Node::Text(html)];
        } else {
            render_algorithms(&mut element.children);
        }
    }
}

/// Render one algorithm body to HTML.
pub(crate) fn render_steps(source: &str) -> String {
    let text = normalize_indent(&dedent(source));
    let text = expand_shorthand(&text);

    let mut out = String::with_capacity(text.len() * 2);
    html::push_html(&mut out, Parser::new(&text));
    out
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_step(line: &str) -> bool {
    LIST_MARKER.is_match(line.trim_start())
}

fn normalize_indent(text: &str) -> String {
    let unit = text
        .lines()
        .filter(|l| is_step(l))
        .map(indent_of)
        .filter(|&i| i > 0)
        .min();

    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else if is_step(line) {
                let depth = unit.map_or(0, |unit| indent_of(line) / unit);
                format!("{}{}", " ".repeat(depth * NESTED_INDENT), line.trim_start())
            } else {
                // Lazy continuation of the previous step.
                line.trim_start().to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn expand_shorthand(text: &str) -> String {
    let text = VARIABLE.replace_all(text, "<var>$1</var>");
    let text = VALUE.replace_all(&text, "<emu-val>$1</emu-val>");
    CONSTANT
        .replace_all(&text, "<emu-const>$1</emu-const>")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_steps() {
        let html = render_steps("\n  1. Let _x_ be 1.\n  1. Return _x_.\n");
        assert_eq!(
            html,
            "<ol>\n<li>Let <var>x</var> be 1.</li>\n<li>Return <var>x</var>.</li>\n</ol>\n"
        );
    }

    #[test]
    fn test_two_space_nesting() {
        let html = render_steps("1. If *true*, then\n  1. Return ~empty~.\n1. Done.");
        assert_eq!(
            html,
            "<ol>\n<li>If <emu-val>true</emu-val>, then\n<ol>\n<li>Return <emu-const>empty</emu-const>.</li>\n</ol>\n</li>\n<li>Done.</li>\n</ol>\n"
        );
    }

    #[test]
    fn test_four_space_nesting() {
        let two = render_steps("1. A\n  1. B\n    1. C");
        let four = render_steps("1. A\n    1. B\n        1. C");
        assert_eq!(two, four);
        assert_eq!(two.matches("<ol>").count(), 3);
    }

    #[test]
    fn test_identifiers_with_underscores_are_untouched() {
        assert_eq!(expand_shorthand("snake_case_name"), "snake_case_name");
    }

    #[test]
    fn test_inline_html_passes_through() {
        let html = render_steps("1. See <a href=\"#sec-a\">1.2</a>.");
        assert_eq!(html, "<ol>\n<li>See <a href=\"#sec-a\">1.2</a>.</li>\n</ol>\n");
    }

    #[test]
    fn test_render_algorithms_replaces_body() {
        use std::path::Path;
        use std::sync::Arc;

        let mut nodes = crate::tree::parse(
            "<emu-alg>\n  1. Return.\n</emu-alg>",
            &Arc::from(Path::new("index.html")),
        )
        .unwrap();
        render_algorithms(&mut nodes);
        let mut out = String::new();
        crate::tree::serialize(&nodes, &mut out);
        assert_eq!(out, "<emu-alg><ol>\n<li>Return.</li>\n</ol>\n</emu-alg>");
    }
}
