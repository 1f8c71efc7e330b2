//! Section numbering, ids and the reference target table.
//!
//! `<emu-clause>` and `<emu-annex>` elements form the section tree. Top-level
//! clauses are numbered `1`, `2`, ...; top-level annexes `A`, `B`, ...; nested
//! sections append `.n` to their parent's number. `<emu-intro>` sections and
//! everything inside them are unnumbered.

use std::collections::HashMap;

use crate::error::RenderError;
use crate::tree::{self, Element, Node, Span};
use crate::util::{collapse_whitespace, slugify};

/// Kind of section element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionKind {
    Intro,
    Clause,
    Annex,
}

impl SectionKind {
    fn of(element: &Element) -> Option<Self> {
        match element.name.as_str() {
            "emu-intro" => Some(Self::Intro),
            "emu-clause" => Some(Self::Clause),
            "emu-annex" => Some(Self::Annex),
            _ => None,
        }
    }
}

/// A numbered section in the document outline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub kind: SectionKind,
    /// Section number (`"2.1"`, `"A"`), `None` for unnumbered sections.
    pub number: Option<String>,
    /// Heading markup without the section number.
    pub title_html: String,
    /// Heading text without markup.
    pub title_text: String,
    pub children: Vec<Section>,
}

impl Section {
    /// Text used for a cross-reference to this section.
    pub fn reference_label(&self) -> String {
        match (&self.number, self.kind) {
            (Some(number), SectionKind::Annex) if !number.contains('.') => {
                format!("Annex {number}")
            }
            (Some(number), _) => number.clone(),
            (None, _) => self.title_html.clone(),
        }
    }
}

/// Something an `#id` reference can point at.
#[derive(Debug)]
pub(crate) struct Target {
    /// Label for sections, `None` for other elements.
    pub section_label: Option<String>,
    /// Collapsed text content of the target element.
    pub text: String,
}

/// Number every section and build the outline.
pub(crate) fn number_sections(nodes: &mut [Node]) -> Result<Vec<Section>, RenderError> {
    let mut outline = Vec::new();
    let mut counters = Counters::default();
    number_level(nodes, None, true, &mut counters, &mut outline)?;
    Ok(outline)
}

#[derive(Default)]
struct Counters {
    clauses: usize,
    annexes: usize,
}

fn number_level(
    nodes: &mut [Node],
    parent: Option<&str>,
    numbered: bool,
    counters: &mut Counters,
    out: &mut Vec<Section>,
) -> Result<(), RenderError> {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };
        let Some(kind) = SectionKind::of(element) else {
            // Non-section wrappers (`<emu-import>`, `<div>`) are transparent.
            number_level(&mut element.children, parent, numbered, counters, out)?;
            continue;
        };

        let number = if !numbered || kind == SectionKind::Intro {
            None
        } else if let Some(parent) = parent {
            counters.clauses += 1;
            Some(format!("{parent}.{}", counters.clauses))
        } else if kind == SectionKind::Annex {
            counters.annexes += 1;
            Some(annex_letter(counters.annexes))
        } else {
            counters.clauses += 1;
            Some(counters.clauses.to_string())
        };

        let mut section = label_section(element, kind, number)?;
        let mut child_counters = Counters::default();
        number_level(
            &mut element.children,
            section.number.as_deref(),
            section.number.is_some(),
            &mut child_counters,
            &mut section.children,
        )?;
        out.push(section);
    }
    Ok(())
}

/// Assign the id and heading number of one section element.
fn label_section(
    element: &mut Element,
    kind: SectionKind,
    number: Option<String>,
) -> Result<Section, RenderError> {
    let span = element.span.clone();
    let name = element.name.clone();
    let heading = element
        .first_child_element_mut("h1")
        .ok_or_else(|| RenderError::markup(&span, format!("<{name}> has no <h1> heading")))?;

    let title_html = collapse_whitespace(&heading.inner_html());
    let title_text = collapse_whitespace(&heading.text_content());

    if let Some(number) = &number {
        let secnum = Element::new("span", heading.span.clone())
            .with_attr("class", "secnum")
            .with_children(vec![Node::Text(number.clone())]);
        heading.children.insert(0, Node::Text(" ".to_owned()));
        heading.children.insert(0, Node::Element(secnum));
    }

    let id = match element.attr("id").filter(|id| !id.is_empty()) {
        Some(id) => id.to_owned(),
        None => {
            let slug = slugify(&title_text);
            if slug.is_empty() {
                return Err(RenderError::markup(
                    &span,
                    format!("<{name}> needs an id attribute"),
                ));
            }
            let id = format!("sec-{slug}");
            element.set_attr("id", &id);
            id
        }
    };

    Ok(Section {
        id,
        kind,
        number,
        title_html,
        title_text,
        children: Vec::new(),
    })
}

/// Bijective base-26 letters: 1 → A, 26 → Z, 27 → AA.
fn annex_letter(mut n: usize) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + u8::try_from(n % 26).unwrap_or(0)));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Collect every element id, rejecting duplicates.
pub(crate) fn collect_targets(
    nodes: &[Node],
    outline: &[Section],
) -> Result<HashMap<String, Target>, RenderError> {
    let mut labels = HashMap::new();
    collect_labels(outline, &mut labels);

    let mut seen: HashMap<String, Span> = HashMap::new();
    let mut targets = HashMap::new();
    let mut duplicate = None;

    tree::walk(nodes, &mut |element| {
        let Some(id) = element.attr("id").filter(|id| !id.is_empty()) else {
            return;
        };
        if seen.contains_key(id) {
            duplicate.get_or_insert_with(|| (id.to_owned(), element.span.clone()));
            return;
        }
        seen.insert(id.to_owned(), element.span.clone());
        targets.insert(
            id.to_owned(),
            Target {
                section_label: labels.get(id).cloned(),
                text: collapse_whitespace(&element.text_content()),
            },
        );
    });

    if let Some((id, span)) = duplicate {
        return Err(RenderError::DuplicateId {
            id,
            file: span.file.to_path_buf(),
            line: span.line,
            column: span.column,
        });
    }
    Ok(targets)
}

fn collect_labels(sections: &[Section], labels: &mut HashMap<String, String>) {
    for section in sections {
        labels.insert(section.id.clone(), section.reference_label());
        collect_labels(&section.children, labels);
    }
}
