//! Abstract page parsing
//!
//! The abstracts site has no stable markup, so every field is found by a
//! heuristic and a missing field is simply left empty. A page only counts as
//! a project when a title can be found.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

use crate::types::Project;

/// Awards text longer than this is assumed to have swallowed the rest of the page
const MAX_AWARDS_LEN: usize = 500;

static FINALIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Finalist Names?:\s*(.+)").expect("valid finalist regex"));

/// Parse one `FullAbstract` page into a project
pub fn parse_project(html: &str, id: u32) -> Option<Project> {
    let document = Html::parse_document(html);
    let content = find_content(&document)?;

    let text: String = content.text().collect();
    if text.contains("Project not found") || text.contains("Error") {
        return None;
    }

    let mut project = Project::new(id);
    project.title = extract_title(&content);
    read_metadata_labels(&content, &mut project);
    project.abstract_text = extract_abstract(&content);
    project.awards = extract_awards(&text);

    project.title.is_some().then_some(project)
}

/// Find the finalist's name on an abstract page
///
/// Tries the bold `Finalist:`/`Student:` labels first, then a plain
/// `Finalist Names:` line anywhere in the page.
pub fn parse_finalist_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    if let Some(content) = find_content(&document) {
        if let Ok(strong) = Selector::parse("strong") {
            for label in content.select(&strong) {
                let label_text = stripped_text(&label).to_lowercase();
                if !label_text.contains("finalist") && !label_text.contains("student") {
                    continue;
                }

                if let Some(name) = parent_value(&label) {
                    if !name.is_empty() && name.chars().count() < 100 {
                        return Some(name);
                    }
                }
            }
        }
    }

    let text: String = document.root_element().text().collect();
    FINALIST_RE
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

fn find_content(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("div.container").ok()?;
    document.select(&selector).next()
}

/// Text of an element with each text node trimmed and blanks dropped
pub(crate) fn stripped_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_title(content: &ElementRef) -> Option<String> {
    if let Ok(h2) = Selector::parse("h2") {
        if let Some(title) = content.select(&h2).next().map(|el| stripped_text(&el)) {
            if !title.is_empty() {
                return Some(title);
            }
        }
    }

    let headings = Selector::parse("h1, h2, h3").ok()?;
    content
        .select(&headings)
        .map(|el| stripped_text(&el))
        .find(|t| t.chars().count() > 10 && !t.contains("ISEF"))
}

/// Fill category/year/booth/country from `<strong>Label:</strong> value` pairs
fn read_metadata_labels(content: &ElementRef, project: &mut Project) {
    let Ok(strong) = Selector::parse("strong") else {
        return;
    };

    for label in content.select(&strong) {
        let label_text = stripped_text(&label).to_lowercase();
        let value = label_value(&label);
        if value.is_empty() {
            continue;
        }

        if label_text.contains("category") {
            project.category = Some(value);
        } else if label_text.contains("year") {
            project.year = Some(value);
        } else if label_text.contains("booth") {
            project.booth = Some(value);
        } else if label_text.contains("country") || label_text.contains("location") {
            project.country = Some(value);
        }
    }
}

/// Value for a label: the parent's text after the colon, else the next sibling
fn label_value(label: &ElementRef) -> String {
    if let Some(value) = parent_value(label).filter(|v| !v.is_empty()) {
        return value;
    }

    match label.next_sibling() {
        Some(next) => match next.value() {
            Node::Text(text) => text.trim().to_string(),
            Node::Element(_) => ElementRef::wrap(next)
                .map(|el| stripped_text(&el))
                .unwrap_or_default(),
            _ => String::new(),
        },
        None => String::new(),
    }
}

/// First line of the parent's text after the first colon
fn parent_value(label: &ElementRef) -> Option<String> {
    let parent = label.parent().and_then(ElementRef::wrap)?;
    let full: String = parent.text().collect();
    let (_, after) = full.split_once(':')?;
    Some(after.trim().lines().next().unwrap_or("").trim().to_string())
}

fn extract_abstract(content: &ElementRef) -> Option<String> {
    // Walk in document order so the last bold label seen precedes the block
    let mut last_label: Option<String> = None;

    for node in content.descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };

        match element.value().name() {
            "p" | "div" => {
                let after_abstract_label = last_label
                    .as_deref()
                    .is_some_and(|l| l.to_lowercase().contains("abstract"));
                if after_abstract_label {
                    let text = stripped_text(&element);
                    if text.chars().count() > 100 {
                        return Some(text);
                    }
                }
            }
            "strong" | "b" => {
                last_label = Some(element.text().collect());
            }
            _ => {}
        }
    }

    // No labelled abstract: take the first long paragraph
    let paragraphs = Selector::parse("p").ok()?;
    content
        .select(&paragraphs)
        .map(|p| stripped_text(&p))
        .find(|t| t.chars().count() > 200)
}

fn extract_awards(text: &str) -> Vec<String> {
    let Some((_, after)) = text.split_once("Awards Won:") else {
        return vec![];
    };

    let line = after.trim().lines().next().unwrap_or("").trim();
    if line.is_empty() || line.chars().count() >= MAX_AWARDS_LEN {
        return vec![];
    }

    if line.contains(';') {
        line.split(';')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        vec![line.to_string()]
    }
}
