//! HTML parsing helpers over `scraper`.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::services::normalize::clean_text;

/// Parse a CSS selector, mapping failures into [`AppError::Selector`].
pub fn selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Cleaned text content of an element.
pub fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Cleaned text of the first match of `sel` under `element`, if non-empty.
pub fn first_text(element: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    element
        .select(sel)
        .next()
        .map(|e| element_text(&e))
        .filter(|t| !t.is_empty())
}

/// Cleaned text of the first match of `sel` in the document, if non-empty.
pub fn document_text(document: &Html, sel: &Selector) -> Option<String> {
    document
        .select(sel)
        .next()
        .map(|e| element_text(&e))
        .filter(|t| !t.is_empty())
}

/// Whole-page visible text, whitespace collapsed.
pub fn page_text(document: &Html) -> String {
    clean_text(&document.root_element().text().collect::<Vec<_>>().join(" "))
}

/// `content` of `<meta name=...>` or `<meta property=...>`.
pub fn meta_content(document: &Html, name: &str) -> Option<String> {
    let sel = selector(&format!(
        r#"meta[name="{name}"], meta[property="{name}"]"#
    ))
    .ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(clean_text)
        .filter(|t| !t.is_empty())
}
