//! Compiled CSS selectors and small DOM helpers.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::SelectorConfig;

/// Selectors from [`SelectorConfig`], parsed once per crawl.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub listing_item: Selector,
    pub item_title: Selector,
    pub pagination_active: Selector,
    pub pagination_link: Selector,
    pub detail_title: Selector,
    pub detail_address: Selector,
    pub detail_date: Selector,
}

impl Selectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            listing_item: parse_selector(&config.listing_item)?,
            item_title: parse_selector(&config.item_title)?,
            pagination_active: parse_selector(&config.pagination_active)?,
            pagination_link: parse_selector(&config.pagination_link)?,
            detail_title: parse_selector(&config.detail_title)?,
            detail_address: parse_selector(&config.detail_address)?,
            detail_date: parse_selector(&config.detail_date)?,
        })
    }
}

pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Parse a fetched body as HTML. Invalid UTF-8 is replaced, not rejected.
pub fn parse_document(content: &[u8]) -> Html {
    Html::parse_document(&String::from_utf8_lossy(content))
}

/// Text of every match of `selector` in `document`, joined and trimmed.
///
/// Inner whitespace is kept as the page has it. `None` when nothing matches.
pub fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    let mut matches = document.select(selector).peekable();
    matches.peek()?;
    let text: String = matches.flat_map(|el| el.text()).collect();
    Some(text.trim().to_string())
}

/// The element sibling immediately after `element`, skipping text nodes.
pub fn next_element_sibling<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.next_siblings().find_map(ElementRef::wrap)
}
