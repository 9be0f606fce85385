use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

use crate::extract::json::parse_json;

/// Raw signals harvested from one settled page load.
///
/// Built once per visit and never mutated afterwards; the hydration blob is
/// parsed on first access and cached.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    meta_title: Option<String>,
    meta_description: Option<String>,
    heading_text: Option<String>,
    body_text: String,
    raw_markup: String,
    structured_data_blocks: Vec<String>,
    hydration_state: Option<String>,
    hydration: OnceLock<Option<Value>>,
}

const HEADING_FALLBACK: &str = r#"[data-testid*="profile"][data-testid*="heading"], [data-testid="user-profile__heading"], [data-testid="user-profile-heading"]"#;

impl Snapshot {
    pub fn new(body_text: impl Into<String>, raw_markup: impl Into<String>) -> Self {
        Self {
            body_text: body_text.into(),
            raw_markup: raw_markup.into(),
            ..Self::default()
        }
    }

    /// Build a snapshot from the rendered markup and the rendered body text.
    ///
    /// `script_hydration` is used when the markup carries no `#__NEXT_DATA__`
    /// element but the page exposed the state through a script global.
    pub fn from_page(raw_markup: String, body_text: String, script_hydration: Option<String>) -> Self {
        let document = Html::parse_document(&raw_markup);

        let meta_title = meta_content(&document, r#"meta[property="og:title"]"#)
            .or_else(|| meta_content(&document, r#"meta[name="twitter:title"]"#));
        let meta_description = meta_content(&document, r#"meta[name="description"]"#);

        let heading_text = select_first(&document, "h1")
            .and_then(element_text)
            .or_else(|| select_first(&document, HEADING_FALLBACK).and_then(element_text));

        let structured_data_blocks = select_all(&document, r#"script[type="application/ld+json"]"#)
            .into_iter()
            .map(|script| script.text().collect::<String>())
            .collect();

        let hydration_state = select_first(&document, "#__NEXT_DATA__")
            .map(|script| script.text().collect::<String>())
            .filter(|s| !s.trim().is_empty())
            .or(script_hydration);

        Self {
            meta_title,
            meta_description,
            heading_text,
            body_text,
            raw_markup,
            structured_data_blocks,
            hydration_state,
            hydration: OnceLock::new(),
        }
    }

    pub fn with_meta_title(mut self, title: impl Into<String>) -> Self {
        self.meta_title = Some(title.into());
        self
    }

    pub fn with_meta_description(mut self, description: impl Into<String>) -> Self {
        self.meta_description = Some(description.into());
        self
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading_text = Some(heading.into());
        self
    }

    pub fn with_structured_data(mut self, block: impl Into<String>) -> Self {
        self.structured_data_blocks.push(block.into());
        self
    }

    pub fn with_hydration_state(mut self, state: impl Into<String>) -> Self {
        self.hydration_state = Some(state.into());
        self.hydration = OnceLock::new();
        self
    }

    pub fn meta_title(&self) -> Option<&str> {
        self.meta_title.as_deref()
    }

    pub fn meta_description(&self) -> Option<&str> {
        self.meta_description.as_deref()
    }

    pub fn heading_text(&self) -> Option<&str> {
        self.heading_text.as_deref()
    }

    pub fn body_text(&self) -> &str {
        &self.body_text
    }

    pub fn raw_markup(&self) -> &str {
        &self.raw_markup
    }

    pub fn structured_data_blocks(&self) -> &[String] {
        &self.structured_data_blocks
    }

    /// Parsed hydration state; `None` when absent or malformed
    pub fn hydration(&self) -> Option<&Value> {
        self.hydration
            .get_or_init(|| {
                let raw = self.hydration_state.as_deref()?;
                match parse_json(raw, "hydration state") {
                    Ok(value) => Some(value),
                    Err(e) => {
                        debug!("Ignoring hydration state: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Body text and markup joined, as searched by the text-pattern strategies
    pub fn text_and_markup(&self) -> String {
        format!("{}\n{}", self.body_text, self.raw_markup)
    }
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    select_first(document, css)
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}
