// ABOUTME: Structural query helpers over scraper documents: find by selector, read attribute, read text.
// ABOUTME: Compiled selectors are cached process-wide so fixed layout paths are parsed once.

//! Tree query helpers.
//!
//! Every record builder reads the page through these functions only:
//! - `select_all` / `first` find nodes below a scope by a CSS path.
//! - `text` concatenates the text of *all* matches, in document order.
//! - `attr` reads an attribute of the *first* match.
//!
//! An invalid selector matches nothing.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result (including failures).
pub fn selector(css: &str) -> Option<Selector> {
    {
        let cache = SELECTOR_CACHE.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css).ok();
    let mut cache = SELECTOR_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    cache
        .entry(css.to_string())
        .or_insert_with(|| compiled)
        .clone()
}

/// All elements below `scope` matching `css`, in document order.
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => scope.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// First element below `scope` matching `css`.
pub fn first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    selector(css).and_then(|sel| scope.select(&sel).next())
}

/// Concatenated descendant text of every element matching `css`; empty when nothing matches.
pub fn text(scope: ElementRef<'_>, css: &str) -> String {
    select_all(scope, css)
        .into_iter()
        .map(element_text)
        .collect()
}

/// Attribute `name` of the first element matching `css`.
pub fn attr(scope: ElementRef<'_>, css: &str, name: &str) -> Option<String> {
    first(scope, css).and_then(|el| el.value().attr(name).map(str::to_string))
}

/// Concatenated descendant text of a single element.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Direct element children, skipping text and comment nodes.
pub fn child_elements(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap).collect()
}

/// Element children of every element matching `css`, in document order.
pub fn children_of<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    select_all(scope, css)
        .into_iter()
        .flat_map(child_elements)
        .collect()
}
