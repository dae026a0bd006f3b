//! CSS selectors for Amazon HTML parsing.
//!
//! This file contains all CSS selectors used for parsing Amazon pages.
//! Update this file when Amazon changes their HTML structure.
//!
//! **Update process**: When parsing fails, capture HTML sample,
//! update selectors, and add test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for search results pages.
pub mod search {
    use super::*;

    /// Product card container - main search result item.
    pub static RESULT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-component-type='s-search-result']").unwrap());

    /// First normal product link inside a result card.
    pub static LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a.a-link-normal").unwrap());

    /// Product title text on a result card.
    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "h2 a span, \
             h2 span.a-text-normal, \
             .a-size-medium.a-text-normal, \
             .a-size-base-plus.a-text-normal",
        )
        .unwrap()
    });
}

/// Selectors for individual product pages.
pub mod product {
    use super::*;

    /// Product title on detail page.
    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#productTitle").unwrap());

    /// Visually-hidden raw price text, e.g. "$12,345.67".
    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".a-offscreen").unwrap());
}
