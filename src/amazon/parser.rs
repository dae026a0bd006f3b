//! HTML parsing for Amazon search results and product pages.
//!
//! Pure functions over the document text: no network I/O, same document in,
//! same fields out.

use crate::amazon::selectors::{product, search};
use crate::domain::{PriceReading, TrackedProduct, UNKNOWN_TITLE};
use scraper::{ElementRef, Html};
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

/// Why a product page failed to yield a price reading.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ParseError {
    /// No `#productTitle` element. Recovered with [`UNKNOWN_TITLE`] when the
    /// price is still present.
    #[error("could not find the product title")]
    MissingTitle,

    /// No offscreen price element - item unavailable or page layout changed.
    #[error("could not find a price on the product page")]
    MissingPrice,

    /// Price element present but its text is not a number after stripping
    /// currency formatting. Carries the stripped remainder.
    #[error("could not parse price from {0:?}")]
    MalformedPrice(String),
}

/// Extracts a title and price from a product page.
///
/// A missing title is non-fatal: the reading falls back to
/// [`UNKNOWN_TITLE`] as long as a price is present.
pub fn parse_product(html: &str) -> Result<PriceReading, ParseError> {
    let document = Html::parse_document(html);

    let title = match parse_title(&document) {
        Ok(title) => title,
        Err(ParseError::MissingTitle) => UNKNOWN_TITLE.to_string(),
        Err(err) => return Err(err),
    };

    let raw = document
        .select(&product::PRICE)
        .next()
        .map(element_text)
        .ok_or(ParseError::MissingPrice)?;

    let price = parse_price_value(&raw)?;
    trace!("Parsed reading: {} @ {}", title, price);

    Ok(PriceReading::new(title, price))
}

/// Looks up the well-known title element.
fn parse_title(document: &Html) -> Result<String, ParseError> {
    document
        .select(&product::TITLE)
        .next()
        .map(element_text)
        .filter(|title| !title.is_empty())
        .ok_or(ParseError::MissingTitle)
}

/// Strips `$` and group separators, then parses the remainder as a decimal.
fn parse_price_value(raw: &str) -> Result<f64, ParseError> {
    let cleaned = raw.trim().replace(['$', ','], "");
    let cleaned = cleaned.trim();

    cleaned.parse().map_err(|_| ParseError::MalformedPrice(cleaned.to_string()))
}

/// Extracts the first search result card's product link and title.
///
/// Returns `None` when no result card or no product link exists - the
/// "search found nothing relevant" outcome, not an error.
pub fn parse_first_result(html: &str, base_url: &str) -> Option<TrackedProduct> {
    let document = Html::parse_document(html);

    let card = document.select(&search::RESULT).next()?;
    let href = card.select(&search::LINK).next()?.value().attr("href")?;

    let url = if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    };

    let last_known_title = card
        .select(&search::TITLE)
        .next()
        .map(element_text)
        .filter(|title| !title.is_empty());

    Some(TrackedProduct { url, last_known_title })
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_page(title: Option<&str>, price: Option<&str>) -> String {
        let mut html = String::from("<html><body>");
        if let Some(title) = title {
            html.push_str(&format!(r#"<span id="productTitle">{}</span>"#, title));
        }
        if let Some(price) = price {
            html.push_str(&format!(
                r#"<span class="a-price"><span class="a-offscreen">{}</span></span>"#,
                price
            ));
        }
        html.push_str("</body></html>");
        html
    }

    // Price string parsing

    #[test]
    fn test_parse_price_plain() {
        assert_eq!(parse_price_value("$29.99"), Ok(29.99));
        assert_eq!(parse_price_value("$10"), Ok(10.0));
        assert_eq!(parse_price_value("29.99"), Ok(29.99));
        assert_eq!(parse_price_value("  $0.99  "), Ok(0.99));
    }

    #[test]
    fn test_parse_price_with_group_separators() {
        assert_eq!(parse_price_value("$1,299.00"), Ok(1299.00));
        assert_eq!(parse_price_value("$12,345.67"), Ok(12345.67));
    }

    #[test]
    fn test_parse_price_malformed() {
        assert_eq!(parse_price_value("$N/A"), Err(ParseError::MalformedPrice("N/A".to_string())));
        assert_eq!(
            parse_price_value("Currently unavailable"),
            Err(ParseError::MalformedPrice("Currently unavailable".to_string()))
        );
        assert_eq!(parse_price_value("$"), Err(ParseError::MalformedPrice(String::new())));
    }

    // Product page parsing

    #[test]
    fn test_parse_product_full_page() {
        let html = product_page(Some("Headphones X"), Some("$199.99"));
        let reading = parse_product(&html).unwrap();
        assert_eq!(reading.title, "Headphones X");
        assert_eq!(reading.price, 199.99);
    }

    #[test]
    fn test_parse_product_missing_title_uses_sentinel() {
        let html = product_page(None, Some("$49.50"));
        let reading = parse_product(&html).unwrap();
        assert_eq!(reading.title, UNKNOWN_TITLE);
        assert_eq!(reading.price, 49.50);
    }

    #[test]
    fn test_parse_product_missing_price() {
        let html = product_page(Some("Some Product"), None);
        assert_eq!(parse_product(&html), Err(ParseError::MissingPrice));
    }

    #[test]
    fn test_parse_product_missing_everything_is_missing_price() {
        let html = product_page(None, None);
        assert_eq!(parse_product(&html), Err(ParseError::MissingPrice));
    }

    #[test]
    fn test_parse_product_malformed_price_keeps_raw() {
        let html = product_page(Some("Some Product"), Some("$N/A"));
        assert_eq!(parse_product(&html), Err(ParseError::MalformedPrice("N/A".to_string())));
    }

    #[test]
    fn test_parse_product_title_whitespace_trimmed() {
        let html = r#"<html><body>
            <span id="productTitle">
                Headphones X
            </span>
            <span class="a-offscreen">$10.00</span>
        </body></html>"#;
        let reading = parse_product(html).unwrap();
        assert_eq!(reading.title, "Headphones X");
    }

    #[test]
    fn test_parse_product_first_price_element_wins() {
        let html = r#"<html><body>
            <span id="productTitle">T</span>
            <span class="a-offscreen">$15.00</span>
            <span class="a-offscreen">$99.00</span>
        </body></html>"#;
        assert_eq!(parse_product(html).unwrap().price, 15.00);
    }

    #[test]
    fn test_parse_product_deterministic() {
        let html = product_page(Some("Stable"), Some("$42.00"));
        let first = parse_product(&html).unwrap();
        let second = parse_product(&html).unwrap();
        assert_eq!(first.title, second.title);
        assert_eq!(first.price, second.price);
    }

    // Search result parsing

    fn search_page(cards: &[(&str, Option<&str>)]) -> String {
        let mut html = String::from("<html><body>");
        for (href, title) in cards {
            html.push_str(r#"<div data-component-type="s-search-result">"#);
            html.push_str(&format!(r#"<h2><a class="a-link-normal" href="{}">"#, href));
            if let Some(title) = title {
                html.push_str(&format!("<span>{}</span>", title));
            }
            html.push_str("</a></h2></div>");
        }
        html.push_str("</body></html>");
        html
    }

    #[test]
    fn test_first_result_relative_href_absolutized() {
        let html = search_page(&[("/dp/B00TEST", Some("Headphones X"))]);
        let product = parse_first_result(&html, "https://www.amazon.com.mx").unwrap();
        assert_eq!(product.url, "https://www.amazon.com.mx/dp/B00TEST");
        assert_eq!(product.last_known_title.as_deref(), Some("Headphones X"));
    }

    #[test]
    fn test_first_result_absolute_href_kept() {
        let html = search_page(&[("https://www.amazon.com.mx/dp/B00TEST", None)]);
        let product = parse_first_result(&html, "https://www.amazon.com.mx").unwrap();
        assert_eq!(product.url, "https://www.amazon.com.mx/dp/B00TEST");
        assert!(product.last_known_title.is_none());
    }

    #[test]
    fn test_first_result_takes_first_card() {
        let html = search_page(&[("/dp/FIRST", Some("One")), ("/dp/SECOND", Some("Two"))]);
        let product = parse_first_result(&html, "https://base").unwrap();
        assert_eq!(product.url, "https://base/dp/FIRST");
    }

    #[test]
    fn test_first_result_no_cards() {
        assert!(parse_first_result("<html><body></body></html>", "https://base").is_none());
    }

    #[test]
    fn test_first_result_card_without_link() {
        let html = r#"<html><body>
            <div data-component-type="s-search-result"><h2>No link here</h2></div>
        </body></html>"#;
        assert!(parse_first_result(html, "https://base").is_none());
    }

    #[test]
    fn test_first_result_trailing_slash_base() {
        let html = search_page(&[("/dp/B00TEST", None)]);
        let product = parse_first_result(&html, "https://www.amazon.com.mx/").unwrap();
        assert_eq!(product.url, "https://www.amazon.com.mx/dp/B00TEST");
    }
}
