//! Extraction of listed items from the polled page.

use log::debug;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static PRODUCT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.product-item").expect("static selector"));
static TITLED_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[title]").expect("static selector"));

/// An item found on the polled page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
}

/// Turns page markup into items.
pub trait ItemParser: Send + Sync {
    fn parse(&self, html: &str) -> Vec<Item>;
}

/// Whether `title` contains any of `keywords`, ignoring case.
pub fn matches(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords.iter().any(|keyword| title.contains(&keyword.to_lowercase()))
}

/// Parser for listings made of `div.product-item` blocks titled by their first `a[title]`.
#[derive(Debug, Clone, Default)]
pub struct ProductListingParser;

impl ItemParser for ProductListingParser {
    fn parse(&self, html: &str) -> Vec<Item> {
        let document = Html::parse_document(html);
        let items: Vec<Item> = document
            .select(&PRODUCT)
            .filter_map(|product| product.select(&TITLED_LINK).next())
            .filter_map(|link| link.value().attr("title"))
            .map(|title| Item { title: title.to_string() })
            .collect();

        debug!(
            "All crawled items: {:?}",
            items.iter().map(|i| i.title.as_str()).collect::<Vec<_>>()
        );
        items
    }
}
