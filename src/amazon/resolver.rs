//! Resolves a free-text product query to the first search result's URL.

use crate::amazon::client::{FetchError, PageFetcher};
use crate::amazon::parser;
use crate::domain::TrackedProduct;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Why a query failed to resolve to a product page.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The search yielded no result card with a product link. An expected
    /// outcome when the query matches nothing, not a crash.
    #[error("no search result found for {query:?}")]
    NotFound { query: String },

    #[error(transparent)]
    Network(#[from] FetchError),
}

/// Turns a product query into the canonical page to track.
pub struct Resolver {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl Resolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: impl Into<String>) -> Self {
        Self { fetcher, base_url: base_url.into() }
    }

    /// Builds the search URL for a query, `+`-substituting whitespace.
    pub fn search_url(&self, query: &str) -> String {
        let encoded = urlencoding::encode(query.trim()).replace("%20", "+");
        format!("{}/s?k={}", self.base_url.trim_end_matches('/'), encoded)
    }

    /// Fetches the search results page and extracts the first product link.
    pub async fn resolve(&self, query: &str) -> Result<TrackedProduct, ResolveError> {
        let url = self.search_url(query);
        info!("Searching for: {}", query);

        let html = self.fetcher.fetch(&url).await?;

        let product = parser::parse_first_result(&html, &self.base_url)
            .ok_or_else(|| ResolveError::NotFound { query: query.to_string() })?;

        debug!("Resolved {:?} to {}", query, product.url);
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::client::AmazonClient;
    use crate::config::Config;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer) -> Resolver {
        let fetcher = Arc::new(AmazonClient::new(&Config::default()).unwrap());
        Resolver::new(fetcher, server.uri())
    }

    #[test]
    fn test_search_url_encoding() {
        let fetcher = Arc::new(AmazonClient::new(&Config::default()).unwrap());
        let resolver = Resolver::new(fetcher, "https://www.amazon.com.mx");

        assert_eq!(
            resolver.search_url("wireless headphones"),
            "https://www.amazon.com.mx/s?k=wireless+headphones"
        );
        assert_eq!(resolver.search_url("rust & c++"), "https://www.amazon.com.mx/s?k=rust+%26+c%2B%2B");
        assert_eq!(resolver.search_url("  padded  "), "https://www.amazon.com.mx/s?k=padded");
    }

    #[tokio::test]
    async fn test_resolve_first_result() {
        let mock_server = MockServer::start().await;

        let html = r#"
            <html><body>
                <div data-component-type="s-search-result" data-asin="B00TEST">
                    <h2><a class="a-link-normal" href="/dp/B00TEST"><span>Headphones X</span></a></h2>
                </div>
                <div data-component-type="s-search-result" data-asin="B00OTHER">
                    <h2><a class="a-link-normal" href="/dp/B00OTHER"><span>Other</span></a></h2>
                </div>
            </body></html>
        "#;

        Mock::given(method("GET"))
            .and(path("/s"))
            .and(query_param("k", "headphones x"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server);
        let product = resolver.resolve("headphones x").await.unwrap();

        assert_eq!(product.url, format!("{}/dp/B00TEST", mock_server.uri()));
        assert_eq!(product.last_known_title.as_deref(), Some("Headphones X"));
    }

    #[tokio::test]
    async fn test_resolve_not_found_on_empty_page() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server);
        let err = resolver.resolve("nothing relevant").await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
        assert!(err.to_string().contains("nothing relevant"));
    }

    #[tokio::test]
    async fn test_resolve_not_found_when_card_has_no_link() {
        let mock_server = MockServer::start().await;

        let html = r#"
            <html><body>
                <div data-component-type="s-search-result"><h2>Ad placeholder</h2></div>
            </body></html>
        "#;

        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server);
        assert!(matches!(
            resolver.resolve("q").await.unwrap_err(),
            ResolveError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_resolve_network_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/s"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server);
        let err = resolver.resolve("q").await.unwrap_err();
        match err {
            ResolveError::Network(fetch) => assert_eq!(fetch.status(), Some(500)),
            other => panic!("expected network error, got {:?}", other),
        }
    }
}
