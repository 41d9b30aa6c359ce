use url::Url;

use crate::extractor::{ExtractError, Extractor};

fn article_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Sample Article - News Site</title></head>
<body>
  <nav class="menu"><a href="/">Home</a> <a href="/about">About</a></nav>
  <div id="sidebar"><p>Subscribe to our newsletter</p></div>
  <article class="post">
    <h1>Sample Article</h1>
    <p>This is the first paragraph of the article. {}</p>
    <p>This is the second paragraph, with a <a href="/related">related link</a>. {}</p>
  </article>
  <footer>Copyright</footer>
</body>
</html>"#,
        "It carries enough prose, commas, and sentences to look like real content. ".repeat(8),
        "More words follow here so the block scores well, again and again. ".repeat(8)
    )
}

#[test]
fn test_readability_finds_article_body() {
    let extractor = Extractor::Readability {
        base_url: Url::parse("https://example.com/article").unwrap(),
    };

    let content = extractor.extract(&article_page()).unwrap();

    assert!(content.contains("first paragraph"));
    assert!(content.contains("second paragraph"));
    assert_eq!(extractor.name(), "readability");
}

#[test]
fn test_selector_extracts_only_matches() {
    let extractor = Extractor::Selector("article.post h1".to_string());

    let content = extractor.extract(&article_page()).unwrap();

    assert_eq!(content, "<h1>Sample Article</h1>");
    assert_eq!(extractor.name(), "selector");
}

#[test]
fn test_selector_without_match_is_empty() {
    let extractor = Extractor::Selector("section.comments".to_string());
    assert_eq!(extractor.extract(&article_page()).unwrap(), "");
}

#[test]
fn test_selector_parse_error_propagates() {
    let extractor = Extractor::Selector("p >".to_string());
    assert!(matches!(
        extractor.extract(&article_page()),
        Err(ExtractError::InvalidSelector { .. })
    ));
}

#[test]
fn test_malformed_html() {
    let extractor = Extractor::Readability {
        base_url: Url::parse("https://example.com/broken").unwrap(),
    };
    let html = "<html><head><title>Broken</title><body><p>Unclosed tags<div>More content";

    // Should handle malformed HTML gracefully
    assert!(extractor.extract(html).is_ok());
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(html in ".*") {
            let extractor = Extractor::Readability {
                base_url: Url::parse("https://example.com").unwrap(),
            };
            let _ = extractor.extract(&html);
        }

        #[test]
        fn test_selector_never_panics(html in ".*", rules in "[a-z.#> ,]{0,20}") {
            let _ = Extractor::Selector(rules).extract(&html);
        }
    }
}
