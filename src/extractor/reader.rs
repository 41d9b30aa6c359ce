use readability::extractor;
use scraper::{Html, Selector};
use url::Url;

use crate::extractor::ExtractError;

const CONTENT_SELECTORS: [&str; 9] = [
    "article",
    "main",
    "[role='main']",
    ".content",
    ".post",
    ".article",
    "#content",
    "#main",
    ".entry-content",
];

const MIN_BLOCK_TEXT_LEN: usize = 100;

/// Readability-style extraction of the main content block.
///
/// Returns an empty string when nothing resembling an article is found.
pub fn extract(html: &str, base_url: &Url) -> Result<String, ExtractError> {
    let article = extractor::extract(&mut html.as_bytes(), base_url)
        .map_err(|e| ExtractError::Readability(format!("{:?}", e)))?;

    if !article.text.trim().is_empty() {
        return Ok(article.content);
    }

    Ok(fallback_extract(html))
}

/// Picks the first well-known content container with a meaningful amount of
/// text.
fn fallback_extract(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = element.text().collect::<String>();
            if text.trim().len() > MIN_BLOCK_TEXT_LEN {
                return element.html();
            }
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_picks_first_substantial_block() {
        let html = format!(
            "<html><body><main>tiny</main><article><p>{}</p></article></body></html>",
            "Substantial article text. ".repeat(10)
        );

        let content = fallback_extract(&html);
        assert!(content.starts_with("<article>"));
    }

    #[test]
    fn test_fallback_empty_when_nothing_found() {
        assert!(fallback_extract("<html><body><p>hi</p></body></html>").is_empty());
    }
}
