use scraper::{Html, Selector};

use crate::extractor::ExtractError;

/// Concatenates the outer HTML of every element matching `rules`, in
/// document order. No match is not an error: the result is simply empty.
pub fn extract(html: &str, rules: &str) -> Result<String, ExtractError> {
    let selector = Selector::parse(rules).map_err(|e| ExtractError::InvalidSelector {
        selector: rules.to_string(),
        reason: e.to_string(),
    })?;

    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .map(|element| element.html())
        .collect())
}
