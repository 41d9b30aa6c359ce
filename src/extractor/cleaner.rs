use ammonia::{Builder, UrlRelative};
use url::Url;

/// Strips scripts, styles and other unsafe markup, and rewrites relative
/// `href`/`src` values against `base_url`.
pub fn sanitize(html: &str, base_url: &Url) -> String {
    Builder::default()
        .url_relative(UrlRelative::RewriteWithBase(base_url.clone()))
        .clean(html)
        .to_string()
}
