//! Site-specific extraction rules keyed by domain substring.

use url::Url;

/// One site rule: pages whose domain contains `domain_substring` are reduced
/// to the elements matching `selector`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDirective {
    pub domain_substring: String,
    pub selector: String,
}

impl SiteDirective {
    pub fn new(domain_substring: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            domain_substring: domain_substring.into(),
            selector: selector.into(),
        }
    }
}

/// Ordered table of site directives.
///
/// Lookup is a substring test against the domain and the first registered
/// directive that matches wins, so overlapping entries resolve the same way
/// on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteRules {
    directives: Vec<SiteDirective>,
}

const PREDEFINED_RULES: &[(&str, &str)] = &[
    ("abc.net.au", ".article .print-clearfix"),
    ("anandtech.com", ".blog-post-content"),
    ("arstechnica.com", "div.article-content"),
    (
        "bbc.co.uk",
        "div.vxp-column--single, div.story-body__inner, ul.gallery-images__list",
    ),
    ("blog.cloudflare.com", "div.post-content"),
    ("cbc.ca", ".story-content"),
    ("darkreading.com", "#article-main:not(header)"),
    ("developpez.com", "div[itemprop=articleBody]"),
    ("dilbert.com", "span.comic-title-name, img.img-comic"),
    ("explosm.net", "div#comic"),
    ("financialsamurai.com", "article"),
    ("francetvinfo.fr", ".text"),
    ("github.com", "article.entry-content"),
    (
        "heise.de",
        "header .article-content__lead, header .article-image, div.article-layout__content.article-content",
    ),
    ("igen.fr", "section.corps"),
    ("ing.dk", "section.body"),
    ("lapresse.ca", ".amorce, .entry"),
    ("lemonde.fr", "article"),
    ("lepoint.fr", ".art-text"),
    ("lesjoiesducode.fr", ".blog-post-content img"),
    ("lesnumeriques.com", ".text-article"),
    ("linux.com", "div.content, div[property]"),
    ("mac4ever.com", "div[itemprop=articleBody]"),
    ("monwindows.com", ".blog-post-body"),
    ("npr.org", "#storytext"),
    ("oneindia.com", ".io-article-body"),
    ("opensource.com", "div[property]"),
    ("osnews.com", "div.newscontent1"),
    ("phoronix.com", "div.content"),
    ("pseudo-sciences.org", "#art_main"),
    ("raywenderlich.com", "article"),
    ("royalroad.com", ".author-note-portlet, .chapter-content"),
    ("slate.fr", ".field-items"),
    ("smbc-comics.com", "div#cc-comicbody, div#aftercomic"),
    ("swordscomic.com", "img#comic-image, div#info-frame.tab-content-area"),
    ("techcrunch.com", "div.article-entry"),
    ("theoatmeal.com", "div#comic"),
    ("theregister.com", "#top-col-story h2, #body"),
    ("turnoff.us", "article.post-content"),
    ("universfreebox.com", "#corps_corps"),
    ("version2.dk", "section.body"),
    ("wdwnt.com", "div.entry-content"),
    ("webtoons.com", ".viewer_img, p.author_text"),
    ("wired.com", "main figure, article"),
    ("zdnet.com", "div.storyBody"),
    ("zeit.de", ".summary, .article-body"),
];

impl SiteRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in rules for well-known publishers.
    pub fn predefined() -> Self {
        PREDEFINED_RULES
            .iter()
            .map(|(domain, selector)| SiteDirective::new(*domain, *selector))
            .collect()
    }

    /// Appends a directive; it only wins over existing ones on domains they
    /// do not match.
    pub fn push(&mut self, directive: SiteDirective) {
        self.directives.push(directive);
    }

    pub fn with(mut self, domain_substring: &str, selector: &str) -> Self {
        self.push(SiteDirective::new(domain_substring, selector));
        self
    }

    pub fn lookup(&self, domain: &str) -> Option<&str> {
        self.directives
            .iter()
            .find(|directive| domain.contains(directive.domain_substring.as_str()))
            .map(|directive| directive.selector.as_str())
    }

    pub fn directives(&self) -> &[SiteDirective] {
        &self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

impl FromIterator<SiteDirective> for SiteRules {
    fn from_iter<I: IntoIterator<Item = SiteDirective>>(iter: I) -> Self {
        Self {
            directives: iter.into_iter().collect(),
        }
    }
}

/// Host of a URL, with the port when one is explicitly set.
pub fn domain(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Like [`domain`], but for unparsed input. Unparseable URLs are returned as is.
pub fn domain_of(raw_url: &str) -> String {
    Url::parse(raw_url)
        .map(|url| domain(&url))
        .unwrap_or_else(|_| raw_url.to_string())
}
