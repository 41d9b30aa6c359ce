use crate::{
    config::HttpClientConfig,
    fetcher::{
        content_type::is_allowed_content_type,
        errors::FetchError,
        pipeline::process_response,
        types::{FetchOptions, PageResponse},
    },
};
use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use reqwest::{
    Client, ClientBuilder, Proxy, Response,
    header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue, USER_AGENT},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, instrument};
use url::Url;

const MAX_REDIRECTS: usize = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

static DEFAULT_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers
});

/// Certificate policy and proxy usage, the only per-feed settings that need
/// a distinct client.
type ClientKey = (bool, bool);

/// HTTP downloader for web pages.
///
/// Clients are shared between clones and built lazily, one per combination
/// of certificate policy and proxy usage. The user agent and cookie are set
/// on each request.
#[derive(Debug, Clone)]
pub struct Fetcher {
    config: HttpClientConfig,
    clients: Arc<DashMap<ClientKey, Client>>,
}

impl Fetcher {
    pub fn new(config: HttpClientConfig) -> Self {
        Self {
            config,
            clients: Arc::new(DashMap::new()),
        }
    }

    fn client(&self, options: &FetchOptions) -> Result<Client, FetchError> {
        let key = (options.allow_self_signed_certificates, options.use_proxy);
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.value().clone());
        }

        let client = self.build_client(options)?;
        Ok(self.clients.entry(key).or_insert(client).value().clone())
    }

    fn build_client(&self, options: &FetchOptions) -> Result<Client, FetchError> {
        let mut builder = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT.min(self.config.timeout))
            .timeout(self.config.timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .default_headers(DEFAULT_HEADERS.clone())
            .danger_accept_invalid_certs(options.allow_self_signed_certificates);

        builder = match (&self.config.proxy, options.use_proxy) {
            (Some(proxy), true) => builder.proxy(
                Proxy::all(proxy.as_str()).map_err(|e| FetchError::Client(e.to_string()))?,
            ),
            // Fall back to the environment's proxy settings.
            (None, true) => builder,
            (_, false) => builder.no_proxy(),
        };

        builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))
    }

    async fn send(&self, url: &str, options: &FetchOptions) -> Result<Response, FetchError> {
        let parsed_url = Url::parse(url)?;
        let client = self.client(options)?;
        let user_agent = options
            .user_agent
            .as_deref()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or(&self.config.user_agent);

        let mut request = client.get(parsed_url).header(USER_AGENT, user_agent);
        if let Some(cookie) = options.cookie.as_deref().filter(|c| !c.is_empty()) {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Http { status });
        }

        Ok(response)
    }

    async fn read_body(&self, response: Response) -> Result<Bytes, FetchError> {
        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > self.config.max_body_size
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;

        // Content-Length may be missing or wrong
        if body_bytes.len() as u64 > self.config.max_body_size {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        Ok(body_bytes)
    }

    /// Downloads an HTML page and normalizes its body to UTF-8.
    ///
    /// Fails on transport errors, any 4xx/5xx status, non-HTML content types,
    /// oversized bodies and undecodable declared charsets.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<PageResponse, FetchError> {
        let response = self.send(url, options).await?;

        let effective_url = response.url().clone();
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !is_allowed_content_type(&content_type) {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body_bytes = self.read_body(response).await?;

        debug!(
            "Downloaded {} bytes from {} (status: {})",
            body_bytes.len(),
            effective_url,
            status
        );

        process_response(effective_url, status, content_type, body_bytes)
    }

    /// Downloads a raw document, such as a feed, without content checks.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn download(&self, url: &str, options: &FetchOptions) -> Result<Bytes, FetchError> {
        let response = self.send(url, options).await?;
        let body_bytes = self.read_body(response).await?;

        debug!("Downloaded {} bytes from {}", body_bytes.len(), url);
        Ok(body_bytes)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(HttpClientConfig::default())
    }
}
