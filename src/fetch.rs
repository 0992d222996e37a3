use crate::backoff::{RetrySchedule, retry_with_schedule};
use crate::config::{FetchMode, LoadedSource, resolve_path};
use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The core's only view of the outside world: a URL in, a settled document
/// body out. Rendering, sessions and waiting strategies live behind it.
pub trait DocumentFetcher {
    fn fetch_document(&self, url: &str) -> Result<String>;
}

pub fn fetcher_for_source(source: &LoadedSource) -> Result<Box<dyn DocumentFetcher>> {
    match source.config.fetch.mode {
        FetchMode::Http => Ok(Box::new(HttpFetcher::for_source(source)?)),
        FetchMode::File => Ok(Box::new(FileFetcher)),
    }
}

#[derive(Debug)]
enum HttpAttemptError {
    Transport(reqwest::Error),
    Status(StatusCode),
}

impl fmt::Display for HttpAttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpAttemptError::Transport(err) => write!(f, "{err}"),
            HttpAttemptError::Status(status) => write!(f, "http status {status}"),
        }
    }
}

fn http_retryable(err: &HttpAttemptError) -> bool {
    match err {
        HttpAttemptError::Transport(_) => true,
        HttpAttemptError::Status(status) => {
            status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
        }
    }
}

/// Sequential blocking fetcher with a fixed settle delay between
/// navigations. One instance is reused for a whole source.
pub struct HttpFetcher {
    client: Client,
    schedule: RetrySchedule,
    delay: Duration,
    navigated: Cell<bool>,
}

impl HttpFetcher {
    pub fn for_source(source: &LoadedSource) -> Result<Self> {
        let fetch = &source.config.fetch;

        let mut headers = HeaderMap::new();
        for (k, v) in &fetch.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .with_context(|| format!("invalid header name {k}"))?;
            let value = HeaderValue::from_str(v)
                .with_context(|| format!("invalid header value for {k}"))?;
            headers.insert(name, value);
        }
        if let Some(user_agent) = &fetch.user_agent {
            headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            schedule: RetrySchedule::fixed(
                fetch.retry_attempts,
                Duration::from_millis(fetch.retry_backoff_ms),
            ),
            delay: Duration::from_millis(fetch.delay_ms),
            navigated: Cell::new(false),
        })
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch_document(&self, url: &str) -> Result<String> {
        // Respect target-site rate limits: pause before every navigation
        // after the first.
        if self.navigated.replace(true) && !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let body = retry_with_schedule(&self.schedule, http_retryable, || {
            let resp = self
                .client
                .get(url)
                .send()
                .map_err(HttpAttemptError::Transport)?;
            let status = resp.status();
            if !status.is_success() {
                return Err(HttpAttemptError::Status(status));
            }
            resp.text().map_err(HttpAttemptError::Transport)
        })
        .map_err(|err| anyhow!("request to {url} failed: {err}"))?;

        debug!(%url, bytes = body.len(), "fetched document");
        Ok(body)
    }
}

/// Resolves `file://` URLs against the local filesystem. Used by file-mode
/// sources (fixtures, harness runs).
pub struct FileFetcher;

impl DocumentFetcher for FileFetcher {
    fn fetch_document(&self, url: &str) -> Result<String> {
        let Some(path) = url.strip_prefix("file://") else {
            bail!("file fetcher expects a file:// url, got {url}");
        };
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read document file {path}"))
    }
}

/// In-memory URL-to-body map for tests.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: BTreeMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.pages.insert(url.into(), body.into());
    }
}

impl DocumentFetcher for StaticFetcher {
    fn fetch_document(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no static document registered for {url}"))
    }
}

/// URL of the `page`-th listing page (zero-based walk index), or `None`
/// when the source has no such page -- the file-mode analog of a missing
/// next-page control.
pub fn listing_page_url(source: &LoadedSource, page_index: usize) -> Result<Option<String>> {
    let pagination = &source.config.pagination;

    match source.config.fetch.mode {
        FetchMode::File => {
            let Some(file) = source.config.fetch.page_files.get(page_index) else {
                return Ok(None);
            };
            let resolved = resolve_path(&source.path, file);
            Ok(Some(format!("file://{}", resolved.display())))
        }
        FetchMode::Http => {
            let page = pagination.start_page + page_index;
            let url = build_paged_url(
                &source.config.source.base_url,
                &pagination.page_param,
                &page.to_string(),
            )?;
            Ok(Some(url))
        }
    }
}

fn build_paged_url(base_url: &str, param: &str, page: &str) -> Result<String> {
    let mut url = Url::parse(base_url).with_context(|| format!("invalid base_url {base_url}"))?;

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut replaced = false;
    for (k, v) in &mut pairs {
        if k == param {
            *v = page.to_string();
            replaced = true;
            break;
        }
    }
    if !replaced {
        pairs.push((param.to_string(), page.to_string()));
    }

    {
        let mut qp = url.query_pairs_mut();
        qp.clear();
        for (k, v) in pairs {
            qp.append_pair(&k, &v);
        }
    }

    Ok(url.to_string())
}

/// Resolves a possibly relative link against the page it appeared on.
pub fn absolutize_url(page_url: &str, value: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") || value.starts_with("file://")
    {
        return value.to_string();
    }

    if let Ok(base) = Url::parse(page_url)
        && let Ok(joined) = base.join(value)
    {
        return joined.to_string();
    }

    value.to_string()
}
