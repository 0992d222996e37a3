use anyhow::{Context, Result, bail};
use regex::Regex;
use scraper::Selector;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub path: PathBuf,
    pub config: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub source: SourceMeta,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub detail: DetailConfig,
}

impl SourceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.source.key.trim().is_empty() {
            bail!("source.key must not be empty");
        }
        if self.source.name.trim().is_empty() {
            bail!("source.name must not be empty");
        }

        match self.fetch.mode {
            FetchMode::Http => {
                if self.source.base_url.trim().is_empty() {
                    bail!("source.base_url is required for http mode");
                }
            }
            FetchMode::File => {
                if self.fetch.page_files.is_empty() {
                    bail!("fetch.page_files is required for file mode");
                }
            }
        }

        for (label, css) in [
            ("selectors.row", &self.selectors.row),
            ("selectors.title", &self.selectors.title),
            ("selectors.link", &self.selectors.link),
            ("selectors.date", &self.selectors.date),
        ] {
            if Selector::parse(css).is_err() {
                bail!("{label} is not a valid css selector: {css}");
            }
        }

        for pattern in &self.identity.patterns {
            let compiled = Regex::new(pattern)
                .with_context(|| format!("identity pattern does not compile: {pattern}"))?;
            if compiled.captures_len() < 2 {
                bail!("identity pattern needs one capture group: {pattern}");
            }
        }

        if self.pagination.max_pages == 0 {
            bail!("pagination.max_pages must be at least 1");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceMeta {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Http,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub mode: FetchMode,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u8,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Settle delay between consecutive page navigations.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// File mode: ordered fixture files standing in for listing pages.
    #[serde(default)]
    pub page_files: Vec<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::Http,
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            delay_ms: default_delay_ms(),
            user_agent: None,
            headers: BTreeMap::new(),
            page_files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_param")]
    pub page_param: String,
    #[serde(default = "default_start_page")]
    pub start_page: usize,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Precondition for the early-stop rule: the listing must be maintained
    /// newest-first. A source that re-bumps old items should set this to
    /// false, which disables early-stop and walks up to max_pages.
    #[serde(default = "default_true")]
    pub reverse_chronological: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_param: default_page_param(),
            start_page: default_start_page(),
            max_pages: default_max_pages(),
            reverse_chronological: true,
        }
    }
}

/// CSS selectors describing one source's listing rows.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    pub row: String,
    pub title: String,
    pub link: String,
    #[serde(default = "default_link_attr")]
    pub link_attr: String,
    pub date: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct IdentityConfig {
    /// Ordered regexes tried before the built-in defaults; each must carry
    /// one capture group holding the item identifier.
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Overrides the built-in container list for the content fallback scan.
    #[serde(default)]
    pub content_containers: Vec<String>,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            content_containers: Vec::new(),
        }
    }
}

pub fn load_sources_from_dir(config_dir: &Path) -> Result<Vec<LoadedSource>> {
    if !config_dir.exists() {
        bail!("config dir does not exist: {}", config_dir.display());
    }

    let mut loaded = Vec::new();
    for entry in WalkDir::new(config_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("toml") {
            continue;
        }

        loaded.push(load_source_file(path)?);
    }

    loaded.sort_by(|a, b| a.config.source.key.cmp(&b.config.source.key));
    Ok(loaded)
}

pub fn load_source_file(config_path: &Path) -> Result<LoadedSource> {
    let text = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read source config: {}", config_path.display()))?;
    let config: SourceConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse toml in {}", config_path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid source config {}", config_path.display()))?;
    Ok(LoadedSource {
        path: config_path.to_path_buf(),
        config,
    })
}

/// Resolves a path from a source config relative to the config file itself.
pub fn resolve_path(base_config_path: &Path, maybe_relative: &Path) -> PathBuf {
    if maybe_relative.is_absolute() {
        return maybe_relative.to_path_buf();
    }

    match base_config_path.parent() {
        Some(parent) => parent.join(maybe_relative),
        None => maybe_relative.to_path_buf(),
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_retry_attempts() -> u8 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_delay_ms() -> u64 {
    800
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_start_page() -> usize {
    1
}

fn default_max_pages() -> usize {
    5
}

fn default_link_attr() -> String {
    "href".to_string()
}
