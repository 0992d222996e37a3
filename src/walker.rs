use crate::config::LoadedSource;
use crate::fetch::{DocumentFetcher, absolutize_url, listing_page_url};
use crate::identity::IdentityResolver;
use crate::model::ListingItem;
use crate::store::SeenStore;
use anyhow::{Result, anyhow};
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub items: Vec<ListingItem>,
    pub pages_fetched: usize,
    /// A page navigation failed; the items gathered up to that point were
    /// kept and the walk stopped.
    pub halted_on_error: bool,
}

struct RowSelectors {
    row: Selector,
    title: Selector,
    link: Selector,
    link_attr: String,
    date: Selector,
}

impl RowSelectors {
    fn compile(source: &LoadedSource) -> Result<Self> {
        let sel = |css: &str| {
            Selector::parse(css).map_err(|err| anyhow!("invalid selector {css}: {err:?}"))
        };
        Ok(Self {
            row: sel(&source.config.selectors.row)?,
            title: sel(&source.config.selectors.title)?,
            link: sel(&source.config.selectors.link)?,
            link_attr: source.config.selectors.link_attr.clone(),
            date: sel(&source.config.selectors.date)?,
        })
    }
}

/// Walks one source's listing pages in order, newest first, resolving ids
/// as it goes.
///
/// The walk stops at the first of: an empty page, an exhausted page-URL
/// scheme, `max_pages`, a navigation failure, or -- for sources whose
/// listing is declared reverse-chronological -- the early-stop rule: a page
/// that yielded zero new ids while some id on or before it was already
/// known, meaning everything older was processed by a previous run.
pub fn collect_listing(
    source: &LoadedSource,
    fetcher: &dyn DocumentFetcher,
    resolver: &IdentityResolver,
    seen: &SeenStore,
) -> Result<WalkOutcome> {
    let key = source.config.source.key.as_str();
    let selectors = RowSelectors::compile(source)?;
    let max_pages = source.config.pagination.max_pages;
    let early_stop = source.config.pagination.reverse_chronological;

    let mut outcome = WalkOutcome::default();
    let mut run_ids = HashSet::new();
    let mut any_known = false;

    for page_index in 0..max_pages {
        let Some(url) = listing_page_url(source, page_index)? else {
            info!(source = key, page = page_index, "no further pages; stopping");
            break;
        };

        let body = match fetcher.fetch_document(&url) {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    source = key,
                    page = page_index,
                    %url,
                    error = %err,
                    "listing navigation failed; keeping items gathered so far"
                );
                outcome.halted_on_error = true;
                break;
            }
        };
        outcome.pages_fetched += 1;

        let doc = Html::parse_document(&body);
        let rows = extract_rows(&doc, &selectors, &url, key);

        if rows.is_empty() {
            info!(source = key, page = page_index, "empty listing page; stopping");
            break;
        }

        let mut page_new = 0usize;
        let mut page_items = 0usize;
        for (title, item_url, raw_date) in rows {
            let resolved = resolver.resolve(&item_url);
            let id = format!("{key}:{resolved}");
            // A pinned row repeated on a later page must not become a
            // second record.
            if !run_ids.insert(id.clone()) {
                continue;
            }

            if seen.contains(&id) {
                any_known = true;
            } else {
                page_new += 1;
            }
            page_items += 1;

            outcome.items.push(ListingItem {
                id,
                title,
                url: item_url,
                raw_date,
                source_key: key.to_string(),
            });
        }

        info!(
            source = key,
            page = page_index,
            items = page_items,
            new = page_new,
            "listing page walked"
        );

        if early_stop && page_new == 0 && any_known {
            info!(
                source = key,
                page = page_index,
                "re-entered already-processed territory; stopping early"
            );
            break;
        }
    }

    Ok(outcome)
}

fn extract_rows(
    doc: &Html,
    selectors: &RowSelectors,
    page_url: &str,
    source_key: &str,
) -> Vec<(String, String, String)> {
    let mut rows = Vec::new();

    for row in doc.select(&selectors.row) {
        let title = row
            .select(&selectors.title)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")));
        let link = row.select(&selectors.link).next().and_then(|el| {
            el.value()
                .attr(&selectors.link_attr)
                .map(ToString::to_string)
        });
        let raw_date = row
            .select(&selectors.date)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();

        match (title, link) {
            (Some(title), Some(link)) if !title.is_empty() && !link.is_empty() => {
                rows.push((title, absolutize_url(page_url, &link), raw_date));
            }
            _ => {
                debug!(source = source_key, "skipping row without title or link");
            }
        }
    }

    rows
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
