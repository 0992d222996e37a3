use anyhow::Result;
use gonggo::config::{
    DetailConfig, FetchConfig, IdentityConfig, LoadedSource, PaginationConfig, SelectorConfig,
    SourceConfig, SourceMeta,
};
use gonggo::fetch::StaticFetcher;
use gonggo::identity::IdentityResolver;
use gonggo::store::SeenStore;
use gonggo::walker::collect_listing;
use std::path::PathBuf;
use tempfile::tempdir;

fn test_source(max_pages: usize, reverse_chronological: bool) -> LoadedSource {
    LoadedSource {
        path: PathBuf::from("test.toml"),
        config: SourceConfig {
            source: SourceMeta {
                key: "ex".to_string(),
                name: "Example Portal".to_string(),
                base_url: "https://example.test/list".to_string(),
                enabled: true,
            },
            fetch: FetchConfig::default(),
            pagination: PaginationConfig {
                page_param: "page".to_string(),
                start_page: 1,
                max_pages,
                reverse_chronological,
            },
            selectors: SelectorConfig {
                row: "li.item".to_string(),
                title: "a.tit".to_string(),
                link: "a.tit".to_string(),
                link_attr: "href".to_string(),
                date: "span.date".to_string(),
            },
            identity: IdentityConfig::default(),
            detail: DetailConfig::default(),
        },
    }
}

fn listing_page(seqs: &[u32]) -> String {
    let rows: String = seqs
        .iter()
        .map(|seq| {
            format!(
                r#"<li class="item"><a class="tit" href="https://example.test/view?seq={seq}">공고 {seq}</a><span class="date">2026.03.01</span></li>"#
            )
        })
        .collect();
    format!("<html><body><ul>{rows}</ul></body></html>")
}

fn seen_with(ids: &[&str]) -> Result<SeenStore> {
    let dir = tempdir()?;
    let mut seen = SeenStore::load(&dir.path().join("seen.json"))?;
    for id in ids {
        seen.mark(id, "2026-02-01");
    }
    Ok(seen)
}

#[test]
fn walk_stops_one_confirmatory_page_past_the_last_new_item() -> Result<()> {
    let source = test_source(10, true);
    let mut fetcher = StaticFetcher::new();
    // Page 1: all new. Page 2: one new among known. Page 3: all known.
    // Page 4 exists but must never be requested.
    fetcher.insert("https://example.test/list?page=1", listing_page(&[101, 102]));
    fetcher.insert("https://example.test/list?page=2", listing_page(&[103, 90, 89]));
    fetcher.insert("https://example.test/list?page=3", listing_page(&[88, 87]));
    fetcher.insert("https://example.test/list?page=4", listing_page(&[86]));

    let seen = seen_with(&["ex:90", "ex:89", "ex:88", "ex:87", "ex:86"])?;
    let resolver = IdentityResolver::with_defaults();

    let outcome = collect_listing(&source, &fetcher, &resolver, &seen)?;

    assert_eq!(outcome.pages_fetched, 3);
    assert!(!outcome.halted_on_error);

    let ids: Vec<&str> = outcome.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["ex:101", "ex:102", "ex:103", "ex:90", "ex:89", "ex:88", "ex:87"]);

    let new_ids: Vec<&str> = outcome
        .items
        .iter()
        .filter(|i| !seen.contains(&i.id))
        .map(|i| i.id.as_str())
        .collect();
    assert_eq!(new_ids, ["ex:101", "ex:102", "ex:103"], "discovery order preserved");

    Ok(())
}

#[test]
fn early_stop_disabled_for_non_chronological_sources() -> Result<()> {
    let source = test_source(4, false);
    let mut fetcher = StaticFetcher::new();
    fetcher.insert("https://example.test/list?page=1", listing_page(&[101, 102]));
    fetcher.insert("https://example.test/list?page=2", listing_page(&[90]));
    fetcher.insert("https://example.test/list?page=3", listing_page(&[89]));
    fetcher.insert("https://example.test/list?page=4", listing_page(&[86]));

    let seen = seen_with(&["ex:90", "ex:89", "ex:86"])?;
    let resolver = IdentityResolver::with_defaults();

    let outcome = collect_listing(&source, &fetcher, &resolver, &seen)?;

    assert_eq!(outcome.pages_fetched, 4, "walks to max_pages when the flag is off");
    assert_eq!(outcome.items.len(), 5);

    Ok(())
}

#[test]
fn empty_page_ends_the_walk() -> Result<()> {
    let source = test_source(10, true);
    let mut fetcher = StaticFetcher::new();
    fetcher.insert("https://example.test/list?page=1", listing_page(&[101]));
    fetcher.insert(
        "https://example.test/list?page=2",
        "<html><body><ul></ul></body></html>".to_string(),
    );
    fetcher.insert("https://example.test/list?page=3", listing_page(&[100]));

    let seen = seen_with(&[])?;
    let resolver = IdentityResolver::with_defaults();

    let outcome = collect_listing(&source, &fetcher, &resolver, &seen)?;

    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.items.len(), 1);

    Ok(())
}

#[test]
fn navigation_failure_keeps_gathered_items() -> Result<()> {
    let source = test_source(10, true);
    let mut fetcher = StaticFetcher::new();
    // Page 2 is not registered: the fetch fails mid-walk.
    fetcher.insert("https://example.test/list?page=1", listing_page(&[101, 102]));

    let seen = seen_with(&[])?;
    let resolver = IdentityResolver::with_defaults();

    let outcome = collect_listing(&source, &fetcher, &resolver, &seen)?;

    assert!(outcome.halted_on_error);
    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.items.len(), 2, "page-one items survive the failure");

    Ok(())
}

#[test]
fn repeated_pinned_row_yields_one_item() -> Result<()> {
    let source = test_source(10, true);
    let mut fetcher = StaticFetcher::new();
    fetcher.insert("https://example.test/list?page=1", listing_page(&[101, 102]));
    fetcher.insert("https://example.test/list?page=2", listing_page(&[101, 95]));
    fetcher.insert("https://example.test/list?page=3", listing_page(&[94]));

    let seen = seen_with(&["ex:95", "ex:94"])?;
    let resolver = IdentityResolver::with_defaults();

    let outcome = collect_listing(&source, &fetcher, &resolver, &seen)?;

    let count_101 = outcome.items.iter().filter(|i| i.id == "ex:101").count();
    assert_eq!(count_101, 1);

    Ok(())
}
