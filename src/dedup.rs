use crate::model::ListingItem;
use std::collections::HashSet;
use tracing::debug;

/// Canonical form used for intra-run title comparison: one leading
/// bracketed tag (region marker and the like) stripped, whitespace runs
/// collapsed to single spaces.
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    let without_tag = if trimmed.starts_with('[') {
        match trimmed.find(']') {
            Some(end) => trimmed[end + 1..].trim_start(),
            None => trimmed,
        }
    } else {
        trimmed
    };

    without_tag.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drops every item whose normalized title already appeared earlier in the
/// same source's run output (an edited repost listed twice). First
/// occurrence survives; order is preserved. Applied per source -- the same
/// program appearing on two sources stays two records by design.
pub fn dedup_by_title(items: Vec<ListingItem>) -> (Vec<ListingItem>, usize) {
    let mut seen_titles = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    let mut dropped = 0usize;

    for item in items {
        let normalized = normalize_title(&item.title);
        if seen_titles.insert(normalized) {
            kept.push(item);
        } else {
            debug!(
                source = %item.source_key,
                title = %item.title,
                "dropping duplicate title within run"
            );
            dropped += 1;
        }
    }

    (kept, dropped)
}
