use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shown in place of a detail field the extractor could not resolve.
/// A missing value is surfaced explicitly, never guessed.
pub const CONFIRM_IN_ORIGINAL: &str = "공고 원문을 확인해 주세요";

/// One row lifted from a listing page. Transient; merged into an
/// `AnnouncementRecord` and discarded.
#[derive(Debug, Clone)]
pub struct ListingItem {
    /// `"<source_key>:<resolved>"`, stable across runs for the same URL.
    pub id: String,
    pub title: String,
    pub url: String,
    pub raw_date: String,
    pub source_key: String,
}

/// Fields extracted from a detail page. `None` means the cascading
/// extraction produced nothing acceptable for that field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

impl Detail {
    pub fn is_empty(&self) -> bool {
        self.eligibility.is_none()
            && self.content.is_none()
            && self.period.is_none()
            && self.amount.is_none()
    }

    /// Copy with every unresolved field replaced by the explicit
    /// "confirm in the original posting" placeholder.
    pub fn filled(&self) -> Detail {
        let fill = |v: &Option<String>| {
            Some(v.clone().unwrap_or_else(|| CONFIRM_IN_ORIGINAL.to_string()))
        };
        Detail {
            eligibility: fill(&self.eligibility),
            content: fill(&self.content),
            period: fill(&self.period),
            amount: fill(&self.amount),
        }
    }
}

/// The assembled per-announcement record for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Normalized deadline (`YYYY-MM-DD`), or `""` when no date was found.
    /// Supersedes the raw listing-page date string.
    pub date: String,
    pub region: String,
    pub region_category: String,
    pub category: String,
    pub is_target: bool,
    pub detail: Detail,
    /// Run-scoped: the id was absent from the seen store at run start.
    pub is_new: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub name: String,
    pub count: usize,
    pub new_count: usize,
    pub items: Vec<AnnouncementRecord>,
}

/// One JSON file per calendar day, retained for seven days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: String,
    pub total: usize,
    pub new_count: usize,
    pub target_count: usize,
    pub sources: BTreeMap<String, SourceSnapshot>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceReport {
    pub source_key: String,
    pub pages_fetched: usize,
    pub items_listed: usize,
    pub title_deduped: usize,
    pub new_items: usize,
    pub details_fetched: usize,
    pub detail_failures: usize,
    pub halted_on_error: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub records: Vec<AnnouncementRecord>,
    pub reports: Vec<SourceReport>,
    pub snapshot_path: Option<std::path::PathBuf>,
}

impl RunSummary {
    /// Records first seen in this run, in discovery order. This is the
    /// hand-off set for notification and content-generation consumers.
    pub fn new_records(&self) -> Vec<&AnnouncementRecord> {
        self.records.iter().filter(|r| r.is_new).collect()
    }
}
