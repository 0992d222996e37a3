use crate::classify;
use crate::config::{LoadedSource, load_source_file, load_sources_from_dir};
use crate::deadline::normalize_deadline;
use crate::dedup::dedup_by_title;
use crate::extract::{ExtractProfile, extract_detail};
use crate::fetch::fetcher_for_source;
use crate::identity::IdentityResolver;
use crate::model::{
    AnnouncementRecord, DailySnapshot, Detail, RunSummary, SourceReport, SourceSnapshot,
};
use crate::store::{DetailCache, SeenStore, SnapshotStore};
use crate::walker::collect_listing;
use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use scraper::Html;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const DEFAULT_TIMEZONE: &str = "Asia/Seoul";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config_dir: PathBuf,
    pub seen_path: PathBuf,
    pub cache_path: PathBuf,
    pub snapshot_dir: PathBuf,
    pub source: Option<String>,
    pub dry_run: bool,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub config_dir: Option<PathBuf>,
    pub source_file: Option<PathBuf>,
}

/// One full collection run: every enabled source walked, new items
/// detected, details resolved, records classified, snapshot written,
/// stores persisted. A failing source is logged and skipped; the others
/// proceed.
pub fn run_collection(options: &RunOptions) -> Result<RunSummary> {
    let mut sources = load_sources_from_dir(&options.config_dir)?;
    if let Some(filter) = &options.source {
        sources.retain(|s| s.config.source.key == *filter);
    }
    if sources.is_empty() {
        bail!("no matching source configurations found");
    }

    let today = anchored_today(&options.timezone)?;
    let today_str = today.format("%Y-%m-%d").to_string();

    let mut seen = SeenStore::load(&options.seen_path)?;
    let mut cache = DetailCache::load(&options.cache_path)?;
    let snapshots = SnapshotStore::new(&options.snapshot_dir);

    let mut records = Vec::new();
    let mut reports = Vec::new();
    let mut source_names = BTreeMap::new();

    for source in &sources {
        if !source.config.source.enabled {
            info!(source = %source.config.source.key, "source disabled; skipping");
            continue;
        }
        source_names.insert(
            source.config.source.key.clone(),
            source.config.source.name.clone(),
        );

        info!(source = %source.config.source.key, "collection start");
        match collect_source(source, &mut seen, &mut cache, &today_str, options.dry_run) {
            Ok((source_records, report)) => {
                records.extend(source_records);
                reports.push(report);
            }
            Err(err) => {
                // Fault isolation at source granularity.
                error!(
                    source = %source.config.source.key,
                    error = %format!("{err:#}"),
                    "source collection failed; continuing with remaining sources"
                );
            }
        }
    }

    let snapshot = assemble_snapshot(&today_str, &records, &source_names);
    let snapshot_path = if options.dry_run {
        info!("dry run enabled; snapshot and stores not persisted");
        None
    } else {
        let path = snapshots.write(&snapshot)?;
        snapshots.prune(today)?;
        seen.save()?;
        info!(
            snapshot = %path.display(),
            total = snapshot.total,
            new = snapshot.new_count,
            "snapshot written"
        );
        Some(path)
    };

    Ok(RunSummary {
        records,
        reports,
        snapshot_path,
    })
}

fn collect_source(
    source: &LoadedSource,
    seen: &mut SeenStore,
    cache: &mut DetailCache,
    today: &str,
    dry_run: bool,
) -> Result<(Vec<AnnouncementRecord>, SourceReport)> {
    let key = source.config.source.key.as_str();
    let resolver = IdentityResolver::for_source(&source.config.identity)?;
    let fetcher = fetcher_for_source(source)?;
    let profile = ExtractProfile::from_config(&source.config.detail);

    let outcome = collect_listing(source, fetcher.as_ref(), &resolver, seen)?;

    let mut report = SourceReport {
        source_key: key.to_string(),
        pages_fetched: outcome.pages_fetched,
        items_listed: outcome.items.len(),
        halted_on_error: outcome.halted_on_error,
        ..SourceReport::default()
    };

    let (items, dropped) = dedup_by_title(outcome.items);
    report.title_deduped = dropped;

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let is_new = !seen.contains(&item.id);

        let detail = if !source.config.detail.enabled {
            Detail::default()
        } else if let Some(cached) = cache.get(&item.id) {
            cached.clone()
        } else {
            match fetcher.fetch_document(&item.url) {
                Ok(body) => {
                    let doc = Html::parse_document(&body);
                    let detail = extract_detail(&doc, &profile);
                    report.details_fetched += 1;
                    // Cached even when all fields came back empty, so the
                    // page is not refetched on the next run.
                    if !dry_run {
                        cache.insert_and_save(&item.id, detail.clone())?;
                    }
                    detail
                }
                Err(err) => {
                    // Degrade to an empty detail; not cached, so the next
                    // run gets another chance at this page.
                    warn!(
                        source = key,
                        id = %item.id,
                        url = %item.url,
                        error = %err,
                        "detail fetch failed; record keeps an empty detail"
                    );
                    report.detail_failures += 1;
                    Detail::default()
                }
            }
        };

        let date = match detail.period.as_deref() {
            Some(period) if !period.trim().is_empty() => normalize_deadline(period),
            _ => normalize_deadline(&item.raw_date),
        };

        if is_new {
            report.new_items += 1;
            if !dry_run {
                seen.mark(&item.id, today);
            }
        }

        records.push(AnnouncementRecord {
            id: item.id,
            region: classify::region_tag(&item.title),
            region_category: classify::region_category(&item.title),
            category: classify::category(&item.title),
            is_target: classify::is_target(&item.title),
            detail: detail.filled(),
            title: item.title,
            url: item.url,
            date,
            is_new,
        });
    }

    info!(
        source = key,
        pages = report.pages_fetched,
        listed = report.items_listed,
        deduped = report.title_deduped,
        new = report.new_items,
        details = report.details_fetched,
        detail_failures = report.detail_failures,
        "collection summary"
    );

    Ok((records, report))
}

fn assemble_snapshot(
    date: &str,
    records: &[AnnouncementRecord],
    source_names: &BTreeMap<String, String>,
) -> DailySnapshot {
    let mut sources: BTreeMap<String, SourceSnapshot> = BTreeMap::new();

    for (key, name) in source_names {
        sources.insert(
            key.clone(),
            SourceSnapshot {
                name: name.clone(),
                count: 0,
                new_count: 0,
                items: Vec::new(),
            },
        );
    }

    for record in records {
        let source_key = record
            .id
            .split_once(':')
            .map(|(key, _)| key)
            .unwrap_or(record.id.as_str());
        let Some(entry) = sources.get_mut(source_key) else {
            continue;
        };
        entry.count += 1;
        if record.is_new {
            entry.new_count += 1;
        }
        entry.items.push(record.clone());
    }

    DailySnapshot {
        date: date.to_string(),
        total: records.len(),
        new_count: records.iter().filter(|r| r.is_new).count(),
        target_count: records.iter().filter(|r| r.is_target).count(),
        sources,
    }
}

fn anchored_today(timezone: &str) -> Result<NaiveDate> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone {timezone}"))?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

pub fn validate_configs(options: &ValidateOptions) -> Result<Vec<String>> {
    let mut messages = Vec::new();

    if let Some(file) = &options.source_file {
        let source = load_source_file(file)?;
        messages.push(format!(
            "OK: {} ({})",
            source.config.source.key,
            file.display()
        ));
        return Ok(messages);
    }

    if let Some(dir) = &options.config_dir {
        let sources = load_sources_from_dir(dir)?;
        for source in sources {
            messages.push(format!(
                "OK: {} ({})",
                source.config.source.key,
                source.path.display()
            ));
        }
        return Ok(messages);
    }

    bail!("either --config-dir or --source-file must be provided");
}

pub fn load_snapshot_for_read(snapshot_dir: &Path, date: &str) -> Result<DailySnapshot> {
    SnapshotStore::new(snapshot_dir)
        .read(date)
        .with_context(|| format!("no snapshot for {date} under {}", snapshot_dir.display()))
}
