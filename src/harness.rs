use crate::pipeline::{RunOptions, run_collection};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub config_dir: PathBuf,
    pub seen_path: PathBuf,
    pub cache_path: PathBuf,
    pub snapshot_dir: PathBuf,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub sources: usize,
    pub first_run_records: usize,
    pub first_run_new: usize,
    pub first_run_details_fetched: usize,
    pub second_run_records: usize,
    pub second_run_new: usize,
    pub second_run_details_fetched: usize,
    pub snapshot_files: usize,
}

/// Offline self-check: from a clean slate, collect twice against the
/// configured (typically file-mode) sources. With an unchanged listing the
/// second run must report zero new items and zero detail fetches -- the
/// novelty and cache-once guarantees in one observable number each.
pub fn run_harness(options: &HarnessOptions) -> Result<HarnessReport> {
    if options.snapshot_dir.exists() {
        std::fs::remove_dir_all(&options.snapshot_dir)?;
    }
    for path in [&options.seen_path, &options.cache_path] {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
    }

    let run_options = RunOptions {
        config_dir: options.config_dir.clone(),
        seen_path: options.seen_path.clone(),
        cache_path: options.cache_path.clone(),
        snapshot_dir: options.snapshot_dir.clone(),
        source: None,
        dry_run: false,
        timezone: options.timezone.clone(),
    };

    let first = run_collection(&run_options)?;
    let second = run_collection(&run_options)?;

    let mut snapshot_files = 0usize;
    for entry in WalkDir::new(&options.snapshot_dir) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("json")
        {
            snapshot_files += 1;
        }
    }

    Ok(HarnessReport {
        sources: first.reports.len(),
        first_run_records: first.records.len(),
        first_run_new: first.new_records().len(),
        first_run_details_fetched: first.reports.iter().map(|r| r.details_fetched).sum(),
        second_run_records: second.records.len(),
        second_run_new: second.new_records().len(),
        second_run_details_fetched: second.reports.iter().map(|r| r.details_fetched).sum(),
        snapshot_files,
    })
}
