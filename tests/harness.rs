mod common;

use anyhow::Result;
use gonggo::harness::{HarnessOptions, run_harness};
use std::fs;

fn harness_options(env: &common::FixtureEnv) -> HarnessOptions {
    HarnessOptions {
        config_dir: env.config_dir.clone(),
        seen_path: env.seen_path.clone(),
        cache_path: env.cache_path.clone(),
        snapshot_dir: env.snapshot_dir.clone(),
        timezone: "Asia/Seoul".to_string(),
    }
}

#[test]
fn harness_double_run_proves_novelty_and_cache_guarantees() -> Result<()> {
    let env = common::setup_fixture_env()?;

    let report = run_harness(&harness_options(&env))?;

    assert_eq!(report.sources, 1);
    assert_eq!(report.first_run_records, 3);
    assert_eq!(report.first_run_new, 3);
    assert_eq!(report.first_run_details_fetched, 3);

    // Same listing seen again: the walk stops after its first page of
    // known items, nothing is new, and every surviving detail comes
    // from the cache.
    assert_eq!(report.second_run_records, 2);
    assert_eq!(report.second_run_new, 0);
    assert_eq!(report.second_run_details_fetched, 0);

    assert_eq!(report.snapshot_files, 1);

    Ok(())
}

#[test]
fn harness_clears_previous_state_before_running() -> Result<()> {
    let env = common::setup_fixture_env()?;

    fs::create_dir_all(&env.snapshot_dir)?;
    let stale_snapshot = env.snapshot_dir.join("snapshot-1999-01-01.json");
    fs::write(&stale_snapshot, "{}")?;
    if let Some(parent) = env.seen_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&env.seen_path, "{\"stale:1\":\"1999-01-01\"}")?;

    let report = run_harness(&harness_options(&env))?;

    // Stale state must not leak into the first run.
    assert_eq!(report.first_run_new, 3);
    assert!(!stale_snapshot.exists());

    Ok(())
}
