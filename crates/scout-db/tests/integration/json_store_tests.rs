use chrono::TimeDelta;
use scout_core::config::RetentionConfig;
use scout_core::models::CanonicalJob;
use scout_core::scoring::ScoreBucket;
use scout_core::summary::RunSummary;
use scout_core::traits::RunStore;
use scout_db::JsonRunStore;

use crate::integration::common::{enriched, sample_jobs, scored, started_at, summary, temp_dir};

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[tokio::test]
async fn writes_run_directory_layout() {
    let dir = temp_dir();
    let store = JsonRunStore::new(dir.path().join("runs"));
    store.init().await.unwrap();

    let run = summary(14);
    store.insert_run(&run).await.unwrap();
    let jobs = sample_jobs();
    store.insert_jobs(&run.run_ts, &jobs).await.unwrap();

    let run_dir = store.run_dir(&run.run_ts);
    let saved: RunSummary =
        serde_json::from_str(&std::fs::read_to_string(run_dir.join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(saved, run);

    let lines = read_lines(&run_dir.join("jobs.jsonl"));
    assert_eq!(lines.len(), 2);
    let first: CanonicalJob = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(first, jobs[0]);

    let index: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(store.base().join("index.json")).unwrap())
            .unwrap();
    assert_eq!(index, vec![run.run_ts.clone()]);
    assert_eq!(store.last_run_at().await.unwrap(), Some(started_at(14)));
}

#[tokio::test]
async fn jobs_are_ignored_and_scores_replaced_on_conflict() {
    let dir = temp_dir();
    let store = JsonRunStore::new(dir.path());
    store.init().await.unwrap();

    let run = summary(14);
    store.insert_run(&run).await.unwrap();
    let jobs = sample_jobs();

    assert_eq!(store.insert_jobs(&run.run_ts, &jobs).await.unwrap(), 2);
    assert_eq!(store.insert_jobs(&run.run_ts, &jobs).await.unwrap(), 0);
    assert_eq!(read_lines(&store.run_dir(&run.run_ts).join("jobs.jsonl")).len(), 2);

    let enriched_jobs: Vec<_> = jobs.iter().map(|j| enriched(j, "senior")).collect();
    assert_eq!(store.insert_enriched(&run.run_ts, &enriched_jobs).await.unwrap(), 2);
    let lines = read_lines(&store.run_dir(&run.run_ts).join("enriched.jsonl"));
    let back: CanonicalJob = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(back.enrichment.unwrap().seniority, "senior");

    store
        .insert_scores(&run.run_ts, &[scored(&jobs[0], 0.3, ScoreBucket::Weak)])
        .await
        .unwrap();
    store
        .insert_scores(&run.run_ts, &[scored(&jobs[0], 0.9, ScoreBucket::Exceptional)])
        .await
        .unwrap();
    let lines = read_lines(&store.run_dir(&run.run_ts).join("scores.jsonl"));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Exceptional"));
}

#[tokio::test]
async fn prune_removes_old_run_directories() {
    let dir = temp_dir();
    let store = JsonRunStore::new(dir.path());
    store.init().await.unwrap();

    for day in 1..=5 {
        let run = summary(day);
        store.insert_run(&run).await.unwrap();
        store.insert_jobs(&run.run_ts, &sample_jobs()).await.unwrap();
    }

    let retention = RetentionConfig {
        enabled: true,
        days: Some(0),
        keep_latest_n_runs: 3,
    };
    let report = store
        .prune(&retention, started_at(5) + TimeDelta::hours(1))
        .await
        .unwrap();

    assert_eq!(report.deleted_runs.len(), 2);
    assert!(!store.run_dir("20260301_091500").exists());
    assert!(!store.run_dir("20260302_091500").exists());
    assert!(store.run_dir("20260305_091500").exists());
    assert_eq!(
        store.list_runs().await.unwrap(),
        vec!["20260303_091500", "20260304_091500", "20260305_091500"]
    );
}
