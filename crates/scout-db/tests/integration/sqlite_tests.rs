use chrono::TimeDelta;
use scout_core::config::RetentionConfig;
use scout_core::scoring::ScoreBucket;
use scout_core::traits::RunStore;
use scout_db::SqliteRunStore;

use crate::integration::common::{
    count_rows, enriched, sample_jobs, scored, started_at, summary, temp_dir,
};

#[tokio::test]
async fn init_creates_database_and_is_idempotent() {
    let dir = temp_dir();
    let db = dir.path().join("nested/scout.db");
    let store = SqliteRunStore::new(&db);

    store.init().await.unwrap();
    store.init().await.unwrap();

    assert!(db.exists());
    assert!(store.list_runs().await.unwrap().is_empty());
    assert_eq!(store.last_run_at().await.unwrap(), None);
}

#[tokio::test]
async fn job_inserts_ignore_duplicates() {
    let dir = temp_dir();
    let db = dir.path().join("scout.db");
    let store = SqliteRunStore::new(&db);
    store.init().await.unwrap();

    let run = summary(14);
    store.insert_run(&run).await.unwrap();

    let jobs = sample_jobs();
    assert_eq!(store.insert_jobs(&run.run_ts, &jobs).await.unwrap(), 2);
    assert_eq!(store.insert_jobs(&run.run_ts, &jobs).await.unwrap(), 0);
    assert_eq!(count_rows(&db, "jobs", Some(&run.run_ts)).await, 2);
}

#[tokio::test]
async fn enriched_and_scores_are_replaced() {
    let dir = temp_dir();
    let db = dir.path().join("scout.db");
    let store = SqliteRunStore::new(&db);
    store.init().await.unwrap();

    let run = summary(14);
    store.insert_run(&run).await.unwrap();
    let jobs = sample_jobs();

    let first: Vec<_> = jobs.iter().map(|j| enriched(j, "mid")).collect();
    let second: Vec<_> = jobs.iter().map(|j| enriched(j, "senior")).collect();
    assert_eq!(store.insert_enriched(&run.run_ts, &first).await.unwrap(), 2);
    assert_eq!(store.insert_enriched(&run.run_ts, &second).await.unwrap(), 2);
    assert_eq!(count_rows(&db, "enriched", Some(&run.run_ts)).await, 2);

    let scores = vec![scored(&jobs[0], 0.9, ScoreBucket::Exceptional)];
    store.insert_scores(&run.run_ts, &scores).await.unwrap();
    store.insert_scores(&run.run_ts, &scores).await.unwrap();
    assert_eq!(count_rows(&db, "scores", Some(&run.run_ts)).await, 1);
}

#[tokio::test]
async fn insert_run_is_idempotent_and_keeps_children() {
    let dir = temp_dir();
    let db = dir.path().join("scout.db");
    let store = SqliteRunStore::new(&db);
    store.init().await.unwrap();

    let run = summary(14);
    store.insert_run(&run).await.unwrap();
    store.insert_jobs(&run.run_ts, &sample_jobs()).await.unwrap();
    store.insert_run(&run).await.unwrap();

    assert_eq!(store.list_runs().await.unwrap(), vec![run.run_ts.clone()]);
    assert_eq!(count_rows(&db, "jobs", Some(&run.run_ts)).await, 2);
    assert_eq!(store.last_run_at().await.unwrap(), Some(started_at(14)));
}

#[tokio::test]
async fn prune_keeps_newest_runs_and_cascades() {
    let dir = temp_dir();
    let db = dir.path().join("scout.db");
    let store = SqliteRunStore::new(&db);
    store.init().await.unwrap();

    for day in 1..=5 {
        let run = summary(day);
        store.insert_run(&run).await.unwrap();
        store.insert_jobs(&run.run_ts, &sample_jobs()).await.unwrap();
    }
    assert_eq!(count_rows(&db, "jobs", None).await, 10);

    let retention = RetentionConfig {
        enabled: true,
        days: Some(0),
        keep_latest_n_runs: 3,
    };
    let now = started_at(5) + TimeDelta::hours(1);
    let report = store.prune(&retention, now).await.unwrap();

    assert_eq!(
        report.deleted_runs,
        vec!["20260301_091500", "20260302_091500"]
    );
    assert_eq!(
        store.list_runs().await.unwrap(),
        vec!["20260303_091500", "20260304_091500", "20260305_091500"]
    );
    assert_eq!(count_rows(&db, "jobs", None).await, 6);
    assert_eq!(count_rows(&db, "jobs", Some("20260301_091500")).await, 0);
}

#[tokio::test]
async fn prune_without_days_deletes_nothing() {
    let dir = temp_dir();
    let store = SqliteRunStore::new(dir.path().join("scout.db"));
    store.init().await.unwrap();
    for day in 1..=3 {
        store.insert_run(&summary(day)).await.unwrap();
    }

    let report = store
        .prune(&RetentionConfig::default(), started_at(20))
        .await
        .unwrap();

    assert!(report.deleted_runs.is_empty());
    assert_eq!(store.list_runs().await.unwrap().len(), 3);
}
