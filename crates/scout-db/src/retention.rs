use chrono::{DateTime, TimeDelta, Utc};
use scout_core::config::RetentionConfig;
use scout_core::summary::parse_run_ts;
use scout_core::traits::PruneReport;

/// Decide which runs to delete.
///
/// `runs` may be in any order. A run is deleted only when it is older than
/// `now - days` and not among the newest `keep_latest_n_runs`. With
/// retention disabled or no `days` configured nothing is deleted. Runs whose
/// identifier doesn't parse are always kept. A cutoff too far in the past
/// to represent keeps everything. Both lists come back ascending.
pub fn plan_retention(
    runs: &[String],
    retention: &RetentionConfig,
    now: DateTime<Utc>,
) -> PruneReport {
    let mut sorted: Vec<String> = runs.to_vec();
    sorted.sort();
    sorted.dedup();

    let days = match retention.days {
        Some(days) if retention.enabled => days.max(0),
        _ => {
            return PruneReport {
                deleted_runs: Vec::new(),
                kept_runs: sorted,
            };
        }
    };

    let Some(cutoff) = TimeDelta::try_days(days).and_then(|d| now.checked_sub_signed(d)) else {
        return PruneReport {
            deleted_runs: Vec::new(),
            kept_runs: sorted,
        };
    };
    let protected_from = sorted.len().saturating_sub(retention.keep_latest());

    let mut report = PruneReport::default();
    for (idx, run_ts) in sorted.into_iter().enumerate() {
        let expired = parse_run_ts(&run_ts).is_some_and(|at| at < cutoff);
        if idx < protected_from && expired {
            report.deleted_runs.push(run_ts);
        } else {
            report.kept_runs.push(run_ts);
        }
    }
    report
}
