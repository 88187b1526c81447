//! Scheduling gate: decide whether a run is due.
//!
//! Pure functions over UTC timestamps. In interval mode a run is due once
//! `interval_minutes` have passed since the last one. In window mode at most
//! one run happens per day, at or after the daily `HH:MM` window.
//!
//! A non-positive `interval_minutes` means the default of 60. An interval
//! too large to represent never comes due.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

use crate::config::{ScheduleConfig, ScheduleMode};

fn default_window() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// The configured daily window, or 09:00 when it doesn't parse.
pub fn window_time(config: &ScheduleConfig) -> NaiveTime {
    NaiveTime::parse_from_str(config.window_time.trim(), "%H:%M").unwrap_or_else(|_| default_window())
}

const DEFAULT_INTERVAL_MINUTES: i64 = 60;

/// Interval between runs. Non-positive values mean the default hour;
/// out-of-range values saturate at [`TimeDelta::MAX`].
pub fn interval(config: &ScheduleConfig) -> TimeDelta {
    let minutes = if config.interval_minutes > 0 {
        config.interval_minutes
    } else {
        DEFAULT_INTERVAL_MINUTES
    };
    TimeDelta::try_minutes(minutes).unwrap_or(TimeDelta::MAX)
}

fn todays_window(now: DateTime<Utc>, config: &ScheduleConfig) -> DateTime<Utc> {
    now.date_naive().and_time(window_time(config)).and_utc()
}

/// When the next run should happen, seen from `now`.
pub fn compute_next_run(now: DateTime<Utc>, config: &ScheduleConfig) -> DateTime<Utc> {
    match config.mode {
        ScheduleMode::Window => {
            let today = todays_window(now, config);
            if now <= today {
                today
            } else {
                today
                    .checked_add_signed(TimeDelta::days(1))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            }
        }
        ScheduleMode::Interval => now
            .checked_add_signed(interval(config))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}

/// Whether a run should start at `now`, given the previous run's start time.
pub fn should_run(
    now: DateTime<Utc>,
    last_run: Option<DateTime<Utc>>,
    config: &ScheduleConfig,
) -> bool {
    match config.mode {
        ScheduleMode::Window => {
            let today = todays_window(now, config);
            if now < today {
                return false;
            }
            match last_run {
                None => true,
                Some(last) => last < today,
            }
        }
        ScheduleMode::Interval => match last_run {
            None => true,
            Some(last) => now.signed_duration_since(last) >= interval(config),
        },
    }
}
