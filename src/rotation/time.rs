//! Time-triggered rotation policy.

use chrono::{DateTime, Datelike, Duration, Local, NaiveTime, TimeZone, Timelike, Utc, Weekday};

/// The unit a `TimeRotator` rolls over on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum When {
    /// Rolls over every `interval` seconds.
    Second,
    /// Rolls over every `interval` minutes.
    Minute,
    /// Rolls over every `interval` hours.
    Hour,
    /// Rolls over every `interval` days.
    Day,
    /// Anchored to a specific weekday's boundary, regardless of `interval`.
    Weekday(Weekday),
    /// Anchored to local/UTC midnight (or `at_time` if set), regardless of
    /// `interval`.
    Midnight,
}

/// Maintains the absolute `next_rollover_at` instant and decides when a
/// rollover is due, including resynchronizing with rotations performed by
/// other processes.
#[derive(Clone, Debug)]
pub(crate) struct TimeRotator {
    when: When,
    interval: u32,
    utc: bool,
    at_time: Option<NaiveTime>,
    last_rollover_at: DateTime<Utc>,
    next_rollover_at: DateTime<Utc>,
}

impl TimeRotator {
    pub(crate) fn new(when: When, interval: u32, utc: bool, at_time: Option<NaiveTime>, now: DateTime<Utc>) -> Self {
        let next_rollover_at = compute_next(when, interval, utc, at_time, now);
        Self {
            when,
            interval,
            utc,
            at_time,
            last_rollover_at: now,
            next_rollover_at,
        }
    }

    pub(crate) fn should_rollover(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_rollover_at
    }

    /// Advances internal state after this process performed the rotation.
    pub(crate) fn on_rotated(&mut self, now: DateTime<Utc>) {
        self.last_rollover_at = now;
        self.next_rollover_at = compute_next(self.when, self.interval, self.utc, self.at_time, now);
    }

    /// Cross-process coordination: if the active file's modification time is
    /// newer than the last rotation this instance performed, some other
    /// writer already rotated past our recorded boundary. Adopt their
    /// rotation instant as our own and recompute `next_rollover_at` from it,
    /// without performing a rotation ourselves.
    pub(crate) fn sync_with_file_mtime(&mut self, mtime: DateTime<Utc>) {
        if mtime > self.last_rollover_at {
            self.last_rollover_at = mtime;
            self.next_rollover_at = compute_next(self.when, self.interval, self.utc, self.at_time, mtime);
        }
    }
}

fn compute_next(when: When, interval: u32, utc: bool, at_time: Option<NaiveTime>, from: DateTime<Utc>) -> DateTime<Utc> {
    let interval = interval.max(1) as i64;
    match when {
        When::Second => from + Duration::seconds(interval),
        When::Minute => from + Duration::minutes(interval),
        When::Hour => from + Duration::hours(interval),
        When::Day => from + Duration::days(interval),
        When::Weekday(target) => next_wall_clock_boundary(from, utc, at_time, Some(target)),
        When::Midnight => next_wall_clock_boundary(from, utc, at_time, None),
    }
}

/// Finds the next local-or-UTC wall-clock instant, strictly after `from`, at
/// `at_time` (default midnight) on the next day matching `target_weekday`
/// (or any day, for plain midnight rotation).
fn next_wall_clock_boundary(from: DateTime<Utc>, utc: bool, at_time: Option<NaiveTime>, target_weekday: Option<Weekday>) -> DateTime<Utc> {
    let boundary_time = at_time.unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    let wall_now = if utc {
        from.naive_utc()
    } else {
        Local.from_utc_datetime(&from.naive_utc()).naive_local()
    };

    for days_ahead in 0..=7i64 {
        let candidate_date = wall_now.date() + Duration::days(days_ahead);
        if let Some(weekday) = target_weekday {
            if candidate_date.weekday() != weekday {
                continue;
            }
        }
        let candidate = candidate_date.and_time(boundary_time);
        if candidate > wall_now {
            return to_utc(candidate, utc);
        }
    }
    unreachable!("a boundary within 8 days always exists")
}

fn to_utc(wall: chrono::NaiveDateTime, utc: bool) -> DateTime<Utc> {
    if utc {
        Utc.from_utc_datetime(&wall)
    } else {
        Local
            .from_local_datetime(&wall)
            .single()
            .unwrap_or_else(|| Local.from_local_datetime(&wall).earliest().unwrap_or_else(|| Local.from_utc_datetime(&wall)))
            .with_timezone(&Utc)
    }
}
