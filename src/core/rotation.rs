//! Rotation and retention policies for file sinks
//!
//! [`RotationPolicy`] decides, for every record about to be appended, whether
//! the active file must be swapped first. It combines two triggers:
//!
//! - size: the file already holds data and the pending record would push it
//!   past the limit;
//! - time: the record's timestamp reached the next daily cutover.
//!
//! The policy keeps the next cutover as state. It is owned by a single file
//! writer, which is only ever reached through its sink's lock, so decision
//! and swap happen atomically.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Why a rotation was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    Size,
    Time,
}

/// When to rotate the active file
///
/// # Examples
///
/// ```
/// use rust_log_loader::core::{RotationPolicy, RotationTrigger};
/// use chrono::Local;
///
/// let mut policy = RotationPolicy::size(1000);
/// let now = Local::now();
/// assert_eq!(policy.should_rotate(0, 5000, &now), None);
/// assert_eq!(policy.should_rotate(900, 200, &now), Some(RotationTrigger::Size));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    size_limit: Option<u64>,
    rotate_time: Option<NaiveTime>,
    next_cutover: Option<DateTime<Local>>,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::never()
    }
}

impl RotationPolicy {
    /// Policy with both triggers, cutover computed from the current time
    pub fn new(size_limit: Option<u64>, rotate_time: Option<NaiveTime>) -> Self {
        Self::starting_at(size_limit, rotate_time, &Local::now())
    }

    /// Policy whose first cutover is computed relative to `now`
    ///
    /// The first cutover is today at `rotate_time`, or tomorrow when `now`
    /// is already at or past it.
    pub fn starting_at(
        size_limit: Option<u64>,
        rotate_time: Option<NaiveTime>,
        now: &DateTime<Local>,
    ) -> Self {
        let next_cutover = rotate_time.map(|time| {
            let today = at_local(now.date_naive(), time);
            if *now >= today {
                next_day(today, time)
            } else {
                today
            }
        });

        Self {
            size_limit,
            rotate_time,
            next_cutover,
        }
    }

    #[must_use]
    pub fn size(limit: u64) -> Self {
        Self::new(Some(limit), None)
    }

    #[must_use]
    pub fn daily(at: NaiveTime) -> Self {
        Self::new(None, Some(at))
    }

    #[must_use]
    pub fn never() -> Self {
        Self {
            size_limit: None,
            rotate_time: None,
            next_cutover: None,
        }
    }

    pub fn size_limit(&self) -> Option<u64> {
        self.size_limit
    }

    pub fn rotate_time(&self) -> Option<NaiveTime> {
        self.rotate_time
    }

    /// Next absolute time-based cutover, if a daily time is set
    pub fn next_cutover(&self) -> Option<DateTime<Local>> {
        self.next_cutover
    }

    /// Decide whether to rotate before appending `pending_bytes`
    ///
    /// An empty file is never rotated for size, so a single record larger
    /// than the limit is written whole. When the time check fires the
    /// cutover advances past `timestamp`, even if the size check already
    /// asked for the rotation.
    pub fn should_rotate(
        &mut self,
        current_size: u64,
        pending_bytes: u64,
        timestamp: &DateTime<Local>,
    ) -> Option<RotationTrigger> {
        let size_due = match self.size_limit {
            Some(limit) => current_size > 0 && current_size.saturating_add(pending_bytes) > limit,
            None => false,
        };

        let mut time_due = false;
        if let (Some(cutover), Some(time)) = (self.next_cutover, self.rotate_time) {
            if *timestamp >= cutover {
                time_due = true;
                self.next_cutover = Some(advance_past(cutover, time, timestamp));
            }
        }

        if size_due {
            Some(RotationTrigger::Size)
        } else if time_due {
            Some(RotationTrigger::Time)
        } else {
            None
        }
    }
}

/// How many archives to keep, and whether to gzip them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub backup_count: usize,
    pub compress: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            backup_count: 90,
            compress: false,
        }
    }
}

impl RetentionPolicy {
    pub fn new(backup_count: usize) -> Self {
        Self {
            backup_count,
            compress: false,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

fn at_local(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = date.and_time(time);
    // a cutover inside a DST gap falls back to the same wall time read as UTC
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

fn next_day(cutover: DateTime<Local>, time: NaiveTime) -> DateTime<Local> {
    add_days(cutover, time, 1)
}

fn add_days(cutover: DateTime<Local>, time: NaiveTime, days: u64) -> DateTime<Local> {
    cutover
        .date_naive()
        .checked_add_days(Days::new(days))
        .map(|date| at_local(date, time))
        .unwrap_or_else(|| DateTime::<Utc>::MAX_UTC.with_timezone(&Local))
}

/// Move `cutover` forward by whole days until it lies strictly after `timestamp`
fn advance_past(
    cutover: DateTime<Local>,
    time: NaiveTime,
    timestamp: &DateTime<Local>,
) -> DateTime<Local> {
    let elapsed_days = (*timestamp - cutover).num_days().max(0) as u64;
    let mut next = add_days(cutover, time, elapsed_days + 1);
    // DST shifts can leave the computed day one short
    while next <= *timestamp {
        let later = next_day(next, time);
        if later <= next {
            break;
        }
        next = later;
    }
    next
}
