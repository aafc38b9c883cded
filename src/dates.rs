// =============================================================================
// Date-range validation — provider history floors and range repair
// =============================================================================
//
// The dashboard lets the user pick any start/end pair, but the provider only
// serves a bounded window of intraday history. These are the pure rules the
// UI clamp used to apply reactively: push the start up to the floor, and
// reset an end that precedes the start. Every adjustment is reported so the
// caller can show a notice; none of them is an error.
// =============================================================================

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::types::Granularity;

/// What `normalize_range` had to fix, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeNotice {
    /// Start predated the provider's history floor for this granularity.
    StartClamped {
        requested: NaiveDate,
        effective: NaiveDate,
    },
    /// End preceded start; end was reset to today.
    EndReset {
        requested: NaiveDate,
        effective: NaiveDate,
    },
}

/// Earliest start date the provider serves for `granularity`, relative to
/// `today`.
pub fn history_floor(granularity: Granularity, today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(granularity.history_limit_days() as u64))
        .unwrap_or(NaiveDate::MIN)
}

/// Clamp a requested start date against the provider floor.
pub fn clamp_start_date(requested: NaiveDate, floor: NaiveDate) -> NaiveDate {
    requested.max(floor)
}

/// Repair a user-chosen range: clamp the start to the history floor, then
/// reset the end to `today` when it precedes the (clamped) start.
pub fn normalize_range(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    granularity: Granularity,
) -> (NaiveDate, NaiveDate, Vec<RangeNotice>) {
    let mut notices = Vec::new();

    let floor = history_floor(granularity, today);
    let effective_start = clamp_start_date(start, floor);
    if effective_start != start {
        notices.push(RangeNotice::StartClamped {
            requested: start,
            effective: effective_start,
        });
    }

    let mut effective_end = end;
    if effective_end < effective_start {
        effective_end = today;
        notices.push(RangeNotice::EndReset {
            requested: end,
            effective: effective_end,
        });
    }

    (effective_start, effective_end, notices)
}
