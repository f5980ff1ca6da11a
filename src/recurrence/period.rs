//! Cycle boundaries and the period keys used to deduplicate materialized tasks.
//!
//! Weeks start on Monday. Keys are `YYYY-MM-DD` of the week start for weekly
//! rules, `YYYY-MM` for monthly rules and `YYYY-MM-DD` of the day itself for
//! daily rules. A key depends only on the reference date and the schedule type.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::ScheduleType;

/// Monday of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    // Sunday = 0 convention, shifted so Monday is day zero of the week.
    let weekday = date.weekday().num_days_from_sunday() as i64;
    date - Duration::days((weekday + 6) % 7)
}

/// Sunday of the week containing `date`.
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date) + Duration::days(6)
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    end_of_month(date).day()
}

/// First day of the cycle containing `date`.
pub fn period_start(date: NaiveDate, schedule: ScheduleType) -> NaiveDate {
    match schedule {
        ScheduleType::Daily => date,
        ScheduleType::Weekly => start_of_week(date),
        ScheduleType::Monthly => start_of_month(date),
    }
}

/// Last day of the cycle containing `date`.
pub fn period_end(date: NaiveDate, schedule: ScheduleType) -> NaiveDate {
    match schedule {
        ScheduleType::Daily => date,
        ScheduleType::Weekly => end_of_week(date),
        ScheduleType::Monthly => end_of_month(date),
    }
}

/// Canonical identifier of the cycle containing `date`.
pub fn period_key(date: NaiveDate, schedule: ScheduleType) -> String {
    match schedule {
        ScheduleType::Daily => date.format("%Y-%m-%d").to_string(),
        ScheduleType::Weekly => start_of_week(date).format("%Y-%m-%d").to_string(),
        ScheduleType::Monthly => date.format("%Y-%m").to_string(),
    }
}

/// Signed number of whole cycles from the cycle of `from` to the cycle of `to`.
pub fn periods_between(from: NaiveDate, to: NaiveDate, schedule: ScheduleType) -> i64 {
    match schedule {
        ScheduleType::Daily => (to - from).num_days(),
        ScheduleType::Weekly => (start_of_week(to) - start_of_week(from)).num_days() / 7,
        ScheduleType::Monthly => {
            let months = |d: NaiveDate| d.year() as i64 * 12 + d.month0() as i64;
            months(to) - months(from)
        }
    }
}
