use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::models::{DueStrategy, RecurringTemplate, ScheduleType, Subtask, Task, TaskExtras};
use crate::recurrence::period::{
    days_in_month, period_end, period_key, period_start, periods_between,
};

/// Builds the task instances missing for the current cycle of every active template.
///
/// Pure: the result depends only on the arguments. New ids continue from the
/// highest id in `existing`. A `(template id, period key)` pair that already
/// appears in `existing`, or earlier in this same pass, is never produced again,
/// so calling this repeatedly with its own output appended yields nothing new.
pub fn materialize(
    templates: &[RecurringTemplate],
    existing: &[Task],
    now: NaiveDateTime,
) -> Vec<Task> {
    let mut seen: HashSet<(u64, String)> = existing
        .iter()
        .filter_map(|t| {
            let id = t.extras.recurrence_id?;
            let key = t.extras.period_key.clone()?;
            Some((id, key))
        })
        .collect();
    let mut next_id = existing.iter().map(|t| t.id).max().unwrap_or(0) + 1;
    let today = now.date();
    let mut created = Vec::new();

    for tmpl in templates.iter().filter(|t| t.active) {
        if !fires_in_period(tmpl, today) {
            debug!(template = tmpl.id, "interval gate closed for this period");
            continue;
        }

        let targets = target_dates(tmpl, today);
        if targets.is_empty() {
            debug!(template = tmpl.id, "rule yields no target dates, skipping");
            continue;
        }

        for target in targets {
            let key = period_key(target, tmpl.rule.schedule_type);
            if !seen.insert((tmpl.id, key.clone())) {
                debug!(template = tmpl.id, period = %key, "already materialized");
                continue;
            }
            let task = build_instance(tmpl, next_id, target, key, now);
            info!(template = tmpl.id, task = task.id, period = ?task.extras.period_key, "materialized recurring task");
            next_id += 1;
            created.push(task);
        }
    }

    created
}

/// Interval gating: with `interval > 1` and a parsable anchor, fire only when the
/// number of whole periods since the anchor's period is a non-negative multiple
/// of the interval.
pub fn fires_in_period(tmpl: &RecurringTemplate, today: NaiveDate) -> bool {
    let interval = tmpl.rule.effective_interval();
    if interval <= 1 {
        return true;
    }
    let Some(anchor) = tmpl.rule.parsed_anchor() else {
        return true;
    };
    let diff = periods_between(anchor, today, tmpl.rule.schedule_type);
    diff >= 0 && diff % interval as i64 == 0
}

/// Concrete dates this template targets in the cycle containing `today`.
pub fn target_dates(tmpl: &RecurringTemplate, today: NaiveDate) -> Vec<NaiveDate> {
    let rule = &tmpl.rule;
    let start = period_start(today, rule.schedule_type);
    if rule.flexible {
        return vec![start];
    }
    match rule.schedule_type {
        ScheduleType::Daily => vec![today],
        ScheduleType::Weekly => {
            let mut offsets: Vec<i64> = rule
                .days_of_week
                .iter()
                .filter(|&&d| d <= 6)
                // Sunday (0) is the last day of a Monday-anchored week.
                .map(|&d| (d as i64 + 6) % 7)
                .collect();
            offsets.sort_unstable();
            offsets.dedup();
            offsets.into_iter().map(|o| start + Duration::days(o)).collect()
        }
        ScheduleType::Monthly => match rule.day_of_month {
            Some(day) if day >= 1 => start
                .with_day(day.min(days_in_month(start)))
                .into_iter()
                .collect(),
            _ => Vec::new(),
        },
    }
}

/// Due date for an instance targeting `target`.
pub fn due_date_for(strategy: DueStrategy, target: NaiveDate) -> Option<NaiveDate> {
    match strategy {
        DueStrategy::SameDay => Some(target),
        DueStrategy::EndOfWeek => Some(period_end(target, ScheduleType::Weekly)),
        DueStrategy::EndOfMonth => Some(period_end(target, ScheduleType::Monthly)),
        DueStrategy::None => None,
    }
}

fn build_instance(
    tmpl: &RecurringTemplate,
    id: u64,
    target: NaiveDate,
    period_key: String,
    now: NaiveDateTime,
) -> Task {
    let mut task = Task::new(id, tmpl.title.clone(), now);
    task.status = tmpl.status;
    task.priority = tmpl.priority;
    task.due_date = due_date_for(tmpl.due_strategy, target);
    task.owners = tmpl.owners.clone();
    task.tags = tmpl.tags.clone();
    task.notes = tmpl.notes.clone();
    task.next_step = tmpl.next_step.clone();
    task.subtasks = tmpl
        .subtasks
        .iter()
        .map(|s| Subtask { title: s.title.clone(), done: false })
        .collect();
    task.extras = TaskExtras {
        recurrence_id: Some(tmpl.id),
        period_key: Some(period_key),
    };
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, RecurrenceRule, TaskStatus};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(date: NaiveDate) -> NaiveDateTime {
        date.and_hms_opt(9, 0, 0).unwrap()
    }

    fn weekly(id: u64, days: &[u8]) -> RecurringTemplate {
        let mut rule = RecurrenceRule::new(ScheduleType::Weekly);
        rule.days_of_week = days.to_vec();
        RecurringTemplate::new(id, "Weekly sync", rule)
    }

    fn monthly(id: u64, day: u32) -> RecurringTemplate {
        let mut rule = RecurrenceRule::new(ScheduleType::Monthly);
        rule.day_of_month = Some(day);
        RecurringTemplate::new(id, "Pay rent", rule)
    }

    #[test]
    fn weekday_targets_map_sunday_to_week_end() {
        // 2025-06-04 is a Wednesday; its week runs 06-02 .. 06-08.
        let tmpl = weekly(1, &[0, 1, 5]);
        assert_eq!(
            target_dates(&tmpl, d(2025, 6, 4)),
            vec![d(2025, 6, 2), d(2025, 6, 6), d(2025, 6, 8)]
        );
    }

    #[test]
    fn flexible_weekly_targets_monday_only() {
        let mut tmpl = weekly(1, &[3, 4]);
        tmpl.rule.flexible = true;
        assert_eq!(target_dates(&tmpl, d(2025, 6, 7)), vec![d(2025, 6, 2)]);
    }

    #[test]
    fn flexible_monthly_targets_first_of_month() {
        let mut tmpl = monthly(1, 20);
        tmpl.rule.flexible = true;
        assert_eq!(target_dates(&tmpl, d(2025, 6, 17)), vec![d(2025, 6, 1)]);
    }

    #[test]
    fn day_of_month_clamps_to_month_length() {
        let tmpl = monthly(1, 31);
        assert_eq!(target_dates(&tmpl, d(2025, 4, 10)), vec![d(2025, 4, 30)]);
        assert_eq!(target_dates(&tmpl, d(2024, 2, 3)), vec![d(2024, 2, 29)]);
    }

    #[test]
    fn malformed_rules_yield_nothing() {
        assert!(target_dates(&weekly(1, &[]), d(2025, 6, 4)).is_empty());
        assert!(target_dates(&weekly(1, &[9]), d(2025, 6, 4)).is_empty());
        let mut tmpl = monthly(2, 1);
        tmpl.rule.day_of_month = None;
        assert!(target_dates(&tmpl, d(2025, 6, 4)).is_empty());
        tmpl.rule.day_of_month = Some(0);
        assert!(target_dates(&tmpl, d(2025, 6, 4)).is_empty());

        let out = materialize(&[weekly(1, &[])], &[], at(d(2025, 6, 4)));
        assert!(out.is_empty());
    }

    #[test]
    fn instance_copies_template_defaults() {
        let mut tmpl = monthly(4, 15);
        tmpl.priority = Some(Priority::High);
        tmpl.status = TaskStatus::Doing;
        tmpl.owners = vec!["ana".into()];
        tmpl.tags = vec!["home".into()];
        tmpl.notes = "transfer".into();
        tmpl.next_step = "open bank app".into();
        tmpl.subtasks = vec![Subtask { title: "check".into(), done: true }];

        let now = at(d(2025, 6, 4));
        let out = materialize(&[tmpl], &[], now);
        assert_eq!(out.len(), 1);
        let task = &out[0];
        assert_eq!(task.id, 1);
        assert_eq!(task.title, "Pay rent");
        assert_eq!(task.status, TaskStatus::Doing);
        assert_eq!(task.priority, Some(Priority::High));
        assert_eq!(task.owners, vec!["ana".to_string()]);
        assert_eq!(task.tags, vec!["home".to_string()]);
        assert_eq!(task.notes, "transfer");
        assert_eq!(task.next_step, "open bank app");
        assert!(!task.subtasks[0].done);
        assert_eq!(task.due_date, Some(d(2025, 6, 15)));
        assert_eq!(task.extras.recurrence_id, Some(4));
        assert_eq!(task.extras.period_key.as_deref(), Some("2025-06"));
        assert_eq!(task.created_at, now);
        assert_eq!(task.updated_at, now);
    }

    #[test]
    fn due_strategies() {
        let target = d(2025, 6, 4);
        assert_eq!(due_date_for(DueStrategy::SameDay, target), Some(target));
        assert_eq!(due_date_for(DueStrategy::EndOfWeek, target), Some(d(2025, 6, 8)));
        assert_eq!(due_date_for(DueStrategy::EndOfMonth, target), Some(d(2025, 6, 30)));
        assert_eq!(due_date_for(DueStrategy::None, target), None);
    }

    #[test]
    fn ids_continue_after_existing_tasks() {
        let existing = vec![Task::new(41, "old", at(d(2025, 6, 1)))];
        let out = materialize(&[monthly(1, 3), monthly(2, 5)], &existing, at(d(2025, 6, 4)));
        let ids: Vec<u64> = out.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![42, 43]);
    }

    #[test]
    fn inactive_templates_are_ignored() {
        let mut tmpl = monthly(1, 3);
        tmpl.active = false;
        assert!(materialize(&[tmpl], &[], at(d(2025, 6, 4))).is_empty());
    }

    #[test]
    fn several_weekdays_collapse_into_one_instance_per_week() {
        let out = materialize(&[weekly(1, &[1, 3, 5])], &[], at(d(2025, 6, 4)));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].due_date, Some(d(2025, 6, 2)));
        assert_eq!(out[0].extras.period_key.as_deref(), Some("2025-06-02"));
    }

    #[test]
    fn unparsable_anchor_disables_gating() {
        let mut tmpl = weekly(1, &[1]);
        tmpl.rule.interval = 2;
        tmpl.rule.anchor_date = Some("not a date".into());
        assert!(fires_in_period(&tmpl, d(2025, 6, 4)));
        assert!(fires_in_period(&tmpl, d(2025, 6, 11)));
    }

    #[test]
    fn anchor_in_the_future_blocks_interval_rules() {
        let mut tmpl = monthly(1, 1);
        tmpl.rule.interval = 3;
        tmpl.rule.anchor_date = Some("2025-09-01".into());
        assert!(!fires_in_period(&tmpl, d(2025, 6, 4)));
        assert!(fires_in_period(&tmpl, d(2025, 9, 20)));
        assert!(!fires_in_period(&tmpl, d(2025, 10, 20)));
        assert!(fires_in_period(&tmpl, d(2025, 12, 1)));
    }
}
