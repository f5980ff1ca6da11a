use std::fmt;

use crate::models::{RecurringTemplate, ScheduleType};

/// A configuration problem in a recurring template.
///
/// Findings are advisory. The materializer never consults them and keeps
/// treating incomplete rules as "nothing to create".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleIssue {
    EmptyTitle,
    NoWeekdays,
    WeekdayOutOfRange(u8),
    MissingDayOfMonth,
    DayOfMonthOutOfRange(u32),
    IntervalBelowOne(i64),
    UnparsableAnchor(String),
    IntervalWithoutAnchor(u32),
    /// Several weekdays share one weekly period key, so only the first is created.
    MultipleWeekdaysCollapse(usize),
}

impl RuleIssue {
    /// Whether the issue stops the template from producing anything.
    pub fn blocks_materialization(&self) -> bool {
        matches!(
            self,
            RuleIssue::NoWeekdays | RuleIssue::MissingDayOfMonth | RuleIssue::DayOfMonthOutOfRange(0)
        )
    }
}

impl fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleIssue::EmptyTitle => write!(f, "title is empty"),
            RuleIssue::NoWeekdays => write!(f, "weekly rule has no weekdays, nothing will be created"),
            RuleIssue::WeekdayOutOfRange(d) => write!(f, "weekday {} is outside 0..=6 and is ignored", d),
            RuleIssue::MissingDayOfMonth => write!(f, "monthly rule has no day of month, nothing will be created"),
            RuleIssue::DayOfMonthOutOfRange(d) => write!(f, "day of month {} is outside 1..=31", d),
            RuleIssue::IntervalBelowOne(i) => write!(f, "interval {} is below 1 and is treated as 1", i),
            RuleIssue::UnparsableAnchor(a) => write!(f, "anchor date '{}' cannot be parsed, interval is ignored", a),
            RuleIssue::IntervalWithoutAnchor(i) => write!(f, "interval {} has no anchor date and fires every period", i),
            RuleIssue::MultipleWeekdaysCollapse(n) => write!(
                f,
                "{} weekdays share one weekly period, only the earliest is created each week",
                n
            ),
        }
    }
}

/// Reports everything questionable about a template's configuration.
pub fn lint_template(tmpl: &RecurringTemplate) -> Vec<RuleIssue> {
    let rule = &tmpl.rule;
    let mut issues = Vec::new();

    if tmpl.title.trim().is_empty() {
        issues.push(RuleIssue::EmptyTitle);
    }

    if !rule.flexible {
        match rule.schedule_type {
            ScheduleType::Weekly => {
                let valid = rule.days_of_week.iter().filter(|&&d| d <= 6).count();
                for &d in rule.days_of_week.iter().filter(|&&d| d > 6) {
                    issues.push(RuleIssue::WeekdayOutOfRange(d));
                }
                if valid == 0 {
                    issues.push(RuleIssue::NoWeekdays);
                } else {
                    let mut distinct: Vec<u8> =
                        rule.days_of_week.iter().copied().filter(|&d| d <= 6).collect();
                    distinct.sort_unstable();
                    distinct.dedup();
                    if distinct.len() > 1 {
                        issues.push(RuleIssue::MultipleWeekdaysCollapse(distinct.len()));
                    }
                }
            }
            ScheduleType::Monthly => match rule.day_of_month {
                None => issues.push(RuleIssue::MissingDayOfMonth),
                Some(d) if d == 0 || d > 31 => issues.push(RuleIssue::DayOfMonthOutOfRange(d)),
                Some(_) => {}
            },
            ScheduleType::Daily => {}
        }
    }

    if rule.interval < 1 {
        issues.push(RuleIssue::IntervalBelowOne(rule.interval));
    }

    match &rule.anchor_date {
        Some(raw) if rule.parsed_anchor().is_none() => {
            issues.push(RuleIssue::UnparsableAnchor(raw.clone()))
        }
        None if rule.effective_interval() > 1 => {
            issues.push(RuleIssue::IntervalWithoutAnchor(rule.effective_interval()))
        }
        _ => {}
    }

    issues
}
