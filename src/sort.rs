use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::Task;
use crate::zone::{classify, TaskZone};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    DueDate,
    Priority,
    CreatedAt,
    UpdatedAt,
    Title,
    Status,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One key of the list ordering, e.g. `due_date:asc`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortRule {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortRule {
    pub const DUE_DATE_ASC: SortRule = SortRule {
        field: SortField::DueDate,
        direction: SortDirection::Asc,
    };
}

impl FromStr for SortRule {
    type Err = Error;

    /// Parses `field[:asc|:desc]`, ascending when no direction is given.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, dir) = s.split_once(':').unwrap_or((s, "asc"));
        let field = match field.trim().to_lowercase().replace('-', "_").as_str() {
            "due" | "due_date" => SortField::DueDate,
            "priority" => SortField::Priority,
            "created" | "created_at" => SortField::CreatedAt,
            "updated" | "updated_at" => SortField::UpdatedAt,
            "title" => SortField::Title,
            "status" => SortField::Status,
            other => return Err(Error::InvalidInput(format!("unknown sort field '{}'", other))),
        };
        let direction = match dir.trim().to_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => return Err(Error::InvalidInput(format!("unknown sort direction '{}'", other))),
        };
        Ok(SortRule { field, direction })
    }
}

/// Smart hybrid ordering used when the list is sorted by due date ascending.
///
/// 1. Pinned open tasks first.
/// 2. Done tasks last, most recently updated first among themselves.
/// 3. Open tasks by zone: urgent, future, no-date.
///    - urgent: priority desc, then due date asc (most overdue first)
///    - future: due date asc, then priority desc
///    - no-date: priority desc, then newest first
pub fn smart_compare(a: &Task, b: &Task, today: NaiveDate) -> Ordering {
    match (a.is_effectively_pinned(), b.is_effectively_pinned()) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    match (a.is_done(), b.is_done()) {
        (true, true) => return b.updated_at.cmp(&a.updated_at),
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let (za, zb) = (classify(a, today), classify(b, today));
    if za != zb {
        return za.cmp(&zb);
    }

    let by_priority = || b.priority_weight().cmp(&a.priority_weight());
    let by_due = || a.due_date.cmp(&b.due_date);
    match za {
        TaskZone::Urgent => by_priority().then_with(by_due),
        TaskZone::Future => by_due().then_with(by_priority),
        TaskZone::NoDate => by_priority().then_with(|| b.created_at.cmp(&a.created_at)),
        TaskZone::Done => Ordering::Equal,
    }
}

fn status_rank(task: &Task) -> u8 {
    match task.status {
        crate::models::TaskStatus::Doing => 0,
        crate::models::TaskStatus::Todo => 1,
        crate::models::TaskStatus::Done => 2,
    }
}

fn compare_field(a: &Task, b: &Task, rule: SortRule) -> Ordering {
    let ord = match rule.field {
        SortField::DueDate => {
            // Undated tasks go last regardless of direction.
            return match (a.due_date, b.due_date) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => match rule.direction {
                    SortDirection::Asc => x.cmp(&y),
                    SortDirection::Desc => y.cmp(&x),
                },
            };
        }
        SortField::Priority => a.priority_weight().cmp(&b.priority_weight()),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::Status => status_rank(a).cmp(&status_rank(b)),
    };
    match rule.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Plain lexicographic ordering over `rules`, pinned open tasks first.
pub fn compare_by_rules(a: &Task, b: &Task, rules: &[SortRule]) -> Ordering {
    b.is_effectively_pinned()
        .cmp(&a.is_effectively_pinned())
        .then_with(|| {
            rules
                .iter()
                .map(|&rule| compare_field(a, b, rule))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}

/// Orders `tasks` in place for display.
///
/// The smart ordering applies when the primary rule is due date ascending or
/// no rules are configured; anything else uses [`compare_by_rules`]. Stable.
pub fn sort_tasks(tasks: &mut [Task], rules: &[SortRule], today: NaiveDate) {
    match rules.first() {
        None => tasks.sort_by(|a, b| smart_compare(a, b, today)),
        Some(&first) if first == SortRule::DUE_DATE_ASC => {
            tasks.sort_by(|a, b| smart_compare(a, b, today))
        }
        Some(_) => tasks.sort_by(|a, b| compare_by_rules(a, b, rules)),
    }
}
