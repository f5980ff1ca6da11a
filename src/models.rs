use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Workflow state of a task.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    Doing,
    Done,
}

impl TaskStatus {
    pub fn is_done(self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "doing" => Ok(TaskStatus::Doing),
            "done" => Ok(TaskStatus::Done),
            other => Err(Error::InvalidInput(format!(
                "unknown status '{}', expected todo, doing or done",
                other
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Ordering weight: high = 2, medium = 1, low = 0.
    pub fn weight(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::InvalidInput(format!(
                "unknown priority '{}', expected low, medium or high",
                other
            ))),
        }
    }
}

/// A checklist item inside a task or template.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

/// Provenance tags set on tasks produced by the materializer.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskExtras {
    /// Id of the recurring template this task was generated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<u64>,
    /// Cycle identifier the task was generated for (see `recurrence::period`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_key: Option<String>,
}

/// Represents a single task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Missing priority is weighed as medium when sorting.
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub next_step: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Pinned tasks float to the top until they are done.
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub extras: TaskExtras,
}

impl Task {
    /// A fresh `todo` task with both timestamps set to `now`.
    pub fn new(id: u64, title: impl Into<String>, now: NaiveDateTime) -> Self {
        Task {
            id,
            title: title.into(),
            status: TaskStatus::Todo,
            priority: None,
            due_date: None,
            owners: Vec::new(),
            tags: Vec::new(),
            notes: String::new(),
            next_step: String::new(),
            subtasks: Vec::new(),
            pinned: false,
            created_at: now,
            updated_at: now,
            extras: TaskExtras::default(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    pub fn priority_weight(&self) -> u8 {
        self.priority.unwrap_or(Priority::Medium).weight()
    }

    /// Pinning only counts while the task is still open.
    pub fn is_effectively_pinned(&self) -> bool {
        self.pinned && !self.is_done()
    }
}

/// Granularity of a recurrence cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for ScheduleType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(ScheduleType::Daily),
            "weekly" => Ok(ScheduleType::Weekly),
            "monthly" => Ok(ScheduleType::Monthly),
            other => Err(Error::InvalidInput(format!(
                "unknown schedule '{}', expected daily, weekly or monthly",
                other
            ))),
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScheduleType::Daily => "daily",
            ScheduleType::Weekly => "weekly",
            ScheduleType::Monthly => "monthly",
        })
    }
}

/// How the due date of a freshly materialized task is chosen.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DueStrategy {
    /// Due on the target date itself.
    #[default]
    SameDay,
    EndOfWeek,
    EndOfMonth,
    /// No due date.
    None,
}

impl FromStr for DueStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "same-day" => Ok(DueStrategy::SameDay),
            "end-of-week" => Ok(DueStrategy::EndOfWeek),
            "end-of-month" => Ok(DueStrategy::EndOfMonth),
            "none" => Ok(DueStrategy::None),
            other => Err(Error::InvalidInput(format!(
                "unknown due strategy '{}', expected same-day, end-of-week, end-of-month or none",
                other
            ))),
        }
    }
}

impl fmt::Display for DueStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DueStrategy::SameDay => "same-day",
            DueStrategy::EndOfWeek => "end-of-week",
            DueStrategy::EndOfMonth => "end-of-month",
            DueStrategy::None => "none",
        })
    }
}

fn default_interval() -> i64 {
    1
}

/// Describes how often a template fires.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub schedule_type: ScheduleType,
    /// Weekday indices, 0 = Sunday .. 6 = Saturday. Weekly, non-flexible only.
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    /// 1-31, clamped to the month length. Monthly, non-flexible only.
    #[serde(default)]
    pub day_of_month: Option<u32>,
    /// One instance per period at the period start, ignoring weekday/day fields.
    #[serde(default)]
    pub flexible: bool,
    /// Fire every Nth period counted from `anchor_date`. Values below 1 mean 1.
    #[serde(default = "default_interval")]
    pub interval: i64,
    /// Raw anchor date; unparsable values disable interval gating.
    #[serde(default)]
    pub anchor_date: Option<String>,
}

impl RecurrenceRule {
    pub fn new(schedule_type: ScheduleType) -> Self {
        RecurrenceRule {
            schedule_type,
            days_of_week: Vec::new(),
            day_of_month: None,
            flexible: false,
            interval: 1,
            anchor_date: None,
        }
    }

    pub fn effective_interval(&self) -> u32 {
        if self.interval < 1 {
            1
        } else {
            u32::try_from(self.interval).unwrap_or(u32::MAX)
        }
    }

    /// Parses `anchor_date` as `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub fn parsed_anchor(&self) -> Option<NaiveDate> {
        let raw = self.anchor_date.as_deref()?.trim();
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(d);
        }
        chrono::DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    }
}

/// A recurring task definition: a rule plus the defaults copied into each instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecurringTemplate {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub next_step: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub due_strategy: DueStrategy,
    pub rule: RecurrenceRule,
    /// Inactive templates are ignored by the materializer.
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: NaiveDateTime,
}

fn default_active() -> bool {
    true
}

impl RecurringTemplate {
    pub fn new(id: u64, title: impl Into<String>, rule: RecurrenceRule) -> Self {
        RecurringTemplate {
            id,
            title: title.into(),
            status: TaskStatus::Todo,
            priority: None,
            owners: Vec::new(),
            tags: Vec::new(),
            notes: String::new(),
            next_step: String::new(),
            subtasks: Vec::new(),
            due_strategy: DueStrategy::SameDay,
            rule,
            active: true,
            created_at: NaiveDateTime::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_below_one_means_every_period() {
        let mut rule = RecurrenceRule::new(ScheduleType::Weekly);
        rule.interval = 0;
        assert_eq!(rule.effective_interval(), 1);
        rule.interval = -4;
        assert_eq!(rule.effective_interval(), 1);
        rule.interval = 3;
        assert_eq!(rule.effective_interval(), 3);
    }

    #[test]
    fn anchor_accepts_date_and_timestamp() {
        let mut rule = RecurrenceRule::new(ScheduleType::Weekly);
        rule.anchor_date = Some("2025-03-03".into());
        assert_eq!(rule.parsed_anchor(), NaiveDate::from_ymd_opt(2025, 3, 3));
        rule.anchor_date = Some("2025-03-03T08:30:00+01:00".into());
        assert_eq!(rule.parsed_anchor(), NaiveDate::from_ymd_opt(2025, 3, 3));
        rule.anchor_date = Some("next tuesday".into());
        assert_eq!(rule.parsed_anchor(), None);
    }

    #[test]
    fn sparse_template_json_fills_defaults() {
        let json = r#"{"id": 7, "title": "Review", "rule": {"schedule_type": "monthly"}}"#;
        let tmpl: RecurringTemplate = serde_json::from_str(json).unwrap();
        assert!(tmpl.active);
        assert_eq!(tmpl.rule.interval, 1);
        assert_eq!(tmpl.due_strategy, DueStrategy::SameDay);
        assert!(tmpl.rule.days_of_week.is_empty());
    }

    #[test]
    fn missing_priority_weighs_as_medium() {
        let task = Task::new(1, "x", NaiveDateTime::default());
        assert_eq!(task.priority_weight(), Priority::Medium.weight());
    }
}
