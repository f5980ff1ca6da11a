use chrono::NaiveDate;

use crate::models::Task;

/// Display tier of a task, derived from status and due date. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskZone {
    /// Open and due today or earlier.
    Urgent,
    /// Open and due after today.
    Future,
    /// Open without a due date.
    NoDate,
    Done,
}

impl TaskZone {
    pub fn label(self) -> &'static str {
        match self {
            TaskZone::Urgent => "urgent",
            TaskZone::Future => "future",
            TaskZone::NoDate => "no-date",
            TaskZone::Done => "done",
        }
    }
}

/// Classifies `task` relative to `today`.
pub fn classify(task: &Task, today: NaiveDate) -> TaskZone {
    if task.is_done() {
        return TaskZone::Done;
    }
    match task.due_date {
        None => TaskZone::NoDate,
        Some(due) if (due - today).num_days() <= 0 => TaskZone::Urgent,
        Some(_) => TaskZone::Future,
    }
}
