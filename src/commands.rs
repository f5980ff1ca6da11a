use std::io::{self, Write};

use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    DueStrategy, Priority, RecurrenceRule, RecurringTemplate, ScheduleType, Subtask, Task,
    TaskStatus,
};
use crate::recurrence::{lint_template, materialize};
use crate::sort::sort_tasks;
use crate::storage::Store;
use crate::zone::{classify, TaskZone};

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

/// Parses a comma separated weekday list such as `1,3,5` or `mon,wed`.
pub fn parse_weekdays(s: &str) -> Result<Vec<u8>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match p.to_lowercase().as_str() {
            "sun" | "sunday" => Ok(0),
            "mon" | "monday" => Ok(1),
            "tue" | "tuesday" => Ok(2),
            "wed" | "wednesday" => Ok(3),
            "thu" | "thursday" => Ok(4),
            "fri" | "friday" => Ok(5),
            "sat" | "saturday" => Ok(6),
            other => other
                .parse::<u8>()
                .ok()
                .filter(|d| *d <= 6)
                .ok_or_else(|| Error::InvalidInput(format!("unknown weekday '{}'", other))),
        })
        .collect()
}

fn next_task_id(tasks: &[Task]) -> u64 {
    tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
}

/// Offers the owners and tags of `tasks` to the dictionary. Never fails the caller.
fn register_known_values(store: &Store, tasks: &[Task]) {
    let result = store.load_dictionary().and_then(|mut dict| {
        if dict.register_all(tasks) {
            store.save_dictionary(&dict)?;
        }
        Ok(())
    });
    if let Err(e) = result {
        warn!("failed to update dictionary: {}", e);
    }
}

/// Creates the recurring instances due for the current period and persists them.
pub fn run_materialize(store: &Store, clock: &dyn Clock) -> Result<Vec<Task>> {
    let templates = store.load_templates()?;
    let mut tasks = store.load_tasks()?;
    let created = materialize(&templates, &tasks, clock.now());
    debug!(templates = templates.len(), created = created.len(), "materialization pass");
    if created.is_empty() {
        return Ok(created);
    }
    tasks.extend(created.iter().cloned());
    store.save_tasks(&tasks)?;
    register_known_values(store, &created);
    Ok(created)
}

pub fn cmd_materialize(store: &Store, clock: &dyn Clock, silent: bool) -> Result<()> {
    let created = run_materialize(store, clock)?;
    if !silent {
        if created.is_empty() {
            println!("Nothing to materialize.");
        }
        for t in &created {
            println!(
                "Created task {} '{}' for period {}",
                t.id,
                t.title,
                t.extras.period_key.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

/// Fields for a new task.
#[derive(Debug, Default, Clone)]
pub struct TaskInput {
    pub title: String,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due: Option<String>,
    pub owners: Vec<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub next_step: Option<String>,
}

/// Adds a new task and returns its id.
pub fn cmd_add(store: &Store, clock: &dyn Clock, input: TaskInput, silent: bool) -> Result<u64> {
    if input.title.trim().is_empty() {
        return Err(Error::InvalidInput("task title is empty".into()));
    }
    let due_date = input.due.as_deref().map(parse_date).transpose()?;

    let mut tasks = store.load_tasks()?;
    let id = next_task_id(&tasks);
    let mut task = Task::new(id, input.title, clock.now());
    task.priority = input.priority;
    task.status = input.status.unwrap_or_default();
    task.due_date = due_date;
    task.owners = input.owners;
    task.tags = input.tags;
    task.notes = input.notes.unwrap_or_default();
    task.next_step = input.next_step.unwrap_or_default();
    tasks.push(task.clone());
    store.save_tasks(&tasks)?;
    register_known_values(store, std::slice::from_ref(&task));

    if !silent {
        println!("Task added (id = {})", id);
    }
    Ok(id)
}

/// Changes to apply to an existing task. `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub notes: Option<String>,
    pub next_step: Option<String>,
}

/// Edits an existing task's details.
pub fn cmd_edit(store: &Store, clock: &dyn Clock, id: u64, edit: TaskEdit, silent: bool) -> Result<()> {
    let due = edit.due.as_deref().map(parse_date).transpose()?;
    let now = clock.now();
    store.update_task(id, |t| {
        if let Some(title) = edit.title {
            t.title = title;
        }
        if let Some(p) = edit.priority {
            t.priority = Some(p);
        }
        if let Some(s) = edit.status {
            t.status = s;
        }
        if edit.clear_due {
            t.due_date = None;
        } else if due.is_some() {
            t.due_date = due;
        }
        if let Some(n) = edit.notes {
            t.notes = n;
        }
        if let Some(n) = edit.next_step {
            t.next_step = n;
        }
        t.updated_at = now;
    })?;
    if !silent {
        println!("Task {} updated.", id);
    }
    Ok(())
}

/// Sets the status of a task, stamping `updated_at` so done tasks order by completion.
pub fn cmd_set_status(store: &Store, clock: &dyn Clock, id: u64, status: TaskStatus, silent: bool) -> Result<()> {
    let now = clock.now();
    store.update_task(id, |t| {
        t.status = status;
        t.updated_at = now;
    })?;
    if !silent {
        println!("Task {} marked as {}.", id, status);
    }
    Ok(())
}

/// Marks a task as complete by ID.
pub fn cmd_complete(store: &Store, clock: &dyn Clock, id: u64, silent: bool) -> Result<()> {
    cmd_set_status(store, clock, id, TaskStatus::Done, silent)
}

pub fn cmd_set_pinned(store: &Store, clock: &dyn Clock, id: u64, pinned: bool, silent: bool) -> Result<()> {
    let now = clock.now();
    store.update_task(id, |t| {
        t.pinned = pinned;
        t.updated_at = now;
    })?;
    if !silent {
        println!("Task {} {}.", id, if pinned { "pinned" } else { "unpinned" });
    }
    Ok(())
}

/// Removes a task from the database by ID.
pub fn cmd_remove(store: &Store, id: u64, silent: bool) -> Result<()> {
    let mut tasks = store.load_tasks()?;
    let len_before = tasks.len();
    tasks.retain(|t| t.id != id);
    if tasks.len() == len_before {
        return Err(Error::TaskNotFound(id));
    }
    store.save_tasks(&tasks)?;
    if !silent {
        println!("Task {} removed.", id);
    }
    Ok(())
}

/// Loads tasks in display order, materializing first when configured to.
pub fn ordered_tasks(store: &Store, clock: &dyn Clock, config: &Config, all: bool) -> Result<Vec<Task>> {
    if config.materialize_on_startup {
        run_materialize(store, clock)?;
    }
    let mut tasks = store.load_tasks()?;
    if !all {
        tasks.retain(|t| !t.is_done());
    }
    sort_tasks(&mut tasks, &config.sort_rules, clock.today());
    Ok(tasks)
}

pub fn zone_color(zone: TaskZone) -> Color {
    match zone {
        TaskZone::Urgent => Color::Red,
        TaskZone::Future => Color::Yellow,
        TaskZone::NoDate => Color::Reset,
        TaskZone::Done => Color::Grey,
    }
}

/// Human readable distance to the due date.
pub fn time_left(due: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(due) = due else {
        return "-".to_string();
    };
    let days_left = (due - today).num_days();
    if days_left < 0 {
        format!("{}d overdue", days_left.abs())
    } else if days_left == 0 {
        "Today".to_string()
    } else {
        format!("{}d", days_left)
    }
}

/// Lists tasks in a formatted table in the configured order.
///
/// By default, hides completed tasks unless `all` is true.
pub fn cmd_list(store: &Store, clock: &dyn Clock, config: &Config, all: bool) -> Result<()> {
    let tasks = ordered_tasks(store, clock, config, all)?;
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["ID", "", "Title", "Priority", "Status", "Due", "Time Left", "Zone", "Owners", "Recurs"]
                .into_iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );

    let today = clock.today();
    for t in tasks {
        let zone = classify(&t, today);
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(if t.is_effectively_pinned() { "*" } else { "" }),
            Cell::new(&t.title),
            Cell::new(t.priority.map(|p| p.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(t.status),
            Cell::new(t.due_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(time_left(t.due_date, today)),
            Cell::new(zone.label()).fg(zone_color(zone)),
            Cell::new(t.owners.join(", ")),
            Cell::new(t.extras.recurrence_id.map(|id| format!("#{}", id)).unwrap_or_default()),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Fields for a new recurring template.
#[derive(Debug, Clone)]
pub struct TemplateInput {
    pub title: String,
    pub schedule: ScheduleType,
    pub days_of_week: Vec<u8>,
    pub day_of_month: Option<u32>,
    pub flexible: bool,
    pub interval: i64,
    pub anchor: Option<String>,
    pub due_strategy: DueStrategy,
    pub priority: Option<Priority>,
    pub owners: Vec<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub next_step: Option<String>,
    pub subtasks: Vec<String>,
}

impl TemplateInput {
    pub fn new(title: impl Into<String>, schedule: ScheduleType) -> Self {
        TemplateInput {
            title: title.into(),
            schedule,
            days_of_week: Vec::new(),
            day_of_month: None,
            flexible: false,
            interval: 1,
            anchor: None,
            due_strategy: DueStrategy::SameDay,
            priority: None,
            owners: Vec::new(),
            tags: Vec::new(),
            notes: None,
            next_step: None,
            subtasks: Vec::new(),
        }
    }
}

/// Adds a recurring template and returns its id. Lint findings are printed, not enforced.
pub fn cmd_template_add(store: &Store, clock: &dyn Clock, input: TemplateInput, silent: bool) -> Result<u64> {
    if let Some(anchor) = &input.anchor {
        parse_date(anchor)?;
    }
    let mut templates = store.load_templates()?;
    let id = templates.iter().map(|t| t.id).max().unwrap_or(0) + 1;

    let mut rule = RecurrenceRule::new(input.schedule);
    rule.days_of_week = input.days_of_week;
    rule.day_of_month = input.day_of_month;
    rule.flexible = input.flexible;
    rule.interval = input.interval;
    rule.anchor_date = input.anchor;

    let mut tmpl = RecurringTemplate::new(id, input.title, rule);
    tmpl.priority = input.priority;
    tmpl.owners = input.owners;
    tmpl.tags = input.tags;
    tmpl.notes = input.notes.unwrap_or_default();
    tmpl.next_step = input.next_step.unwrap_or_default();
    tmpl.subtasks = input
        .subtasks
        .into_iter()
        .map(|title| Subtask { title, done: false })
        .collect();
    tmpl.due_strategy = input.due_strategy;
    tmpl.created_at = clock.now();

    let issues = lint_template(&tmpl);
    templates.push(tmpl);
    store.save_templates(&templates)?;

    if !silent {
        println!("Template added (id = {})", id);
        for issue in issues {
            println!("  warning: {}", issue);
        }
    }
    Ok(id)
}

fn describe_rule(rule: &RecurrenceRule) -> String {
    let mut s = rule.schedule_type.to_string();
    if rule.effective_interval() > 1 {
        s = format!("every {} {}", rule.effective_interval(), s);
    }
    if rule.flexible {
        s.push_str(", flexible");
    } else {
        match rule.schedule_type {
            ScheduleType::Weekly => {
                const NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
                let days: Vec<&str> = rule
                    .days_of_week
                    .iter()
                    .filter_map(|&d| NAMES.get(d as usize).copied())
                    .collect();
                s.push_str(&format!(" on {}", days.join(",")));
            }
            ScheduleType::Monthly => {
                if let Some(d) = rule.day_of_month {
                    s.push_str(&format!(" on day {}", d));
                }
            }
            ScheduleType::Daily => {}
        }
    }
    if let Some(anchor) = &rule.anchor_date {
        s.push_str(&format!(" from {}", anchor));
    }
    s
}

/// Lists all recurring templates.
pub fn cmd_template_list(store: &Store) -> Result<()> {
    let templates = store.load_templates()?;
    if templates.is_empty() {
        println!("No templates found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Title", "Schedule", "Due", "Priority", "Active"]);
    for t in templates {
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.title),
            Cell::new(describe_rule(&t.rule)),
            Cell::new(t.due_strategy),
            Cell::new(t.priority.map(|p| p.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(if t.active { "yes" } else { "no" }).fg(if t.active { Color::Green } else { Color::Grey }),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Removes a template. Tasks it already produced are kept.
pub fn cmd_template_remove(store: &Store, id: u64, silent: bool) -> Result<()> {
    let mut templates = store.load_templates()?;
    let len_before = templates.len();
    templates.retain(|t| t.id != id);
    if templates.len() == len_before {
        return Err(Error::TemplateNotFound(id));
    }
    store.save_templates(&templates)?;
    if !silent {
        println!("Template {} removed.", id);
    }
    Ok(())
}

pub fn cmd_template_set_active(store: &Store, id: u64, active: bool, silent: bool) -> Result<()> {
    let mut templates = store.load_templates()?;
    let tmpl = templates
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(Error::TemplateNotFound(id))?;
    tmpl.active = active;
    store.save_templates(&templates)?;
    if !silent {
        println!("Template {} {}.", id, if active { "enabled" } else { "disabled" });
    }
    Ok(())
}

/// Prints configuration findings for every template.
pub fn cmd_template_lint(store: &Store) -> Result<()> {
    let templates = store.load_templates()?;
    let mut clean = true;
    for t in &templates {
        for issue in lint_template(t) {
            clean = false;
            println!("template {} '{}': {}", t.id, t.title, issue);
        }
    }
    if clean {
        println!("No issues found.");
    }
    Ok(())
}

/// Resets the database by deleting all tasks, templates and known values.
pub fn cmd_reset(store: &Store, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all tasks and templates? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    store.reset()?;
    println!("Database reset successfully.");
    Ok(())
}
