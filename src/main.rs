//! # Cadence
//!
//! A terminal task manager built around recurring templates and an urgency-first list.
//!
//! ## Features
//!
//! *   **Recurring templates**: daily, weekly and monthly rules with intervals, anchors and
//!     due-date strategies. Each template produces at most one task per period, no matter
//!     how often the materializer runs.
//! *   **Smart ordering**: pinned tasks first, then overdue/today by priority, upcoming by
//!     date, undated by priority and recency, completed tasks last.
//! *   **Dual Interface**: a scriptable CLI and an interactive TUI.
//! *   **Data Persistence**: JSON files in the XDG data directory.
//!
//! ## Usage
//!
//! ```bash
//! # Interactive mode
//! cadence
//!
//! # Tasks
//! cadence add "Write report" --priority high --due 2025-12-01 --owner sam
//! cadence list
//! cadence complete 3
//! cadence pin 4
//!
//! # Recurring templates
//! cadence template add "Take out bins" --schedule weekly --days tue
//! cadence template add "Pay rent" --schedule monthly --day-of-month 31 --due end-of-month
//! cadence template add "Sprint review" --schedule weekly --flexible --interval 2 --anchor 2025-01-06
//! cadence materialize
//! ```
//!
//! ## Data Storage
//!
//! Files live in `~/.local/share/cadence/` on Linux (the platform data directory
//! elsewhere). Set `CADENCE_DATA_DIR` to use another directory and `CADENCE_LOG`
//! to control log output, e.g. `CADENCE_LOG=cadence=debug`.

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use cadence::clock::SystemClock;
use cadence::commands::*;
use cadence::config::{data_dir, Config, LOG_ENV};
use cadence::models::{DueStrategy, Priority, ScheduleType, TaskStatus};
use cadence::storage::Store;
use cadence::tui::run_tui;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Terminal task manager with recurring templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,
        /// todo, doing or done
        #[arg(short, long)]
        status: Option<TaskStatus>,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        due: Option<String>,
        /// Owner (repeatable)
        #[arg(short, long = "owner")]
        owners: Vec<String>,
        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Next concrete step
        #[arg(long)]
        next: Option<String>,
    },
    /// List tasks in display order
    List {
        /// Show completed tasks
        #[arg(short, long)]
        all: bool,
    },
    /// Mark a task as done
    Complete { id: u64 },
    /// Mark a done task as todo again
    Reopen { id: u64 },
    /// Remove a task
    Remove { id: u64 },
    /// Pin a task to the top of the list
    Pin { id: u64 },
    /// Unpin a task
    Unpin { id: u64 },
    /// Edit a task
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long)]
        status: Option<TaskStatus>,
        /// New due date in YYYY-MM-DD
        #[arg(short, long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        next: Option<String>,
    },
    /// Manage recurring templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Create the recurring tasks due for the current period
    Materialize,
    /// Reset the database (delete all tasks and templates)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Add a new recurring template
    Add {
        title: String,
        /// daily, weekly or monthly
        #[arg(long)]
        schedule: ScheduleType,
        /// Weekdays for weekly rules, e.g. "mon,thu" or "1,4" (0 = Sunday)
        #[arg(long)]
        days: Option<String>,
        /// Day of month for monthly rules, clamped to the month length
        #[arg(long)]
        day_of_month: Option<u32>,
        /// One task per period at its start, ignoring days
        #[arg(long)]
        flexible: bool,
        /// Fire every Nth period counted from --anchor
        #[arg(long, default_value_t = 1)]
        interval: i64,
        /// Anchor date in YYYY-MM-DD
        #[arg(long)]
        anchor: Option<String>,
        /// same-day, end-of-week, end-of-month or none
        #[arg(long, default_value = "same-day")]
        due: DueStrategy,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long = "owner")]
        owners: Vec<String>,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        next: Option<String>,
        /// Checklist item copied into every instance (repeatable)
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },
    /// List templates
    List,
    /// Remove a template (tasks it created are kept)
    Remove { id: u64 },
    /// Resume materializing a template
    Enable { id: u64 },
    /// Stop materializing a template
    Disable { id: u64 },
    /// Report configuration problems in templates
    Lint,
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, store: &Store, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let clock = SystemClock;
    match cli.command {
        Some(Commands::Add { title, priority, status, due, owners, tags, notes, next }) => {
            let input = TaskInput { title, priority, status, due, owners, tags, notes, next_step: next };
            cmd_add(store, &clock, input, false)?;
        }
        Some(Commands::List { all }) => cmd_list(store, &clock, &config, all)?,
        Some(Commands::Complete { id }) => cmd_complete(store, &clock, id, false)?,
        Some(Commands::Reopen { id }) => cmd_set_status(store, &clock, id, TaskStatus::Todo, false)?,
        Some(Commands::Remove { id }) => cmd_remove(store, id, false)?,
        Some(Commands::Pin { id }) => cmd_set_pinned(store, &clock, id, true, false)?,
        Some(Commands::Unpin { id }) => cmd_set_pinned(store, &clock, id, false, false)?,
        Some(Commands::Edit { id, title, priority, status, due, clear_due, notes, next }) => {
            let edit = TaskEdit { title, priority, status, due, clear_due, notes, next_step: next };
            cmd_edit(store, &clock, id, edit, false)?;
        }
        Some(Commands::Template { command }) => match command {
            TemplateCommands::Add {
                title,
                schedule,
                days,
                day_of_month,
                flexible,
                interval,
                anchor,
                due,
                priority,
                owners,
                tags,
                notes,
                next,
                subtasks,
            } => {
                let mut input = TemplateInput::new(title, schedule);
                input.days_of_week = days.as_deref().map(parse_weekdays).transpose()?.unwrap_or_default();
                input.day_of_month = day_of_month;
                input.flexible = flexible;
                input.interval = interval;
                input.anchor = anchor;
                input.due_strategy = due;
                input.priority = priority;
                input.owners = owners;
                input.tags = tags;
                input.notes = notes;
                input.next_step = next;
                input.subtasks = subtasks;
                cmd_template_add(store, &clock, input, false)?;
            }
            TemplateCommands::List => cmd_template_list(store)?,
            TemplateCommands::Remove { id } => cmd_template_remove(store, id, false)?,
            TemplateCommands::Enable { id } => cmd_template_set_active(store, id, true, false)?,
            TemplateCommands::Disable { id } => cmd_template_set_active(store, id, false, false)?,
            TemplateCommands::Lint => cmd_template_lint(store)?,
        },
        Some(Commands::Materialize) => cmd_materialize(store, &clock, false)?,
        Some(Commands::Reset { force }) => cmd_reset(store, force)?,
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "cadence", &mut io::stdout());
        }
        Some(Commands::Ui) | None => run_tui(store, &clock, config)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let dir = data_dir();
    let config = match Config::load(&dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    let store = Store::new(dir);
    match run(cli, &store, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
