use ratatui::widgets::TableState;
use tracing::warn;

use crate::clock::Clock;
use crate::commands::{cmd_set_pinned, cmd_set_status, ordered_tasks, run_materialize};
use crate::config::Config;
use crate::error::Result;
use crate::models::{RecurringTemplate, Task, TaskStatus};
use crate::storage::Store;

pub enum ViewMode {
    Tasks,
    Templates,
}

pub struct App<'a> {
    pub store: &'a Store,
    pub clock: &'a dyn Clock,
    pub config: Config,
    pub tasks: Vec<Task>,
    pub templates: Vec<RecurringTemplate>,
    pub state: TableState,
    pub template_state: TableState,
    pub view_mode: ViewMode,
    pub show_completed: bool,
    /// One-line feedback shown above the key help.
    pub message: Option<String>,
}

impl<'a> App<'a> {
    /// Creates a new App instance and loads initial data.
    pub fn new(store: &'a Store, clock: &'a dyn Clock, config: Config) -> Result<App<'a>> {
        let mut app = App {
            store,
            clock,
            config,
            tasks: Vec::new(),
            templates: Vec::new(),
            state: TableState::default(),
            template_state: TableState::default(),
            view_mode: ViewMode::Tasks,
            show_completed: false,
            message: None,
        };
        app.reload()?;
        Ok(app)
    }

    fn list_len(&self) -> usize {
        match self.view_mode {
            ViewMode::Tasks => self.tasks.len(),
            ViewMode::Templates => self.templates.len(),
        }
    }

    fn list_state(&mut self) -> &mut TableState {
        match self.view_mode {
            ViewMode::Tasks => &mut self.state,
            ViewMode::Templates => &mut self.template_state,
        }
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let state = self.list_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let state = self.list_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn selected_task(&self) -> Option<&Task> {
        match self.view_mode {
            ViewMode::Tasks => self.state.selected().and_then(|i| self.tasks.get(i)),
            ViewMode::Templates => None,
        }
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            warn!("tui action failed: {}", e);
            self.message = Some(format!("Error: {}", e));
        }
        let reloaded = self.reload();
        if let Err(e) = reloaded {
            self.message = Some(format!("Error: {}", e));
        }
    }

    /// Toggles the selected task between done and todo.
    pub fn toggle_done_selected(&mut self) {
        let Some(task) = self.selected_task() else { return };
        let (id, status) = (task.id, if task.is_done() { TaskStatus::Todo } else { TaskStatus::Done });
        let result = cmd_set_status(self.store, self.clock, id, status, true);
        self.message = Some(format!("Task {} marked as {}", id, status));
        self.report(result);
    }

    /// Pins or unpins the selected task.
    pub fn toggle_pin_selected(&mut self) {
        let Some(task) = self.selected_task() else { return };
        let (id, pinned) = (task.id, !task.pinned);
        let result = cmd_set_pinned(self.store, self.clock, id, pinned, true);
        self.message = Some(format!("Task {} {}", id, if pinned { "pinned" } else { "unpinned" }));
        self.report(result);
    }

    /// Runs a materialization pass right away.
    pub fn materialize_now(&mut self) {
        let result = run_materialize(self.store, self.clock).map(|created| {
            self.message = Some(format!("{} recurring task(s) created", created.len()));
        });
        self.report(result);
    }

    /// Reloads tasks and templates from storage in display order.
    pub fn reload(&mut self) -> Result<()> {
        // Materialization runs once at startup, not on every redraw.
        let config = Config { materialize_on_startup: false, ..self.config.clone() };
        self.tasks = ordered_tasks(self.store, self.clock, &config, self.show_completed)?;
        self.templates = self.store.load_templates()?;
        clamp_selection(&mut self.state, self.tasks.len());
        clamp_selection(&mut self.template_state, self.templates.len());
        Ok(())
    }

    /// Toggles the visibility of completed tasks.
    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
        self.report(Ok(()));
    }

    /// Toggles between Task and Template views.
    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Tasks => ViewMode::Templates,
            ViewMode::Templates => ViewMode::Tasks,
        };
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else {
        match state.selected() {
            Some(i) if i >= len => state.select(Some(len - 1)),
            Some(_) => {}
            None => state.select(Some(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::commands::{cmd_add, TaskInput};
    use chrono::NaiveDate;

    #[test]
    fn navigation_wraps_and_actions_update_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2025, 6, 4).unwrap());
        for title in ["a", "b"] {
            let input = TaskInput { title: title.into(), ..Default::default() };
            cmd_add(&store, &clock, input, true).unwrap();
        }

        let mut app = App::new(&store, &clock, Config::default()).unwrap();
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.state.selected(), Some(0));

        app.toggle_pin_selected();
        let pinned_id = app.tasks[0].id;
        assert!(store.load_task(pinned_id).unwrap().pinned);

        app.toggle_done_selected();
        assert_eq!(app.tasks.len(), 1);
        app.toggle_completed();
        assert_eq!(app.tasks.len(), 2);
    }
}
